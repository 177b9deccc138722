//! Tagged JSON codec for leaf values.
//!
//! Typed values travel as objects carrying a `__type` discriminator, for example
//! `{"__type": "GeoPoint", "latitude": 40.0, "longitude": -30.0}`. Untagged objects are
//! plain maps.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value as JsonValue};

use crate::store::error::{invalid_json, StoreResult};
use crate::store::object::{
    format_iso, ParseObject, KEY_CLASS_NAME, KEY_CREATED_AT, KEY_OBJECT_ID, KEY_UPDATED_AT,
};
use crate::store::{LeafDecoder, ParseFile, ParseGeoPoint, ParsePointer, ParseValue, ValueKind};

pub const KEY_TYPE: &str = "__type";

/// Default leaf decoder for the tagged JSON format.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl LeafDecoder for JsonDecoder {
    fn decode(&self, value: &JsonValue) -> StoreResult<ParseValue> {
        decode_value(value)
    }
}

fn decode_value(value: &JsonValue) -> StoreResult<ParseValue> {
    match value {
        JsonValue::Null => Ok(ParseValue::null()),
        JsonValue::Bool(flag) => Ok(ParseValue::from_bool(*flag)),
        JsonValue::Number(number) => match number.as_i64() {
            Some(integer) => Ok(ParseValue::from_integer(integer)),
            None => number
                .as_f64()
                .map(ParseValue::from_double)
                .ok_or_else(|| invalid_json(format!("Number out of range: {number}"))),
        },
        JsonValue::String(text) => Ok(ParseValue::from_string(text.as_str())),
        JsonValue::Array(items) => items
            .iter()
            .map(decode_value)
            .collect::<StoreResult<Vec<_>>>()
            .map(ParseValue::from_array),
        JsonValue::Object(map) => match map.get(KEY_TYPE) {
            Some(JsonValue::String(tag)) => decode_tagged(tag, map),
            Some(_) => Err(invalid_json("__type must be a string")),
            None => decode_fields(map, &[]).map(ParseValue::from_map),
        },
    }
}

fn decode_tagged(tag: &str, map: &Map<String, JsonValue>) -> StoreResult<ParseValue> {
    match tag {
        "Date" => {
            let iso = required_str(map, "iso", tag)?;
            Ok(ParseValue::from_date(parse_iso(iso)?))
        }
        "Bytes" => {
            let encoded = required_str(map, "base64", tag)?;
            let bytes = BASE64_STANDARD
                .decode(encoded)
                .map_err(|err| invalid_json(format!("Invalid base64 payload: {err}")))?;
            Ok(ParseValue::from_bytes(bytes))
        }
        "Pointer" => {
            let class_name = required_str(map, KEY_CLASS_NAME, tag)?;
            let object_id = required_str(map, KEY_OBJECT_ID, tag)?;
            Ok(ParseValue::from_pointer(ParsePointer::new(
                class_name, object_id,
            )))
        }
        "Object" => decode_object(map).map(ParseValue::from_object),
        "GeoPoint" => decode_geo_point(map).map(ParseValue::from_geo_point),
        "Polygon" => {
            let coordinates = map
                .get("coordinates")
                .and_then(JsonValue::as_array)
                .ok_or_else(|| invalid_json("Polygon requires a coordinates array"))?;
            let points = coordinates
                .iter()
                .map(decode_coordinate_pair)
                .collect::<StoreResult<Vec<_>>>()?;
            Ok(ParseValue::from_polygon(points))
        }
        "File" => {
            let name = required_str(map, "name", tag)?;
            let url = map.get("url").and_then(JsonValue::as_str).map(str::to_string);
            Ok(ParseValue::from_file(ParseFile {
                name: name.to_string(),
                url,
            }))
        }
        "Relation" => {
            let class_name = required_str(map, KEY_CLASS_NAME, tag)?;
            Ok(ParseValue::from_relation(class_name))
        }
        other => Err(invalid_json(format!("Unsupported __type '{other}'"))),
    }
}

fn decode_object(map: &Map<String, JsonValue>) -> StoreResult<ParseObject> {
    let class_name = required_str(map, KEY_CLASS_NAME, "Object")?;
    let mut object = ParseObject::new(class_name);
    if let Some(object_id) = map.get(KEY_OBJECT_ID).and_then(JsonValue::as_str) {
        object = object.with_object_id(object_id);
    }
    let created_at = optional_date(map, KEY_CREATED_AT)?;
    let updated_at = optional_date(map, KEY_UPDATED_AT)?;
    object = object.with_timestamps(created_at, updated_at);

    let skip = [
        KEY_TYPE,
        KEY_CLASS_NAME,
        KEY_OBJECT_ID,
        KEY_CREATED_AT,
        KEY_UPDATED_AT,
    ];
    for (key, value) in decode_fields(map, &skip)? {
        object = object.with_field(key, value);
    }
    Ok(object)
}

fn decode_fields(
    map: &Map<String, JsonValue>,
    skip: &[&str],
) -> StoreResult<BTreeMap<String, ParseValue>> {
    let mut fields = BTreeMap::new();
    for (key, value) in map {
        if skip.contains(&key.as_str()) {
            continue;
        }
        fields.insert(key.clone(), decode_value(value)?);
    }
    Ok(fields)
}

fn decode_geo_point(map: &Map<String, JsonValue>) -> StoreResult<ParseGeoPoint> {
    let latitude = required_f64(map, "latitude")?;
    let longitude = required_f64(map, "longitude")?;
    ParseGeoPoint::new(latitude, longitude)
        .map_err(|err| invalid_json(format!("Invalid GeoPoint: {}", err.message())))
}

fn decode_coordinate_pair(value: &JsonValue) -> StoreResult<ParseGeoPoint> {
    let pair = value
        .as_array()
        .filter(|pair| pair.len() == 2)
        .ok_or_else(|| invalid_json("Polygon coordinates must be [latitude, longitude] pairs"))?;
    let latitude = pair[0]
        .as_f64()
        .ok_or_else(|| invalid_json("Polygon latitude must be a number"))?;
    let longitude = pair[1]
        .as_f64()
        .ok_or_else(|| invalid_json("Polygon longitude must be a number"))?;
    ParseGeoPoint::new(latitude, longitude)
        .map_err(|err| invalid_json(format!("Invalid polygon vertex: {}", err.message())))
}

fn required_str<'a>(map: &'a Map<String, JsonValue>, key: &str, tag: &str) -> StoreResult<&'a str> {
    map.get(key)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| invalid_json(format!("{tag} requires a string '{key}'")))
}

fn required_f64(map: &Map<String, JsonValue>, key: &str) -> StoreResult<f64> {
    map.get(key)
        .and_then(JsonValue::as_f64)
        .ok_or_else(|| invalid_json(format!("GeoPoint requires a numeric '{key}'")))
}

fn optional_date(map: &Map<String, JsonValue>, key: &str) -> StoreResult<Option<DateTime<Utc>>> {
    match map.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(iso)) => parse_iso(iso).map(Some),
        Some(tagged @ JsonValue::Object(_)) => match decode_value(tagged)?.into_kind() {
            ValueKind::Date(instant) => Ok(Some(instant)),
            _ => Err(invalid_json(format!("'{key}' must be a date"))),
        },
        Some(_) => Err(invalid_json(format!("'{key}' must be a date"))),
    }
}

fn parse_iso(iso: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(iso)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|err| invalid_json(format!("Invalid ISO-8601 date '{iso}': {err}")))
}

/// Encodes a value into the tagged JSON format.
///
/// Complete objects are written in full and tagged `Object`; objects known only by id
/// are written as pointers.
pub fn encode_value(value: &ParseValue) -> JsonValue {
    match value.kind() {
        ValueKind::Null => JsonValue::Null,
        ValueKind::Boolean(flag) => json!(flag),
        ValueKind::Integer(integer) => json!(integer),
        ValueKind::Double(double) => json!(double),
        ValueKind::String(text) => json!(text),
        ValueKind::Date(instant) => json!({ KEY_TYPE: "Date", "iso": format_iso(*instant) }),
        ValueKind::Bytes(bytes) => json!({
            KEY_TYPE: "Bytes",
            "base64": BASE64_STANDARD.encode(bytes),
        }),
        ValueKind::Pointer(pointer) => json!({
            KEY_TYPE: "Pointer",
            KEY_CLASS_NAME: pointer.class_name,
            KEY_OBJECT_ID: pointer.object_id,
        }),
        ValueKind::Object(object) => encode_related_object(object),
        ValueKind::GeoPoint(point) => encode_geo_point(point),
        ValueKind::Polygon(points) => json!({
            KEY_TYPE: "Polygon",
            "coordinates": points
                .iter()
                .map(|point| json!([point.latitude(), point.longitude()]))
                .collect::<Vec<_>>(),
        }),
        ValueKind::File(file) => {
            let mut map = Map::new();
            map.insert(KEY_TYPE.to_string(), json!("File"));
            map.insert("name".to_string(), json!(file.name));
            if let Some(url) = &file.url {
                map.insert("url".to_string(), json!(url));
            }
            JsonValue::Object(map)
        }
        ValueKind::Relation(class_name) => json!({
            KEY_TYPE: "Relation",
            KEY_CLASS_NAME: class_name,
        }),
        ValueKind::Array(values) => JsonValue::Array(values.iter().map(encode_value).collect()),
        ValueKind::Map(map) => JsonValue::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), encode_value(value)))
                .collect(),
        ),
    }
}

pub(crate) fn encode_geo_point(point: &ParseGeoPoint) -> JsonValue {
    json!({
        KEY_TYPE: "GeoPoint",
        "latitude": point.latitude(),
        "longitude": point.longitude(),
    })
}

fn encode_related_object(object: &ParseObject) -> JsonValue {
    match (object.is_complete(), object.object_id()) {
        (false, Some(object_id)) => json!({
            KEY_TYPE: "Pointer",
            KEY_CLASS_NAME: object.class_name(),
            KEY_OBJECT_ID: object_id,
        }),
        _ => {
            let mut map = object.to_json_map();
            map.insert(KEY_TYPE.to_string(), json!("Object"));
            JsonValue::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(value: JsonValue) -> StoreResult<ParseValue> {
        JsonDecoder::new().decode(&value)
    }

    #[test]
    fn decodes_scalars() {
        assert_eq!(decode(json!(null)).unwrap(), ParseValue::null());
        assert_eq!(decode(json!(7)).unwrap(), ParseValue::from_integer(7));
        assert_eq!(decode(json!(7.5)).unwrap(), ParseValue::from_double(7.5));
        assert_eq!(decode(json!("bob")).unwrap(), ParseValue::from_string("bob"));
    }

    #[test]
    fn decodes_geo_point() {
        let value = decode(json!({"__type": "GeoPoint", "latitude": 40.0, "longitude": -30.0}))
            .unwrap();
        let point = value.as_geo_point().unwrap();
        assert_eq!(point.latitude(), 40.0);
        assert_eq!(point.longitude(), -30.0);
    }

    #[test]
    fn rejects_out_of_range_geo_point() {
        let err = decode(json!({"__type": "GeoPoint", "latitude": 95.0, "longitude": 0.0}))
            .unwrap_err();
        assert_eq!(err.code_str(), "store/invalid-json");
    }

    #[test]
    fn decodes_pointer() {
        let value = decode(json!({
            "__type": "Pointer",
            "className": "_User",
            "objectId": "8TOXdXf3tz"
        }))
        .unwrap();
        assert_eq!(
            value.kind(),
            &ValueKind::Pointer(ParsePointer::new("_User", "8TOXdXf3tz"))
        );
    }

    #[test]
    fn decodes_date_and_bytes() {
        let date = decode(json!({"__type": "Date", "iso": "2011-08-21T18:02:52.249Z"})).unwrap();
        assert!(matches!(date.kind(), ValueKind::Date(_)));

        let bytes = decode(json!({"__type": "Bytes", "base64": "aGVsbG8="})).unwrap();
        assert_eq!(bytes, ParseValue::from_bytes(b"hello".to_vec()));
    }

    #[test]
    fn decodes_untagged_object_as_map() {
        let value = decode(json!({"a": 1, "b": [true]})).unwrap();
        match value.kind() {
            ValueKind::Map(map) => {
                assert_eq!(map.get("a"), Some(&ParseValue::from_integer(1)));
                assert_eq!(
                    map.get("b"),
                    Some(&ParseValue::from_array(vec![ParseValue::from_bool(true)]))
                );
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(decode(json!({"__type": "Hologram"})).is_err());
    }

    #[test]
    fn decodes_full_object() {
        let value = decode(json!({
            "__type": "Object",
            "className": "Post",
            "objectId": "p1",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "title": "hi"
        }))
        .unwrap();
        match value.kind() {
            ValueKind::Object(object) => {
                assert_eq!(object.class_name(), "Post");
                assert_eq!(object.object_id(), Some("p1"));
                assert!(object.created_at().is_some());
                assert_eq!(object.get("title"), Some(&ParseValue::from_string("hi")));
                assert!(object.get("__type").is_none());
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn encodes_incomplete_object_as_pointer() {
        let value = ParseValue::from_object(ParseObject::without_data("Post", "p1"));
        assert_eq!(
            encode_value(&value),
            json!({"__type": "Pointer", "className": "Post", "objectId": "p1"})
        );
    }

    #[test]
    fn encodes_complete_object_in_full() {
        let object = ParseObject::new("Post")
            .with_object_id("p1")
            .with_field("title", ParseValue::from_string("hi"));
        let encoded = encode_value(&ParseValue::from_object(object));
        assert_eq!(
            encoded,
            json!({"__type": "Object", "className": "Post", "objectId": "p1", "title": "hi"})
        );
    }

    #[test]
    fn polygon_survives_encoding() {
        let original = json!({
            "__type": "Polygon",
            "coordinates": [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]]
        });
        let value = decode(original.clone()).unwrap();
        assert_eq!(encode_value(&value), original);
    }
}
