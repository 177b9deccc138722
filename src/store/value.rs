use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::store::object::ParseObject;
use crate::store::ParseGeoPoint;

/// Leaf value handed to query builders and carried by result rows.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseValue {
    kind: ValueKind,
}

/// Reference to an object of another class, without its data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsePointer {
    pub class_name: String,
    pub object_id: String,
}

impl ParsePointer {
    pub fn new(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: object_id.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseFile {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Date(DateTime<Utc>),
    Bytes(Vec<u8>),
    Pointer(ParsePointer),
    Object(Box<ParseObject>),
    GeoPoint(ParseGeoPoint),
    Polygon(Vec<ParseGeoPoint>),
    File(ParseFile),
    Relation(String),
    Array(Vec<ParseValue>),
    Map(BTreeMap<String, ParseValue>),
}

impl ParseValue {
    pub fn null() -> Self {
        Self {
            kind: ValueKind::Null,
        }
    }

    pub fn from_bool(value: bool) -> Self {
        Self {
            kind: ValueKind::Boolean(value),
        }
    }

    pub fn from_integer(value: i64) -> Self {
        Self {
            kind: ValueKind::Integer(value),
        }
    }

    pub fn from_double(value: f64) -> Self {
        Self {
            kind: ValueKind::Double(value),
        }
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::String(value.into()),
        }
    }

    pub fn from_date(value: DateTime<Utc>) -> Self {
        Self {
            kind: ValueKind::Date(value),
        }
    }

    pub fn from_bytes(value: Vec<u8>) -> Self {
        Self {
            kind: ValueKind::Bytes(value),
        }
    }

    pub fn from_pointer(pointer: ParsePointer) -> Self {
        Self {
            kind: ValueKind::Pointer(pointer),
        }
    }

    pub fn from_object(object: ParseObject) -> Self {
        Self {
            kind: ValueKind::Object(Box::new(object)),
        }
    }

    pub fn from_geo_point(point: ParseGeoPoint) -> Self {
        Self {
            kind: ValueKind::GeoPoint(point),
        }
    }

    pub fn from_polygon(points: Vec<ParseGeoPoint>) -> Self {
        Self {
            kind: ValueKind::Polygon(points),
        }
    }

    pub fn from_file(file: ParseFile) -> Self {
        Self {
            kind: ValueKind::File(file),
        }
    }

    /// A relation to objects of `class_name`.
    pub fn from_relation(class_name: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::Relation(class_name.into()),
        }
    }

    pub fn from_array(values: Vec<ParseValue>) -> Self {
        Self {
            kind: ValueKind::Array(values),
        }
    }

    pub fn from_map(map: BTreeMap<String, ParseValue>) -> Self {
        Self {
            kind: ValueKind::Map(map),
        }
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn into_kind(self) -> ValueKind {
        self.kind
    }

    pub fn as_geo_point(&self) -> Option<ParseGeoPoint> {
        match &self.kind {
            ValueKind::GeoPoint(point) => Some(*point),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the elements when this value is an array.
    pub fn into_array(self) -> Option<Vec<ParseValue>> {
        match self.kind {
            ValueKind::Array(values) => Some(values),
            _ => None,
        }
    }
}

impl From<ParseGeoPoint> for ParseValue {
    fn from(point: ParseGeoPoint) -> Self {
        ParseValue::from_geo_point(point)
    }
}

impl From<&str> for ParseValue {
    fn from(value: &str) -> Self {
        ParseValue::from_string(value)
    }
}

impl From<i64> for ParseValue {
    fn from(value: i64) -> Self {
        ParseValue::from_integer(value)
    }
}
