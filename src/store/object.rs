use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue};

use crate::store::codec::encode_value;
use crate::store::ParseValue;

pub const KEY_CLASS_NAME: &str = "className";
pub const KEY_OBJECT_ID: &str = "objectId";
pub const KEY_CREATED_AT: &str = "createdAt";
pub const KEY_UPDATED_AT: &str = "updatedAt";

/// A stored object as returned by the backend.
///
/// `complete` is false for objects known only by class and id; such objects are
/// encoded as pointers when they appear inside other values.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseObject {
    class_name: String,
    object_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    fields: BTreeMap<String, ParseValue>,
    complete: bool,
}

impl ParseObject {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: None,
            created_at: None,
            updated_at: None,
            fields: BTreeMap::new(),
            complete: true,
        }
    }

    /// Creates an object known only by its class and id.
    pub fn without_data(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_id: Some(object_id.into()),
            complete: false,
            ..Self::new(class_name)
        }
    }

    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    pub fn with_timestamps(
        mut self,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: ParseValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn get(&self, key: &str) -> Option<&ParseValue> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &BTreeMap<String, ParseValue> {
        &self.fields
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// REST representation: bookkeeping keys followed by the encoded fields.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.to_json_map())
    }

    pub(crate) fn to_json_map(&self) -> Map<String, JsonValue> {
        let mut map = Map::new();
        map.insert(
            KEY_CLASS_NAME.to_string(),
            JsonValue::String(self.class_name.clone()),
        );
        if let Some(object_id) = &self.object_id {
            map.insert(
                KEY_OBJECT_ID.to_string(),
                JsonValue::String(object_id.clone()),
            );
        }
        if let Some(created_at) = self.created_at {
            map.insert(KEY_CREATED_AT.to_string(), format_iso(created_at));
        }
        if let Some(updated_at) = self.updated_at {
            map.insert(KEY_UPDATED_AT.to_string(), format_iso(updated_at));
        }
        for (key, value) in &self.fields {
            map.insert(key.clone(), encode_value(value));
        }
        map
    }
}

pub(crate) fn format_iso(instant: DateTime<Utc>) -> JsonValue {
    JsonValue::String(instant.to_rfc3339_opts(SecondsFormat::Millis, true))
}
