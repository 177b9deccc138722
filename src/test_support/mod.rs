//! Test utilities shared across crate-level unit tests.

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};

use crate::bridge::QueryBridge;
use crate::query::{CompileOptions, QueryCompiler};
use crate::store::{InMemoryStore, ParseObject, ParseValue};

pub fn compiler() -> QueryCompiler<InMemoryStore> {
    QueryCompiler::with_json_decoder(Arc::new(InMemoryStore::new()))
}

pub fn strict_compiler() -> QueryCompiler<InMemoryStore> {
    compiler().with_options(CompileOptions::strict())
}

pub fn geo_point(latitude: f64, longitude: f64) -> JsonValue {
    json!({"__type": "GeoPoint", "latitude": latitude, "longitude": longitude})
}

pub fn player(object_id: &str, name: &str, score: i64) -> ParseObject {
    ParseObject::new("Player")
        .with_object_id(object_id)
        .with_field("name", ParseValue::from_string(name))
        .with_field("score", ParseValue::from_integer(score))
}

/// A bridge over a store seeded with `rows`, plus a handle on that store.
pub fn bridge_with_rows(rows: Vec<ParseObject>) -> (QueryBridge<InMemoryStore>, InMemoryStore) {
    let store = InMemoryStore::new();
    for row in rows {
        store.insert(row);
    }
    let compiler = QueryCompiler::with_json_decoder(Arc::new(store.clone()));
    (QueryBridge::new(compiler), store)
}
