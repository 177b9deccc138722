use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::bridge::error::{invalid_json, not_implemented, BridgeResult};
use crate::query::{FilterDescription, QueryCompiler};
use crate::store::{QueryBuilder, StoreClient};

pub const QUERY_IN_BACKGROUND: &str = "queryInBackground";

/// A method invocation received over the channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: JsonValue,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: JsonValue) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// Successful reply to `queryInBackground`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryReply {
    /// JSON array of the result rows, already serialized.
    Rows(String),
    Count(i64),
}

impl QueryReply {
    /// The value sent back over the channel: the rows string or the bare count.
    pub fn into_channel_value(self) -> JsonValue {
        match self {
            QueryReply::Rows(rows) => JsonValue::String(rows),
            QueryReply::Count(count) => JsonValue::from(count),
        }
    }
}

/// Reads channel arguments given either as JSON text or as a key-value map.
pub fn parse_arguments(arguments: &JsonValue) -> Option<Map<String, JsonValue>> {
    match arguments {
        JsonValue::String(text) => match serde_json::from_str(text) {
            Ok(JsonValue::Object(map)) => Some(map),
            _ => None,
        },
        JsonValue::Object(map) => Some(map.clone()),
        _ => None,
    }
}

/// Serves query calls arriving over the channel.
pub struct QueryBridge<S: StoreClient> {
    compiler: QueryCompiler<S>,
}

impl<S: StoreClient> Clone for QueryBridge<S> {
    fn clone(&self) -> Self {
        Self {
            compiler: self.compiler.clone(),
        }
    }
}

impl<S: StoreClient> QueryBridge<S> {
    pub fn new(compiler: QueryCompiler<S>) -> Self {
        Self { compiler }
    }

    pub fn compiler(&self) -> &QueryCompiler<S> {
        &self.compiler
    }

    /// Dispatches a channel call by method name.
    pub async fn handle(&self, call: &MethodCall) -> BridgeResult<JsonValue> {
        match call.method.as_str() {
            QUERY_IN_BACKGROUND => self
                .query_in_background(&call.arguments)
                .await
                .map(QueryReply::into_channel_value),
            other => Err(not_implemented(other)),
        }
    }

    /// Compiles the described query and runs it, or counts it when `count` is 1.
    pub async fn query_in_background(&self, arguments: &JsonValue) -> BridgeResult<QueryReply> {
        let map = parse_arguments(arguments).ok_or_else(|| invalid_json("invalid parse query"))?;
        let description = FilterDescription::from_map(&map);
        let (query, count) = self.compiler.compile_description(&description)?.into_parts();
        let store = self.compiler.store();

        if count {
            let total = store.count(&query).await.map_err(|err| {
                log::warn!("count on '{}' failed: {err}", query.class_name());
                err
            })?;
            return Ok(QueryReply::Count(total));
        }

        let rows = store.find(&query).await.map_err(|err| {
            log::warn!("find on '{}' failed: {err}", query.class_name());
            err
        })?;
        log::debug!("find on '{}' returned {} row(s)", query.class_name(), rows.len());

        let encoded: Vec<JsonValue> = rows.iter().map(|row| row.to_json()).collect();
        Ok(QueryReply::Rows(JsonValue::Array(encoded).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::error::BridgeErrorCode;
    use crate::store::error::connection_failed;
    use crate::store::ParseValue;
    use crate::test_support::{bridge_with_rows, player};
    use serde_json::json;

    #[test]
    fn parses_text_and_map_arguments() {
        let map = parse_arguments(&json!("{\"className\": \"Player\"}")).unwrap();
        assert_eq!(map["className"], json!("Player"));

        let map = parse_arguments(&json!({"className": "Player"})).unwrap();
        assert_eq!(map["className"], json!("Player"));

        assert!(parse_arguments(&json!("[1, 2]")).is_none());
        assert!(parse_arguments(&json!("{oops")).is_none());
        assert!(parse_arguments(&json!(12)).is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn returns_rows_as_json_array_string() {
        let (bridge, _store) = bridge_with_rows(vec![
            player("a", "alice", 10),
            player("b", "bob", 7),
        ]);

        let reply = bridge
            .query_in_background(&json!({"className": "Player"}))
            .await
            .unwrap();
        let QueryReply::Rows(rows) = reply else {
            panic!("expected rows");
        };
        let rows: JsonValue = serde_json::from_str(&rows).unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 2);
        assert_eq!(rows[0]["objectId"], json!("a"));
        assert_eq!(rows[0]["className"], json!("Player"));
        assert_eq!(rows[1]["score"], json!(7));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn counts_when_count_is_one() {
        let (bridge, store) = bridge_with_rows(vec![player("a", "alice", 10)]);

        let reply = bridge
            .query_in_background(&json!("{\"className\": \"Player\", \"count\": 1}"))
            .await
            .unwrap();
        assert_eq!(reply, QueryReply::Count(1));
        assert_eq!(store.executed_queries().len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn boolean_count_still_returns_rows() {
        let (bridge, _store) = bridge_with_rows(vec![player("a", "alice", 10)]);
        let reply = bridge
            .query_in_background(&json!({"className": "Player", "count": true}))
            .await
            .unwrap();
        assert!(matches!(reply, QueryReply::Rows(_)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn invalid_arguments_are_rejected() {
        let (bridge, store) = bridge_with_rows(Vec::new());

        let err = bridge.query_in_background(&json!(42)).await.unwrap_err();
        assert_eq!(err.code, BridgeErrorCode::InvalidJson);
        assert_eq!(err.message(), "invalid parse query");

        let err = bridge
            .query_in_background(&json!({"where": {}}))
            .await
            .unwrap_err();
        assert_eq!(err.code.channel_code(), "107");
        assert_eq!(err.message(), "no className found");

        assert!(store.executed_queries().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn store_failures_keep_their_code() {
        let (bridge, store) = bridge_with_rows(Vec::new());
        store.fail_with(connection_failed("i/o failure"));

        let err = bridge
            .query_in_background(&json!({"className": "Player"}))
            .await
            .unwrap_err();
        assert_eq!(err.code, BridgeErrorCode::Backend(100));
        assert_eq!(err.message(), "i/o failure");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn handle_dispatches_by_method() {
        let (bridge, store) = bridge_with_rows(vec![player("a", "alice", 10)]);

        let value = bridge
            .handle(&MethodCall::new(
                QUERY_IN_BACKGROUND,
                json!({"className": "Player", "count": 1, "where": {"name": "alice"}}),
            ))
            .await
            .unwrap();
        assert_eq!(value, json!(1));

        let executed = store.executed_queries();
        assert_eq!(
            executed[0].constraints_for("name").next(),
            Some(&crate::store::Constraint::Equal(ParseValue::from_string("alice")))
        );

        let err = bridge
            .handle(&MethodCall::new("saveInBackground", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.code, BridgeErrorCode::NotImplemented);
    }

    #[test]
    fn method_call_deserializes_without_arguments() {
        let call: MethodCall =
            serde_json::from_value(json!({"method": "queryInBackground"})).unwrap();
        assert_eq!(call.arguments, JsonValue::Null);
    }
}
