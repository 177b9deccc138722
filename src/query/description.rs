use serde_json::{Map, Value as JsonValue};

use crate::query::error::{invalid_input, QueryResult};

pub const KEY_CLASS_NAME: &str = "className";
pub const KEY_WHERE: &str = "where";
pub const KEY_LIMIT: &str = "limit";
pub const KEY_SKIP: &str = "skip";
pub const KEY_INCLUDE: &str = "include";
pub const KEY_ORDER: &str = "order";
pub const KEY_FIELDS: &str = "fields";
pub const KEY_COUNT: &str = "count";

/// Declarative description of a query, read leniently from JSON.
///
/// Missing or mistyped attributes fall back to their empty value instead of failing:
/// strings read as `""`, numbers as `0`, `where` as an empty map. Only a non-object
/// root is rejected.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterDescription {
    class_name: String,
    where_clause: Map<String, JsonValue>,
    limit: i64,
    skip: i64,
    include: String,
    order: String,
    fields: String,
    count: bool,
}

/// One parsed entry of the `order` list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderKey<'a> {
    pub field: &'a str,
    pub descending: bool,
}

impl FilterDescription {
    pub fn from_value(value: &JsonValue) -> QueryResult<Self> {
        value
            .as_object()
            .map(Self::from_map)
            .ok_or_else(|| invalid_input("invalid parse query"))
    }

    pub fn from_json_str(input: &str) -> QueryResult<Self> {
        let value: JsonValue = serde_json::from_str(input)
            .map_err(|err| invalid_input(format!("invalid parse query: {err}")))?;
        Self::from_value(&value)
    }

    pub fn from_map(map: &Map<String, JsonValue>) -> Self {
        Self {
            class_name: opt_string(map, KEY_CLASS_NAME),
            where_clause: map
                .get(KEY_WHERE)
                .and_then(JsonValue::as_object)
                .cloned()
                .unwrap_or_default(),
            limit: opt_int(map, KEY_LIMIT),
            skip: opt_int(map, KEY_SKIP),
            include: opt_string(map, KEY_INCLUDE),
            order: opt_string(map, KEY_ORDER),
            fields: opt_string(map, KEY_FIELDS),
            // Read like `limit`, so `1.0` counts and `true` does not.
            count: opt_int(map, KEY_COUNT) == 1,
        }
    }

    /// The target class, `None` when absent or empty.
    pub fn class_name(&self) -> Option<&str> {
        Some(self.class_name.as_str()).filter(|name| !name.is_empty())
    }

    pub fn where_clause(&self) -> &Map<String, JsonValue> {
        &self.where_clause
    }

    /// Requested limit; zero means none, so a limit of 0 cannot be expressed.
    pub fn limit(&self) -> Option<i64> {
        Some(self.limit).filter(|limit| *limit != 0)
    }

    /// Requested skip; zero means none.
    pub fn skip(&self) -> Option<i64> {
        Some(self.skip).filter(|skip| *skip != 0)
    }

    pub fn count(&self) -> bool {
        self.count
    }

    pub fn include_paths(&self) -> Vec<&str> {
        split_list(&self.include)
    }

    pub fn order_keys(&self) -> Vec<OrderKey<'_>> {
        split_list(&self.order)
            .into_iter()
            .map(|token| match token.strip_prefix('-') {
                Some(field) => OrderKey {
                    field,
                    descending: true,
                },
                None => OrderKey {
                    field: token,
                    descending: false,
                },
            })
            .filter(|key| !key.field.is_empty())
            .collect()
    }

    pub fn selected_fields(&self) -> Vec<&str> {
        split_list(&self.fields)
    }
}

/// Splits a comma separated list, dropping empty tokens.
pub(crate) fn split_list(input: &str) -> Vec<&str> {
    input.split(',').filter(|token| !token.is_empty()).collect()
}

fn opt_string(map: &Map<String, JsonValue>, key: &str) -> String {
    map.get(key)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn opt_int(map: &Map<String, JsonValue>, key: &str) -> i64 {
    match map.get(key) {
        Some(JsonValue::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn describe(value: JsonValue) -> FilterDescription {
        FilterDescription::from_value(&value).unwrap()
    }

    #[test]
    fn non_object_root_is_invalid_input() {
        let err = FilterDescription::from_value(&json!([1, 2])).unwrap_err();
        assert_eq!(err.code_str(), "query/invalid-input");
        assert!(FilterDescription::from_json_str("{not json").is_err());
    }

    #[test]
    fn empty_class_name_reads_as_missing() {
        assert_eq!(describe(json!({"className": ""})).class_name(), None);
        assert_eq!(describe(json!({"className": 3})).class_name(), None);
        assert_eq!(describe(json!({"className": "Post"})).class_name(), Some("Post"));
    }

    #[test]
    fn count_only_accepts_numeric_one() {
        assert!(describe(json!({"count": 1})).count());
        assert!(describe(json!({"count": 1.0})).count());
        assert!(!describe(json!({"count": 2.0})).count());
        assert!(!describe(json!({"count": true})).count());
        assert!(!describe(json!({"count": 0})).count());
        assert!(!describe(json!({"count": "1"})).count());
        assert!(!describe(json!({})).count());
    }

    #[test]
    fn zero_limit_and_skip_mean_absent() {
        let description = describe(json!({"limit": 0, "skip": 0}));
        assert_eq!(description.limit(), None);
        assert_eq!(description.skip(), None);

        let description = describe(json!({"limit": 25, "skip": 50}));
        assert_eq!(description.limit(), Some(25));
        assert_eq!(description.skip(), Some(50));
    }

    #[test]
    fn fractional_limit_truncates() {
        assert_eq!(describe(json!({"limit": 7.9})).limit(), Some(7));
        assert_eq!(describe(json!({"limit": "7"})).limit(), None);
    }

    #[test]
    fn missing_or_mistyped_where_is_empty() {
        assert!(describe(json!({})).where_clause().is_empty());
        assert!(describe(json!({"where": [1]})).where_clause().is_empty());
    }

    #[test]
    fn order_keys_strip_only_leading_dash() {
        let description = describe(json!({"order": "age,-score,created-at"}));
        assert_eq!(
            description.order_keys(),
            vec![
                OrderKey {
                    field: "age",
                    descending: false
                },
                OrderKey {
                    field: "score",
                    descending: true
                },
                OrderKey {
                    field: "created-at",
                    descending: false
                },
            ]
        );
    }

    #[test]
    fn lists_skip_empty_tokens() {
        let description = describe(json!({"include": "author,,comments,", "fields": ","}));
        assert_eq!(description.include_paths(), vec!["author", "comments"]);
        assert!(description.selected_fields().is_empty());
        assert_eq!(split_list("author"), vec!["author"]);
    }
}
