use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::store::error::StoreResult;
use crate::store::{ParseGeoPoint, ParseObject, ParseValue};

/// Converts a single JSON value (scalar or tagged object) into a [`ParseValue`].
pub trait LeafDecoder: Send + Sync {
    fn decode(&self, value: &JsonValue) -> StoreResult<ParseValue>;
}

/// Builder surface of a backend query.
///
/// Every clause mutates the query in place and hands it back for chaining.
pub trait QueryBuilder: Sized + Send + Sync + 'static {
    fn class_name(&self) -> &str;

    fn where_equal_to(&mut self, key: &str, value: ParseValue) -> &mut Self;
    fn where_not_equal_to(&mut self, key: &str, value: ParseValue) -> &mut Self;
    fn where_less_than(&mut self, key: &str, value: ParseValue) -> &mut Self;
    fn where_greater_than(&mut self, key: &str, value: ParseValue) -> &mut Self;
    fn where_less_than_or_equal_to(&mut self, key: &str, value: ParseValue) -> &mut Self;
    fn where_greater_than_or_equal_to(&mut self, key: &str, value: ParseValue) -> &mut Self;

    fn where_contained_in(&mut self, key: &str, values: Vec<ParseValue>) -> &mut Self;
    fn where_not_contained_in(&mut self, key: &str, values: Vec<ParseValue>) -> &mut Self;
    fn where_contains_all(&mut self, key: &str, values: Vec<ParseValue>) -> &mut Self;

    fn where_full_text(&mut self, key: &str, text: &str) -> &mut Self;
    fn where_contains(&mut self, key: &str, substring: &str) -> &mut Self;
    fn where_starts_with(&mut self, key: &str, prefix: &str) -> &mut Self;
    fn where_ends_with(&mut self, key: &str, suffix: &str) -> &mut Self;
    fn where_matches(&mut self, key: &str, regex: &str, modifiers: Option<&str>) -> &mut Self;

    fn where_exists(&mut self, key: &str) -> &mut Self;
    fn where_does_not_exist(&mut self, key: &str) -> &mut Self;

    fn where_near(&mut self, key: &str, point: ParseGeoPoint) -> &mut Self;
    fn where_within_radians(
        &mut self,
        key: &str,
        point: ParseGeoPoint,
        max_distance: f64,
    ) -> &mut Self;
    fn where_within_geo_box(
        &mut self,
        key: &str,
        north_west: ParseGeoPoint,
        south_east: ParseGeoPoint,
    ) -> &mut Self;
    fn where_within_polygon(&mut self, key: &str, points: Vec<ParseGeoPoint>) -> &mut Self;
    fn where_polygon_contains(&mut self, key: &str, point: ParseGeoPoint) -> &mut Self;

    fn where_matches_key_in_query(
        &mut self,
        key: &str,
        key_in_query: &str,
        query: Self,
    ) -> &mut Self;
    fn where_does_not_match_key_in_query(
        &mut self,
        key: &str,
        key_in_query: &str,
        query: Self,
    ) -> &mut Self;
    fn where_matches_query(&mut self, key: &str, query: Self) -> &mut Self;
    fn where_does_not_match_query(&mut self, key: &str, query: Self) -> &mut Self;

    fn set_limit(&mut self, limit: i64) -> &mut Self;
    fn set_skip(&mut self, skip: i64) -> &mut Self;
    fn include(&mut self, key: &str) -> &mut Self;

    /// Replaces any existing ordering with an ascending sort on `key`.
    fn order_by_ascending(&mut self, key: &str) -> &mut Self;
    /// Replaces any existing ordering with a descending sort on `key`.
    fn order_by_descending(&mut self, key: &str) -> &mut Self;
    /// Appends `key` as a further ascending sort key.
    fn add_ascending_order(&mut self, key: &str) -> &mut Self;
    /// Appends `key` as a further descending sort key.
    fn add_descending_order(&mut self, key: &str) -> &mut Self;

    fn select_keys(&mut self, keys: Vec<String>) -> &mut Self;
}

/// Backend client able to create and execute queries.
#[async_trait]
pub trait StoreClient: Send + Sync + 'static {
    type Query: QueryBuilder;

    fn new_query(&self, class_name: &str) -> Self::Query;

    async fn find(&self, query: &Self::Query) -> StoreResult<Vec<ParseObject>>;

    async fn count(&self, query: &Self::Query) -> StoreResult<i64>;
}
