use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::{json, Map, Value as JsonValue};

use crate::store::codec::{encode_geo_point, encode_value};
use crate::store::{ParseGeoPoint, ParseValue, QueryBuilder};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderDirection {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    field: String,
    direction: OrderDirection,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> OrderDirection {
        self.direction
    }

    fn rest_token(&self) -> String {
        match self.direction {
            OrderDirection::Ascending => self.field.clone(),
            OrderDirection::Descending => format!("-{}", self.field),
        }
    }
}

/// A single clause applied to a field.
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    Equal(ParseValue),
    NotEqual(ParseValue),
    LessThan(ParseValue),
    GreaterThan(ParseValue),
    LessThanOrEqual(ParseValue),
    GreaterThanOrEqual(ParseValue),
    ContainedIn(Vec<ParseValue>),
    NotContainedIn(Vec<ParseValue>),
    ContainsAll(Vec<ParseValue>),
    FullText(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Matches {
        regex: String,
        modifiers: Option<String>,
    },
    Exists,
    DoesNotExist,
    Near(ParseGeoPoint),
    WithinRadians {
        point: ParseGeoPoint,
        max_distance: f64,
    },
    WithinGeoBox {
        north_west: ParseGeoPoint,
        south_east: ParseGeoPoint,
    },
    WithinPolygon(Vec<ParseGeoPoint>),
    PolygonContains(ParseGeoPoint),
    MatchesKeyInQuery {
        key_in_query: String,
        query: Box<RecordedQuery>,
    },
    DoesNotMatchKeyInQuery {
        key_in_query: String,
        query: Box<RecordedQuery>,
    },
    MatchesQuery(Box<RecordedQuery>),
    DoesNotMatchQuery(Box<RecordedQuery>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldConstraint {
    field: String,
    constraint: Constraint,
}

impl FieldConstraint {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }
}

/// Query that keeps every clause as inspectable data.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedQuery {
    class_name: String,
    constraints: Vec<FieldConstraint>,
    order: Vec<OrderBy>,
    includes: Vec<String>,
    selected_keys: Option<Vec<String>>,
    limit: Option<i64>,
    skip: Option<i64>,
}

impl RecordedQuery {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            constraints: Vec::new(),
            order: Vec::new(),
            includes: Vec::new(),
            selected_keys: None,
            limit: None,
            skip: None,
        }
    }

    /// Clauses in the order they were applied.
    pub fn constraints(&self) -> &[FieldConstraint] {
        &self.constraints
    }

    pub fn constraints_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Constraint> {
        self.constraints
            .iter()
            .filter(move |entry| entry.field == field)
            .map(|entry| &entry.constraint)
    }

    pub fn order(&self) -> &[OrderBy] {
        &self.order
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn selected_keys(&self) -> Option<&[String]> {
        self.selected_keys.as_deref()
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn skip(&self) -> Option<i64> {
        self.skip
    }

    fn push(&mut self, key: &str, constraint: Constraint) -> &mut Self {
        self.constraints.push(FieldConstraint {
            field: key.to_string(),
            constraint,
        });
        self
    }

    /// Renders the `where` object of the REST API.
    ///
    /// An equality is written as the bare value unless the same field also carries
    /// operators, in which case it becomes `$eq`. A clause whose operator keys are
    /// already taken on its field goes into a top-level `$and` instead.
    pub fn where_json(&self) -> JsonValue {
        let mut fields: Map<String, JsonValue> = Map::new();
        let mut conjuncts: Vec<JsonValue> = Vec::new();

        for entry in &self.constraints {
            let clause = encode_constraint(&entry.constraint);
            let operators = match fields
                .entry(entry.field.clone())
                .or_insert_with(|| JsonValue::Object(Map::new()))
            {
                JsonValue::Object(operators) => operators,
                _ => continue,
            };
            if clause.keys().any(|key| operators.contains_key(key)) {
                let mut conjunct = Map::new();
                conjunct.insert(entry.field.clone(), collapse_equality(clause));
                conjuncts.push(JsonValue::Object(conjunct));
            } else {
                operators.extend(clause);
            }
        }

        let mut rendered: Map<String, JsonValue> = fields
            .into_iter()
            .map(|(field, operators)| match operators {
                JsonValue::Object(operators) => (field, collapse_equality(operators)),
                other => (field, other),
            })
            .collect();
        if !conjuncts.is_empty() {
            rendered.insert("$and".to_string(), JsonValue::Array(conjuncts));
        }
        JsonValue::Object(rendered)
    }

    /// Query parameters for `GET /classes/{className}`.
    pub fn to_rest_params(&self, count: bool) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if !self.constraints.is_empty() {
            params.push(("where".to_string(), self.where_json().to_string()));
        }
        if !self.includes.is_empty() {
            params.push(("include".to_string(), self.includes.join(",")));
        }
        if let Some(keys) = &self.selected_keys {
            params.push(("keys".to_string(), keys.join(",")));
        }
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(OrderBy::rest_token)
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }

        if count {
            params.push(("count".to_string(), "1".to_string()));
            params.push(("limit".to_string(), "0".to_string()));
        } else if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(skip) = self.skip {
            params.push(("skip".to_string(), skip.to_string()));
        }

        params
    }

    pub fn to_query_string(&self, count: bool) -> String {
        self.to_rest_params(count)
            .iter()
            .map(|(key, value)| {
                let value = utf8_percent_encode(value, NON_ALPHANUMERIC);
                format!("{key}={value}")
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    fn sub_query_json(&self) -> JsonValue {
        let mut map = Map::new();
        map.insert("className".to_string(), json!(self.class_name));
        map.insert("where".to_string(), self.where_json());
        if let Some(limit) = self.limit {
            map.insert("limit".to_string(), json!(limit));
        }
        if let Some(skip) = self.skip {
            map.insert("skip".to_string(), json!(skip));
        }
        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(OrderBy::rest_token).collect();
            map.insert("order".to_string(), json!(order.join(",")));
        }
        JsonValue::Object(map)
    }
}

/// A lone `$eq` is written as the bare value.
fn collapse_equality(mut operators: Map<String, JsonValue>) -> JsonValue {
    if operators.len() == 1 {
        if let Some(value) = operators.remove("$eq") {
            return value;
        }
    }
    JsonValue::Object(operators)
}

fn encode_constraint(constraint: &Constraint) -> Map<String, JsonValue> {
    let mut operators = Map::new();
    let encode_all = |values: &[ParseValue]| -> JsonValue {
        JsonValue::Array(values.iter().map(encode_value).collect())
    };

    let (operator, operand) = match constraint {
        Constraint::Equal(value) => ("$eq", encode_value(value)),
        Constraint::NotEqual(value) => ("$ne", encode_value(value)),
        Constraint::LessThan(value) => ("$lt", encode_value(value)),
        Constraint::GreaterThan(value) => ("$gt", encode_value(value)),
        Constraint::LessThanOrEqual(value) => ("$lte", encode_value(value)),
        Constraint::GreaterThanOrEqual(value) => ("$gte", encode_value(value)),
        Constraint::ContainedIn(values) => ("$in", encode_all(values)),
        Constraint::NotContainedIn(values) => ("$nin", encode_all(values)),
        Constraint::ContainsAll(values) => ("$all", encode_all(values)),
        Constraint::FullText(text) => ("$text", json!({ "$search": { "$term": text } })),
        Constraint::Contains(substring) => ("$regex", json!(quote(substring))),
        Constraint::StartsWith(prefix) => ("$regex", json!(format!("^{}", quote(prefix)))),
        Constraint::EndsWith(suffix) => ("$regex", json!(format!("{}$", quote(suffix)))),
        Constraint::Matches { regex, modifiers } => {
            if let Some(modifiers) = modifiers {
                operators.insert("$options".to_string(), json!(modifiers));
            }
            ("$regex", json!(regex))
        }
        Constraint::Exists => ("$exists", json!(true)),
        Constraint::DoesNotExist => ("$exists", json!(false)),
        Constraint::Near(point) => ("$nearSphere", encode_geo_point(point)),
        Constraint::WithinRadians {
            point,
            max_distance,
        } => {
            operators.insert("$maxDistance".to_string(), json!(max_distance));
            ("$nearSphere", encode_geo_point(point))
        }
        Constraint::WithinGeoBox {
            north_west,
            south_east,
        } => {
            // The REST box is [south-west, north-east].
            let south_west = json!({
                "__type": "GeoPoint",
                "latitude": south_east.latitude(),
                "longitude": north_west.longitude(),
            });
            let north_east = json!({
                "__type": "GeoPoint",
                "latitude": north_west.latitude(),
                "longitude": south_east.longitude(),
            });
            ("$within", json!({ "$box": [south_west, north_east] }))
        }
        Constraint::WithinPolygon(points) => (
            "$geoWithin",
            json!({ "$polygon": points.iter().map(encode_geo_point).collect::<Vec<_>>() }),
        ),
        Constraint::PolygonContains(point) => (
            "$geoIntersects",
            json!({ "$point": encode_geo_point(point) }),
        ),
        Constraint::MatchesKeyInQuery {
            key_in_query,
            query,
        } => (
            "$select",
            json!({ "query": query.sub_query_json(), "key": key_in_query }),
        ),
        Constraint::DoesNotMatchKeyInQuery {
            key_in_query,
            query,
        } => (
            "$dontSelect",
            json!({ "query": query.sub_query_json(), "key": key_in_query }),
        ),
        Constraint::MatchesQuery(query) => ("$inQuery", query.sub_query_json()),
        Constraint::DoesNotMatchQuery(query) => ("$notInQuery", query.sub_query_json()),
    };
    operators.insert(operator.to_string(), operand);
    operators
}

/// Literal-quotes `input` for use inside a regular expression.
fn quote(input: &str) -> String {
    format!("\\Q{}\\E", input.replace("\\E", "\\E\\\\E\\Q"))
}

impl QueryBuilder for RecordedQuery {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn where_equal_to(&mut self, key: &str, value: ParseValue) -> &mut Self {
        self.push(key, Constraint::Equal(value))
    }

    fn where_not_equal_to(&mut self, key: &str, value: ParseValue) -> &mut Self {
        self.push(key, Constraint::NotEqual(value))
    }

    fn where_less_than(&mut self, key: &str, value: ParseValue) -> &mut Self {
        self.push(key, Constraint::LessThan(value))
    }

    fn where_greater_than(&mut self, key: &str, value: ParseValue) -> &mut Self {
        self.push(key, Constraint::GreaterThan(value))
    }

    fn where_less_than_or_equal_to(&mut self, key: &str, value: ParseValue) -> &mut Self {
        self.push(key, Constraint::LessThanOrEqual(value))
    }

    fn where_greater_than_or_equal_to(&mut self, key: &str, value: ParseValue) -> &mut Self {
        self.push(key, Constraint::GreaterThanOrEqual(value))
    }

    fn where_contained_in(&mut self, key: &str, values: Vec<ParseValue>) -> &mut Self {
        self.push(key, Constraint::ContainedIn(values))
    }

    fn where_not_contained_in(&mut self, key: &str, values: Vec<ParseValue>) -> &mut Self {
        self.push(key, Constraint::NotContainedIn(values))
    }

    fn where_contains_all(&mut self, key: &str, values: Vec<ParseValue>) -> &mut Self {
        self.push(key, Constraint::ContainsAll(values))
    }

    fn where_full_text(&mut self, key: &str, text: &str) -> &mut Self {
        self.push(key, Constraint::FullText(text.to_string()))
    }

    fn where_contains(&mut self, key: &str, substring: &str) -> &mut Self {
        self.push(key, Constraint::Contains(substring.to_string()))
    }

    fn where_starts_with(&mut self, key: &str, prefix: &str) -> &mut Self {
        self.push(key, Constraint::StartsWith(prefix.to_string()))
    }

    fn where_ends_with(&mut self, key: &str, suffix: &str) -> &mut Self {
        self.push(key, Constraint::EndsWith(suffix.to_string()))
    }

    fn where_matches(&mut self, key: &str, regex: &str, modifiers: Option<&str>) -> &mut Self {
        self.push(
            key,
            Constraint::Matches {
                regex: regex.to_string(),
                modifiers: modifiers.map(str::to_string),
            },
        )
    }

    fn where_exists(&mut self, key: &str) -> &mut Self {
        self.push(key, Constraint::Exists)
    }

    fn where_does_not_exist(&mut self, key: &str) -> &mut Self {
        self.push(key, Constraint::DoesNotExist)
    }

    fn where_near(&mut self, key: &str, point: ParseGeoPoint) -> &mut Self {
        self.push(key, Constraint::Near(point))
    }

    fn where_within_radians(
        &mut self,
        key: &str,
        point: ParseGeoPoint,
        max_distance: f64,
    ) -> &mut Self {
        self.push(
            key,
            Constraint::WithinRadians {
                point,
                max_distance,
            },
        )
    }

    fn where_within_geo_box(
        &mut self,
        key: &str,
        north_west: ParseGeoPoint,
        south_east: ParseGeoPoint,
    ) -> &mut Self {
        self.push(
            key,
            Constraint::WithinGeoBox {
                north_west,
                south_east,
            },
        )
    }

    fn where_within_polygon(&mut self, key: &str, points: Vec<ParseGeoPoint>) -> &mut Self {
        self.push(key, Constraint::WithinPolygon(points))
    }

    fn where_polygon_contains(&mut self, key: &str, point: ParseGeoPoint) -> &mut Self {
        self.push(key, Constraint::PolygonContains(point))
    }

    fn where_matches_key_in_query(
        &mut self,
        key: &str,
        key_in_query: &str,
        query: Self,
    ) -> &mut Self {
        self.push(
            key,
            Constraint::MatchesKeyInQuery {
                key_in_query: key_in_query.to_string(),
                query: Box::new(query),
            },
        )
    }

    fn where_does_not_match_key_in_query(
        &mut self,
        key: &str,
        key_in_query: &str,
        query: Self,
    ) -> &mut Self {
        self.push(
            key,
            Constraint::DoesNotMatchKeyInQuery {
                key_in_query: key_in_query.to_string(),
                query: Box::new(query),
            },
        )
    }

    fn where_matches_query(&mut self, key: &str, query: Self) -> &mut Self {
        self.push(key, Constraint::MatchesQuery(Box::new(query)))
    }

    fn where_does_not_match_query(&mut self, key: &str, query: Self) -> &mut Self {
        self.push(key, Constraint::DoesNotMatchQuery(Box::new(query)))
    }

    fn set_limit(&mut self, limit: i64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    fn set_skip(&mut self, skip: i64) -> &mut Self {
        self.skip = Some(skip);
        self
    }

    fn include(&mut self, key: &str) -> &mut Self {
        self.includes.push(key.to_string());
        self
    }

    fn order_by_ascending(&mut self, key: &str) -> &mut Self {
        self.order = vec![OrderBy::new(key, OrderDirection::Ascending)];
        self
    }

    fn order_by_descending(&mut self, key: &str) -> &mut Self {
        self.order = vec![OrderBy::new(key, OrderDirection::Descending)];
        self
    }

    fn add_ascending_order(&mut self, key: &str) -> &mut Self {
        self.order.push(OrderBy::new(key, OrderDirection::Ascending));
        self
    }

    fn add_descending_order(&mut self, key: &str) -> &mut Self {
        self.order.push(OrderBy::new(key, OrderDirection::Descending));
        self
    }

    fn select_keys(&mut self, keys: Vec<String>) -> &mut Self {
        self.selected_keys = Some(keys);
        self
    }
}
