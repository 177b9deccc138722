use std::sync::Arc;

use log::Level;
use serde_json::{Map, Value as JsonValue};

use crate::query::description::FilterDescription;
use crate::query::error::{
    invalid_operand, missing_class_name, unsupported_operator, QueryError, QueryResult,
};
use crate::query::operator::{OperandShape, WhereOperator};
use crate::query::options::CompileOptions;
use crate::store::codec::KEY_TYPE;
use crate::store::{
    JsonDecoder, LeafDecoder, ParseGeoPoint, ParseValue, QueryBuilder, StoreClient, ValueKind,
};

/// A query ready to hand to the store client, plus whether a count was requested.
#[derive(Clone, Debug)]
pub struct CompiledQuery<Q> {
    query: Q,
    count: bool,
}

impl<Q> CompiledQuery<Q> {
    pub fn query(&self) -> &Q {
        &self.query
    }

    /// True when the caller asked for a row count instead of rows.
    pub fn is_count(&self) -> bool {
        self.count
    }

    pub fn into_query(self) -> Q {
        self.query
    }

    pub fn into_parts(self) -> (Q, bool) {
        (self.query, self.count)
    }
}

/// Translates filter descriptions into store-client queries.
///
/// Malformed individual clauses are skipped unless the options ask for strict
/// compilation; only a non-object description or a missing class name fail outright.
pub struct QueryCompiler<S: StoreClient> {
    store: Arc<S>,
    decoder: Arc<dyn LeafDecoder>,
    options: CompileOptions,
}

impl<S: StoreClient> Clone for QueryCompiler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            decoder: Arc::clone(&self.decoder),
            options: self.options.clone(),
        }
    }
}

/// Operand after shape checking, ready for the builder call.
enum Operand<Q> {
    Value(ParseValue),
    Values(Vec<ParseValue>),
    Text(String),
    Unused,
    Regex {
        regex: String,
        modifiers: Option<String>,
    },
    Point(ParseGeoPoint),
    Radius {
        point: ParseGeoPoint,
        max_distance: f64,
    },
    Box {
        north_west: ParseGeoPoint,
        south_east: ParseGeoPoint,
    },
    Polygon(Vec<ParseGeoPoint>),
    KeyInQuery {
        key: String,
        query: Q,
    },
    Query(Q),
}

impl<S: StoreClient> QueryCompiler<S> {
    pub fn new(store: Arc<S>, decoder: Arc<dyn LeafDecoder>) -> Self {
        Self {
            store,
            decoder,
            options: CompileOptions::default(),
        }
    }

    /// Compiler using the tagged JSON decoder.
    pub fn with_json_decoder(store: Arc<S>) -> Self {
        Self::new(store, Arc::new(JsonDecoder::new()))
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn compile(&self, description: &JsonValue) -> QueryResult<CompiledQuery<S::Query>> {
        let description = FilterDescription::from_value(description)?;
        self.compile_description(&description)
    }

    pub fn compile_str(&self, description: &str) -> QueryResult<CompiledQuery<S::Query>> {
        let description = FilterDescription::from_json_str(description)?;
        self.compile_description(&description)
    }

    pub fn compile_description(
        &self,
        description: &FilterDescription,
    ) -> QueryResult<CompiledQuery<S::Query>> {
        self.build(description, 0)
    }

    fn build(
        &self,
        description: &FilterDescription,
        depth: usize,
    ) -> QueryResult<CompiledQuery<S::Query>> {
        let class_name = description.class_name().ok_or_else(missing_class_name)?;
        let mut query = self.store.new_query(class_name);

        for (field, constraint) in description.where_clause() {
            self.apply_constraint(&mut query, field, constraint, depth)?;
        }

        if let Some(limit) = description.limit() {
            query.set_limit(limit);
        }
        if let Some(skip) = description.skip() {
            query.set_skip(skip);
        }

        match description.include_paths().as_slice() {
            [] => {}
            [path] => {
                query.include(path);
            }
            paths => {
                for path in paths {
                    query.include(path);
                }
            }
        }

        match description.order_keys().as_slice() {
            [] => {}
            [key] => {
                if key.descending {
                    query.order_by_descending(key.field);
                } else {
                    query.order_by_ascending(key.field);
                }
            }
            keys => {
                for key in keys {
                    if key.descending {
                        query.add_descending_order(key.field);
                    } else {
                        query.add_ascending_order(key.field);
                    }
                }
            }
        }

        let selected = description.selected_fields();
        if !selected.is_empty() {
            query.select_keys(selected.into_iter().map(str::to_string).collect());
        }

        log::debug!(
            "compiled query on '{class_name}' with {} constrained field(s)",
            description.where_clause().len()
        );

        Ok(CompiledQuery {
            query,
            count: description.count(),
        })
    }

    fn apply_constraint(
        &self,
        query: &mut S::Query,
        field: &str,
        constraint: &JsonValue,
        depth: usize,
    ) -> QueryResult<()> {
        match constraint {
            JsonValue::Object(clause) if !clause.contains_key(KEY_TYPE) => {
                for (name, operand) in clause {
                    self.apply_operator(query, field, name, operand, depth)?;
                }
                Ok(())
            }
            _ => match self.decode(constraint) {
                Ok(value) => {
                    query.where_equal_to(field, value);
                    Ok(())
                }
                Err(err) => self.drop_clause(Level::Debug, field, "equality", err),
            },
        }
    }

    fn apply_operator(
        &self,
        query: &mut S::Query,
        field: &str,
        name: &str,
        operand: &JsonValue,
        depth: usize,
    ) -> QueryResult<()> {
        let Some(operator) = WhereOperator::from_name(name) else {
            return self.drop_clause(Level::Debug, field, name, unsupported_operator(field, name));
        };

        let shape = operator.operand_shape();
        let result = self
            .read_operand(shape, operand, depth)
            .and_then(|operand| apply_operand(query, field, operator, operand));
        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                let level = match shape {
                    OperandShape::KeyInQuery | OperandShape::SubQuery => Level::Warn,
                    _ => Level::Debug,
                };
                self.drop_clause(level, field, name, err)
            }
        }
    }

    fn drop_clause(
        &self,
        level: Level,
        field: &str,
        operator: &str,
        error: QueryError,
    ) -> QueryResult<()> {
        if self.options.is_strict() {
            return Err(error);
        }
        log::log!(level, "dropping '{operator}' clause on '{field}': {error}");
        Ok(())
    }

    fn read_operand(
        &self,
        shape: OperandShape,
        operand: &JsonValue,
        depth: usize,
    ) -> QueryResult<Operand<S::Query>> {
        match shape {
            OperandShape::Leaf => self.decode(operand).map(Operand::Value),
            OperandShape::Array => match self.decode(operand)?.into_kind() {
                ValueKind::Array(values) => Ok(Operand::Values(values)),
                _ => Err(invalid_operand("expected an array operand")),
            },
            OperandShape::String => match self.decode(operand)?.into_kind() {
                ValueKind::String(text) => Ok(Operand::Text(text)),
                _ => Err(invalid_operand("expected a string operand")),
            },
            OperandShape::Ignored => Ok(Operand::Unused),
            OperandShape::Regex => {
                let args = expect_object(operand)?;
                let regex = args
                    .get("regex")
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| invalid_operand("whereMatches requires a string 'regex'"))?;
                let modifiers = args
                    .get("modifiers")
                    .and_then(JsonValue::as_str)
                    .filter(|modifiers| !modifiers.is_empty())
                    .map(str::to_string);
                Ok(Operand::Regex {
                    regex: regex.to_string(),
                    modifiers,
                })
            }
            OperandShape::GeoPoint => self.decode_geo_point(operand).map(Operand::Point),
            OperandShape::GeoRadius => {
                let args = expect_object(operand)?;
                let point = args
                    .get("point")
                    .ok_or_else(|| invalid_operand("missing 'point'"))
                    .and_then(|point| self.decode_geo_point(point))?;
                let max_distance = args
                    .get("maxDistance")
                    .and_then(JsonValue::as_f64)
                    .ok_or_else(|| invalid_operand("missing numeric 'maxDistance'"))?;
                Ok(Operand::Radius {
                    point,
                    max_distance,
                })
            }
            OperandShape::GeoBox => match self.decode_geo_points(operand)?.as_slice() {
                [north_west, south_east] => Ok(Operand::Box {
                    north_west: *north_west,
                    south_east: *south_east,
                }),
                points => Err(invalid_operand(format!(
                    "a geo box needs exactly 2 corners, got {}",
                    points.len()
                ))),
            },
            OperandShape::GeoPolygon => {
                let points = self.decode_geo_points(operand)?;
                if points.len() < 3 {
                    return Err(invalid_operand(format!(
                        "a polygon needs at least 3 points, got {}",
                        points.len()
                    )));
                }
                Ok(Operand::Polygon(points))
            }
            OperandShape::KeyInQuery => {
                let args = expect_object(operand)?;
                let key = args
                    .get("keyInQuery")
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| invalid_operand("missing string 'keyInQuery'"))?;
                let nested = args
                    .get("query")
                    .ok_or_else(|| invalid_operand("missing 'query'"))?;
                let query = self.compile_sub_query(nested, depth)?;
                Ok(Operand::KeyInQuery {
                    key: key.to_string(),
                    query,
                })
            }
            OperandShape::SubQuery => self.compile_sub_query(operand, depth).map(Operand::Query),
        }
    }

    fn compile_sub_query(&self, operand: &JsonValue, depth: usize) -> QueryResult<S::Query> {
        let depth = depth + 1;
        if depth > self.options.max_subquery_depth() {
            return Err(invalid_operand(format!(
                "sub-queries nested deeper than {} levels",
                self.options.max_subquery_depth()
            )));
        }
        FilterDescription::from_value(operand)
            .and_then(|description| self.build(&description, depth))
            .map(CompiledQuery::into_query)
            .map_err(|err| invalid_operand(format!("sub-query failed: {err}")))
    }

    fn decode(&self, value: &JsonValue) -> QueryResult<ParseValue> {
        self.decoder
            .decode(value)
            .map_err(|err| invalid_operand(format!("undecodable operand: {err}")))
    }

    fn decode_geo_point(&self, value: &JsonValue) -> QueryResult<ParseGeoPoint> {
        self.decode(value)?
            .as_geo_point()
            .ok_or_else(|| invalid_operand("expected a GeoPoint"))
    }

    fn decode_geo_points(&self, value: &JsonValue) -> QueryResult<Vec<ParseGeoPoint>> {
        value
            .as_array()
            .ok_or_else(|| invalid_operand("expected an array of GeoPoints"))?
            .iter()
            .map(|point| self.decode_geo_point(point))
            .collect()
    }
}

fn expect_object(value: &JsonValue) -> QueryResult<&Map<String, JsonValue>> {
    value
        .as_object()
        .ok_or_else(|| invalid_operand("expected an object operand"))
}

fn apply_operand<Q: QueryBuilder>(
    query: &mut Q,
    field: &str,
    operator: WhereOperator,
    operand: Operand<Q>,
) -> QueryResult<()> {
    use WhereOperator as Op;

    match (operator, operand) {
        (Op::LessThan, Operand::Value(value)) => query.where_less_than(field, value),
        (Op::GreaterThan, Operand::Value(value)) => query.where_greater_than(field, value),
        (Op::LessThanOrEqualTo, Operand::Value(value)) => {
            query.where_less_than_or_equal_to(field, value)
        }
        (Op::GreaterThanOrEqualTo, Operand::Value(value)) => {
            query.where_greater_than_or_equal_to(field, value)
        }
        (Op::NotEqualTo, Operand::Value(value)) => query.where_not_equal_to(field, value),
        (Op::ContainedIn, Operand::Values(values)) => query.where_contained_in(field, values),
        (Op::NotContainedIn, Operand::Values(values)) => {
            query.where_not_contained_in(field, values)
        }
        (Op::ContainsAll, Operand::Values(values)) => query.where_contains_all(field, values),
        (Op::FullText, Operand::Text(text)) => query.where_full_text(field, &text),
        (Op::Contains, Operand::Text(text)) => query.where_contains(field, &text),
        (Op::StartsWith, Operand::Text(text)) => query.where_starts_with(field, &text),
        (Op::EndsWith, Operand::Text(text)) => query.where_ends_with(field, &text),
        (Op::Exists, Operand::Unused) => query.where_exists(field),
        (Op::DoesNotExist, Operand::Unused) => query.where_does_not_exist(field),
        (Op::Matches, Operand::Regex { regex, modifiers }) => {
            query.where_matches(field, &regex, modifiers.as_deref())
        }
        (Op::Near, Operand::Point(point)) => query.where_near(field, point),
        (
            Op::WithinRadians,
            Operand::Radius {
                point,
                max_distance,
            },
        ) => query.where_within_radians(field, point, max_distance),
        (
            Op::WithinGeoBox,
            Operand::Box {
                north_west,
                south_east,
            },
        ) => query.where_within_geo_box(field, north_west, south_east),
        (Op::WithinPolygon, Operand::Polygon(points)) => query.where_within_polygon(field, points),
        (Op::PolygonContains, Operand::Point(point)) => query.where_polygon_contains(field, point),
        (Op::MatchesKeyInQuery, Operand::KeyInQuery { key, query: nested }) => {
            query.where_matches_key_in_query(field, &key, nested)
        }
        (Op::DoesNotMatchKeyInQuery, Operand::KeyInQuery { key, query: nested }) => {
            query.where_does_not_match_key_in_query(field, &key, nested)
        }
        (Op::MatchesQuery, Operand::Query(nested)) => query.where_matches_query(field, nested),
        (Op::DoesNotMatchQuery, Operand::Query(nested)) => {
            query.where_does_not_match_query(field, nested)
        }
        (operator, _) => {
            return Err(invalid_operand(format!(
                "operand shape does not fit {}",
                operator.name()
            )))
        }
    };
    Ok(())
}
