use std::sync::Arc;

use parse_rs_bridge::query::{CompileOptions, QueryCompiler, QueryErrorCode};
use parse_rs_bridge::store::{
    Constraint, InMemoryStore, OrderBy, OrderDirection, ParseGeoPoint, ParseValue, QueryBuilder,
    RecordedQuery,
};
use serde_json::json;

fn compiler() -> QueryCompiler<InMemoryStore> {
    QueryCompiler::with_json_decoder(Arc::new(InMemoryStore::new()))
}

fn compile(description: serde_json::Value) -> RecordedQuery {
    compiler()
        .compile(&description)
        .expect("compile description")
        .into_query()
}

#[test]
fn mixed_where_clause_compiles_into_rest_parameters() {
    let query = compile(json!({
        "className": "Player",
        "where": {
            "score": {"whereGreaterThanOrEqualTo": 100, "whereLessThan": 500},
            "team": "red",
            "nickname": {"whereExists": true}
        },
        "limit": 20,
        "skip": 40,
        "order": "-score,name",
        "include": "team.captain",
        "fields": "name,score"
    }));

    assert_eq!(
        query.order(),
        &[
            OrderBy::new("score", OrderDirection::Descending),
            OrderBy::new("name", OrderDirection::Ascending),
        ]
    );
    assert_eq!(query.includes(), &["team.captain".to_string()]);
    assert_eq!(
        query.selected_keys(),
        Some(&["name".to_string(), "score".to_string()][..])
    );

    let params = query.to_rest_params(false);
    let lookup = |key: &str| {
        params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
    };
    let where_json: serde_json::Value = serde_json::from_str(&lookup("where").unwrap()).unwrap();
    assert_eq!(where_json["team"], json!("red"));
    assert_eq!(where_json["score"], json!({"$gte": 100, "$lt": 500}));
    assert_eq!(where_json["nickname"], json!({"$exists": true}));
    assert_eq!(lookup("order").as_deref(), Some("-score,name"));
    assert_eq!(lookup("limit").as_deref(), Some("20"));
    assert_eq!(lookup("skip").as_deref(), Some("40"));
}

#[test]
fn geo_operators_round_out_the_table() {
    let point =
        |lat: f64, lon: f64| json!({"__type": "GeoPoint", "latitude": lat, "longitude": lon});
    let query = compile(json!({
        "className": "Venue",
        "where": {
            "location": {"whereNear": point(40.0, -30.0)},
            "area": {"whereWithinPolygon": [point(0.0, 0.0), point(0.0, 1.0), point(1.0, 1.0)]},
            "bounds": {"whereWithinGeoBox": [point(10.0, -10.0), point(-10.0, 10.0)]},
            "home": {"whereWithinRadians": {"point": point(1.0, 2.0), "maxDistance": 0.25}}
        }
    }));

    let geo = |lat, lon| ParseGeoPoint::new(lat, lon).unwrap();
    assert_eq!(
        query.constraints_for("location").collect::<Vec<_>>(),
        vec![&Constraint::Near(geo(40.0, -30.0))]
    );
    assert!(matches!(
        query.constraints_for("area").next(),
        Some(Constraint::WithinPolygon(points)) if points.len() == 3
    ));
    assert_eq!(
        query.constraints_for("bounds").next(),
        Some(&Constraint::WithinGeoBox {
            north_west: geo(10.0, -10.0),
            south_east: geo(-10.0, 10.0),
        })
    );
    assert_eq!(
        query.constraints_for("home").next(),
        Some(&Constraint::WithinRadians {
            point: geo(1.0, 2.0),
            max_distance: 0.25,
        })
    );
}

#[test]
fn key_in_query_nests_a_compiled_sub_query() {
    let query = compile(json!({
        "className": "Post",
        "where": {
            "author": {
                "whereMatchesKeyInQuery": {
                    "keyInQuery": "user",
                    "query": {"className": "Follow", "where": {"from": "me"}, "limit": 5}
                }
            }
        }
    }));

    let Some(Constraint::MatchesKeyInQuery { key_in_query, query: nested }) =
        query.constraints_for("author").next()
    else {
        panic!("expected a key-in-query clause");
    };
    assert_eq!(key_in_query, "user");
    assert_eq!(nested.class_name(), "Follow");
    assert_eq!(nested.limit(), Some(5));
    assert_eq!(
        nested.constraints_for("from").next(),
        Some(&Constraint::Equal(ParseValue::from_string("me")))
    );
}

#[test]
fn unusable_clauses_are_dropped_and_the_rest_survives() {
    let query = compile(json!({
        "className": "Player",
        "where": {
            "name": {"whereSoundsLike": "bob"},
            "tags": {"whereContainedIn": "not-an-array"},
            "area": {"whereWithinPolygon": []},
            "team": {"whereMatchesQuery": {"where": {}}},
            "score": {"whereGreaterThan": 3}
        }
    }));

    assert_eq!(query.constraints().len(), 1);
    assert_eq!(query.constraints()[0].field(), "score");
}

#[test]
fn strict_mode_surfaces_the_first_dropped_clause() {
    let compiler = compiler().with_options(CompileOptions::strict());
    let err = compiler
        .compile(&json!({
            "className": "Player",
            "where": {"name": {"whereSoundsLike": "bob"}}
        }))
        .unwrap_err();
    assert_eq!(err.code, QueryErrorCode::UnsupportedOperator);
}

#[test]
fn missing_class_name_is_a_hard_error() {
    let err = compiler()
        .compile_str("{\"where\": {\"score\": 1}}")
        .unwrap_err();
    assert_eq!(err.code, QueryErrorCode::MissingClassName);
    assert_eq!(err.message(), "no className found");
    assert_eq!(err.code.parse_code(), 107);
}

#[test]
fn zero_pagination_and_non_unit_count_are_ignored() {
    let compiled = compiler()
        .compile(&json!({"className": "Player", "limit": 0, "skip": 0, "count": 2}))
        .unwrap();
    assert!(!compiled.is_count());
    assert_eq!(compiled.query().limit(), None);
    assert_eq!(compiled.query().skip(), None);
    assert_eq!(compiled.query().to_query_string(false), "");
}
