use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Operators accepted inside a field's constraint mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WhereOperator {
    LessThan,
    GreaterThan,
    LessThanOrEqualTo,
    GreaterThanOrEqualTo,
    NotEqualTo,
    ContainedIn,
    NotContainedIn,
    ContainsAll,
    FullText,
    Contains,
    StartsWith,
    EndsWith,
    Exists,
    DoesNotExist,
    Matches,
    Near,
    WithinRadians,
    WithinGeoBox,
    WithinPolygon,
    PolygonContains,
    MatchesKeyInQuery,
    DoesNotMatchKeyInQuery,
    MatchesQuery,
    DoesNotMatchQuery,
}

/// Shape an operand must have for its operator to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandShape {
    /// Any value accepted by the leaf decoder.
    Leaf,
    /// A JSON array, decoded element by element.
    Array,
    /// A JSON string.
    String,
    /// Anything; the operand is not read.
    Ignored,
    /// `{regex, modifiers?}`
    Regex,
    /// A tagged geo point.
    GeoPoint,
    /// `{point, maxDistance}`
    GeoRadius,
    /// Exactly two tagged geo points: north-west then south-east.
    GeoBox,
    /// Three or more tagged geo points.
    GeoPolygon,
    /// `{keyInQuery, query}`
    KeyInQuery,
    /// A nested filter description.
    SubQuery,
}

impl WhereOperator {
    pub const ALL: [WhereOperator; 24] = [
        WhereOperator::LessThan,
        WhereOperator::GreaterThan,
        WhereOperator::LessThanOrEqualTo,
        WhereOperator::GreaterThanOrEqualTo,
        WhereOperator::NotEqualTo,
        WhereOperator::ContainedIn,
        WhereOperator::NotContainedIn,
        WhereOperator::ContainsAll,
        WhereOperator::FullText,
        WhereOperator::Contains,
        WhereOperator::StartsWith,
        WhereOperator::EndsWith,
        WhereOperator::Exists,
        WhereOperator::DoesNotExist,
        WhereOperator::Matches,
        WhereOperator::Near,
        WhereOperator::WithinRadians,
        WhereOperator::WithinGeoBox,
        WhereOperator::WithinPolygon,
        WhereOperator::PolygonContains,
        WhereOperator::MatchesKeyInQuery,
        WhereOperator::DoesNotMatchKeyInQuery,
        WhereOperator::MatchesQuery,
        WhereOperator::DoesNotMatchQuery,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WhereOperator::LessThan => "whereLessThan",
            WhereOperator::GreaterThan => "whereGreaterThan",
            WhereOperator::LessThanOrEqualTo => "whereLessThanOrEqualTo",
            WhereOperator::GreaterThanOrEqualTo => "whereGreaterThanOrEqualTo",
            WhereOperator::NotEqualTo => "whereNotEqualTo",
            WhereOperator::ContainedIn => "whereContainedIn",
            WhereOperator::NotContainedIn => "whereNotContainedIn",
            WhereOperator::ContainsAll => "whereContainsAll",
            WhereOperator::FullText => "whereFullText",
            WhereOperator::Contains => "whereContains",
            WhereOperator::StartsWith => "whereStartsWith",
            WhereOperator::EndsWith => "whereEndsWith",
            WhereOperator::Exists => "whereExists",
            WhereOperator::DoesNotExist => "whereDoesNotExist",
            WhereOperator::Matches => "whereMatches",
            WhereOperator::Near => "whereNear",
            WhereOperator::WithinRadians => "whereWithinRadians",
            WhereOperator::WithinGeoBox => "whereWithinGeoBox",
            WhereOperator::WithinPolygon => "whereWithinPolygon",
            WhereOperator::PolygonContains => "wherePolygonContains",
            WhereOperator::MatchesKeyInQuery => "whereMatchesKeyInQuery",
            WhereOperator::DoesNotMatchKeyInQuery => "whereDoesNotMatchKeyInQuery",
            WhereOperator::MatchesQuery => "whereMatchesQuery",
            WhereOperator::DoesNotMatchQuery => "whereDoesNotMatchQuery",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        OPERATORS_BY_NAME.get(name).copied()
    }

    pub fn operand_shape(self) -> OperandShape {
        match self {
            WhereOperator::LessThan
            | WhereOperator::GreaterThan
            | WhereOperator::LessThanOrEqualTo
            | WhereOperator::GreaterThanOrEqualTo
            | WhereOperator::NotEqualTo => OperandShape::Leaf,
            WhereOperator::ContainedIn
            | WhereOperator::NotContainedIn
            | WhereOperator::ContainsAll => OperandShape::Array,
            WhereOperator::FullText
            | WhereOperator::Contains
            | WhereOperator::StartsWith
            | WhereOperator::EndsWith => OperandShape::String,
            WhereOperator::Exists | WhereOperator::DoesNotExist => OperandShape::Ignored,
            WhereOperator::Matches => OperandShape::Regex,
            WhereOperator::Near | WhereOperator::PolygonContains => OperandShape::GeoPoint,
            WhereOperator::WithinRadians => OperandShape::GeoRadius,
            WhereOperator::WithinGeoBox => OperandShape::GeoBox,
            WhereOperator::WithinPolygon => OperandShape::GeoPolygon,
            WhereOperator::MatchesKeyInQuery | WhereOperator::DoesNotMatchKeyInQuery => {
                OperandShape::KeyInQuery
            }
            WhereOperator::MatchesQuery | WhereOperator::DoesNotMatchQuery => {
                OperandShape::SubQuery
            }
        }
    }
}

static OPERATORS_BY_NAME: Lazy<HashMap<&'static str, WhereOperator>> = Lazy::new(|| {
    WhereOperator::ALL
        .iter()
        .map(|operator| (operator.name(), *operator))
        .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operator_is_reachable_by_name() {
        for operator in WhereOperator::ALL {
            assert_eq!(WhereOperator::from_name(operator.name()), Some(operator));
        }
        assert_eq!(OPERATORS_BY_NAME.len(), WhereOperator::ALL.len());
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        assert_eq!(WhereOperator::from_name("whereEqualTo"), None);
        assert_eq!(WhereOperator::from_name("wherelessthan"), None);
    }

    #[test]
    fn operand_shapes() {
        assert_eq!(WhereOperator::LessThan.operand_shape(), OperandShape::Leaf);
        assert_eq!(WhereOperator::ContainedIn.operand_shape(), OperandShape::Array);
        assert_eq!(WhereOperator::Matches.operand_shape(), OperandShape::Regex);
        assert_eq!(
            WhereOperator::PolygonContains.operand_shape(),
            OperandShape::GeoPoint
        );
        assert_eq!(
            WhereOperator::DoesNotMatchQuery.operand_shape(),
            OperandShape::SubQuery
        );
    }
}
