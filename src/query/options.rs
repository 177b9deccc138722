//! Compiler configuration.

use crate::query::error::{invalid_input, QueryResult};

/// Default nesting limit for sub-queries.
pub const DEFAULT_MAX_SUBQUERY_DEPTH: usize = 16;

/// Options controlling how lenient the compiler is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    strict: bool,
    max_subquery_depth: usize,
}

impl CompileOptions {
    /// Creates options after validating the depth limit.
    pub fn new(strict: bool, max_subquery_depth: usize) -> QueryResult<Self> {
        validate_max_subquery_depth(max_subquery_depth)?;
        Ok(Self {
            strict,
            max_subquery_depth,
        })
    }

    /// Options that turn dropped clauses into errors.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_max_subquery_depth(mut self, depth: usize) -> QueryResult<Self> {
        validate_max_subquery_depth(depth)?;
        self.max_subquery_depth = depth;
        Ok(self)
    }

    /// Whether unknown operators, mismatched operands and failing sub-queries abort
    /// compilation instead of being skipped.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn max_subquery_depth(&self) -> usize {
        self.max_subquery_depth
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_subquery_depth: DEFAULT_MAX_SUBQUERY_DEPTH,
        }
    }
}

fn validate_max_subquery_depth(depth: usize) -> QueryResult<()> {
    if depth == 0 {
        return Err(invalid_input("max_subquery_depth must be greater than zero"));
    }
    Ok(())
}
