use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::store::error::INVALID_JSON;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryErrorCode {
    MissingClassName,
    InvalidInput,
    UnsupportedOperator,
    InvalidOperand,
}

impl QueryErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryErrorCode::MissingClassName => "query/missing-class-name",
            QueryErrorCode::InvalidInput => "query/invalid-input",
            QueryErrorCode::UnsupportedOperator => "query/unsupported-operator",
            QueryErrorCode::InvalidOperand => "query/invalid-operand",
        }
    }

    /// Backend error code used when the failure is reported over the channel.
    pub fn parse_code(&self) -> i32 {
        INVALID_JSON
    }
}

#[derive(Clone, Debug)]
pub struct QueryError {
    pub code: QueryErrorCode,
    message: String,
}

impl QueryError {
    pub fn new(code: QueryErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for QueryError {}

pub type QueryResult<T> = Result<T, QueryError>;

pub fn missing_class_name() -> QueryError {
    QueryError::new(QueryErrorCode::MissingClassName, "no className found")
}

pub fn invalid_input(message: impl Into<String>) -> QueryError {
    QueryError::new(QueryErrorCode::InvalidInput, message)
}

pub fn unsupported_operator(field: &str, operator: &str) -> QueryError {
    QueryError::new(
        QueryErrorCode::UnsupportedOperator,
        format!("Unsupported operator '{operator}' on field '{field}'"),
    )
}

pub fn invalid_operand(message: impl Into<String>) -> QueryError {
    QueryError::new(QueryErrorCode::InvalidOperand, message)
}
