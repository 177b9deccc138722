use std::error::Error;
use std::fmt::{Display, Formatter};

/// Backend error code reported when a JSON payload cannot be understood.
pub const INVALID_JSON: i32 = 107;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreErrorCode {
    ConnectionFailed,
    ObjectNotFound,
    InvalidQuery,
    InvalidJson,
    Timeout,
    InvalidArgument,
    Other(i32),
}

impl StoreErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreErrorCode::ConnectionFailed => "store/connection-failed",
            StoreErrorCode::ObjectNotFound => "store/object-not-found",
            StoreErrorCode::InvalidQuery => "store/invalid-query",
            StoreErrorCode::InvalidJson => "store/invalid-json",
            StoreErrorCode::Timeout => "store/timeout",
            StoreErrorCode::InvalidArgument => "store/invalid-argument",
            StoreErrorCode::Other(_) => "store/other",
        }
    }

    /// Numeric code as reported by the backend.
    pub fn parse_code(&self) -> i32 {
        match self {
            StoreErrorCode::ConnectionFailed => 100,
            StoreErrorCode::ObjectNotFound => 101,
            StoreErrorCode::InvalidQuery => 102,
            StoreErrorCode::InvalidJson => INVALID_JSON,
            StoreErrorCode::Timeout => 124,
            StoreErrorCode::InvalidArgument => -1,
            StoreErrorCode::Other(code) => *code,
        }
    }

    pub fn from_parse_code(code: i32) -> Self {
        match code {
            100 => StoreErrorCode::ConnectionFailed,
            101 => StoreErrorCode::ObjectNotFound,
            102 => StoreErrorCode::InvalidQuery,
            INVALID_JSON => StoreErrorCode::InvalidJson,
            124 => StoreErrorCode::Timeout,
            other => StoreErrorCode::Other(other),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StoreError {
    pub code: StoreErrorCode,
    message: String,
}

impl StoreError {
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
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

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

pub fn invalid_json(message: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorCode::InvalidJson, message)
}

pub fn invalid_argument(message: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorCode::InvalidArgument, message)
}

pub fn connection_failed(message: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorCode::ConnectionFailed, message)
}

pub fn object_not_found(message: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorCode::ObjectNotFound, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes_round_trip_through_known_variants() {
        for code in [100, 101, 102, 107, 124] {
            assert_eq!(StoreErrorCode::from_parse_code(code).parse_code(), code);
        }
        assert_eq!(
            StoreErrorCode::from_parse_code(209),
            StoreErrorCode::Other(209)
        );
    }

    #[test]
    fn display_includes_code() {
        let err = object_not_found("no results");
        assert_eq!(err.to_string(), "no results (store/object-not-found)");
    }
}
