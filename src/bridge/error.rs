use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::query::QueryError;
use crate::store::error::INVALID_JSON;
use crate::store::StoreError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeErrorCode {
    InvalidJson,
    NotImplemented,
    Backend(i32),
}

impl BridgeErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeErrorCode::InvalidJson => "bridge/invalid-json",
            BridgeErrorCode::NotImplemented => "bridge/not-implemented",
            BridgeErrorCode::Backend(_) => "bridge/backend",
        }
    }

    /// Error code string sent back over the channel.
    pub fn channel_code(&self) -> String {
        match self {
            BridgeErrorCode::InvalidJson => INVALID_JSON.to_string(),
            BridgeErrorCode::NotImplemented => "notImplemented".to_string(),
            BridgeErrorCode::Backend(code) => code.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BridgeError {
    pub code: BridgeErrorCode,
    message: String,
}

impl BridgeError {
    pub fn new(code: BridgeErrorCode, message: impl Into<String>) -> Self {
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

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for BridgeError {}

impl From<QueryError> for BridgeError {
    fn from(err: QueryError) -> Self {
        BridgeError::new(BridgeErrorCode::InvalidJson, err.message())
    }
}

impl From<StoreError> for BridgeError {
    fn from(err: StoreError) -> Self {
        BridgeError::new(BridgeErrorCode::Backend(err.code.parse_code()), err.message())
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;

pub fn invalid_json(message: impl Into<String>) -> BridgeError {
    BridgeError::new(BridgeErrorCode::InvalidJson, message)
}

pub fn not_implemented(method: &str) -> BridgeError {
    BridgeError::new(
        BridgeErrorCode::NotImplemented,
        format!("method '{method}' is not handled by the query bridge"),
    )
}
