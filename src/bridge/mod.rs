//! # Channel bridge
//!
//! Handles query calls arriving over a host application's message channel. Arguments
//! come in as JSON text or as a key-value map; replies go back as a JSON array string
//! of rows, or as a bare integer when the description asks for a count.
//!
//! Failures carry a channel code: `107` for undecodable arguments or a missing class
//! name, the backend's own code for store failures.

mod api;
pub mod error;

pub use api::{parse_arguments, MethodCall, QueryBridge, QueryReply, QUERY_IN_BACKGROUND};
pub use error::{BridgeError, BridgeErrorCode, BridgeResult};
