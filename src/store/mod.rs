//! # Store client capability
//!
//! Everything the query compiler needs from a backend SDK: the [`StoreClient`] and
//! [`QueryBuilder`] traits, the [`LeafDecoder`] used for operand conversion, and the
//! value model flowing through them.
//!
//! Two implementations ship with the crate:
//!
//! - [`RecordedQuery`] keeps every clause as data and can render itself as REST
//!   query parameters.
//! - [`InMemoryStore`] serves seeded rows for tests and demos.
//!
//! ## Example
//!
//! ```
//! use parse_rs_bridge::store::{JsonDecoder, LeafDecoder};
//! use serde_json::json;
//!
//! let decoder = JsonDecoder::new();
//! let value = decoder
//!     .decode(&json!({"__type": "GeoPoint", "latitude": 40.0, "longitude": -30.0}))
//!     .unwrap();
//! assert_eq!(value.as_geo_point().unwrap().latitude(), 40.0);
//! ```

mod client;
pub mod codec;
pub mod error;
mod geo_point;
mod in_memory;
mod object;
mod recorded;
mod value;

pub use client::{LeafDecoder, QueryBuilder, StoreClient};
pub use codec::{encode_value, JsonDecoder};
pub use error::{StoreError, StoreErrorCode, StoreResult};
pub use geo_point::ParseGeoPoint;
pub use in_memory::InMemoryStore;
pub use object::ParseObject;
pub use recorded::{Constraint, FieldConstraint, OrderBy, OrderDirection, RecordedQuery};
pub use value::{ParseFile, ParsePointer, ParseValue, ValueKind};
