//! # Query compiler
//!
//! Turns a declarative, JSON-shaped filter description into a query built through a
//! [`StoreClient`](crate::store::StoreClient).
//!
//! A description names its class, a `where` mapping, and optional pagination, ordering
//! and projection:
//!
//! ```json
//! {
//!   "className": "Player",
//!   "where": {
//!     "name": "bob",
//!     "age": {"whereGreaterThan": 5, "whereLessThan": 10}
//!   },
//!   "order": "age,-score",
//!   "include": "team",
//!   "limit": 20,
//!   "count": 1
//! }
//! ```
//!
//! A `where` entry is either a value compared for equality (scalars, arrays and
//! `__type`-tagged objects) or a mapping from operator names to operands; see
//! [`WhereOperator`] for the vocabulary.
//!
//! Only two failures abort compilation: a description that is not an object
//! ([`QueryErrorCode::InvalidInput`]) and a missing class name
//! ([`QueryErrorCode::MissingClassName`]). Unknown operators, mismatched operands and
//! failing sub-queries drop the affected clause and are logged; enable
//! [`CompileOptions::strict`] to turn them into errors instead.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use parse_rs_bridge::query::QueryCompiler;
//! use parse_rs_bridge::store::InMemoryStore;
//! use serde_json::json;
//!
//! let compiler = QueryCompiler::with_json_decoder(Arc::new(InMemoryStore::new()));
//! let compiled = compiler
//!     .compile(&json!({
//!         "className": "Player",
//!         "where": {"age": {"whereGreaterThan": 5, "whereLessThan": 10}},
//!         "order": "-score"
//!     }))
//!     .unwrap();
//!
//! assert!(!compiled.is_count());
//! assert_eq!(compiled.query().constraints_for("age").count(), 2);
//! ```

mod compiler;
mod description;
pub mod error;
mod operator;
mod options;

pub use compiler::{CompiledQuery, QueryCompiler};
pub use description::{FilterDescription, OrderKey};
pub use error::{QueryError, QueryErrorCode, QueryResult};
pub use operator::{OperandShape, WhereOperator};
pub use options::{CompileOptions, DEFAULT_MAX_SUBQUERY_DEPTH};
