//! # parse-rs-bridge
//!
//! Query compiler and channel bridge for Parse-style backend-as-a-service SDKs.
//!
//! A host application describes a query as JSON (class, `where` constraints, ordering,
//! pagination, projection). [`query::QueryCompiler`] turns that description into a
//! query built through any [`store::StoreClient`], and [`bridge::QueryBridge`] runs it
//! and encodes the reply for the message channel.
//!
//! ## Modules
//!
//! - [`query`]: filter descriptions, the operator table and the compiler.
//! - [`store`]: the store client traits, the value model, the tagged JSON codec, a
//!   recording query and an in-memory store.
//! - [`bridge`]: the `queryInBackground` channel handler.
//! - `blocking`: synchronous wrappers over the bridge (feature `blocking`, on by default).
//!
//! ## Quick Start Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use parse_rs_bridge::bridge::{QueryBridge, QueryReply};
//! use parse_rs_bridge::query::QueryCompiler;
//! use parse_rs_bridge::store::{InMemoryStore, ParseObject, ParseValue};
//! use serde_json::json;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryStore::new();
//!     store.insert(
//!         ParseObject::new("Player")
//!             .with_object_id("p1")
//!             .with_field("score", ParseValue::from_integer(42)),
//!     );
//!
//!     let bridge = QueryBridge::new(QueryCompiler::with_json_decoder(Arc::new(store)));
//!     let reply = bridge
//!         .query_in_background(&json!({
//!             "className": "Player",
//!             "where": {"score": {"whereGreaterThan": 10}},
//!             "count": 1
//!         }))
//!         .await?;
//!
//!     assert_eq!(reply, QueryReply::Count(1));
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod query;
pub mod store;

#[cfg(feature = "blocking")]
pub mod blocking;

#[cfg(test)]
pub mod test_support;
