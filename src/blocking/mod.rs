//! Synchronous wrappers around the channel bridge.
//!
//! The calls below drive the async handlers on a shared current-thread runtime. They
//! must not be called from inside another tokio runtime.

use once_cell::sync::Lazy;
use serde_json::Value as JsonValue;
use tokio::runtime::Runtime;

use crate::bridge::{BridgeResult, MethodCall, QueryBridge, QueryReply};
use crate::store::StoreClient;

static RT: Lazy<Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime")
});

fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    RT.block_on(fut)
}

pub fn query_in_background<S: StoreClient>(
    bridge: &QueryBridge<S>,
    arguments: &JsonValue,
) -> BridgeResult<QueryReply> {
    block_on(bridge.query_in_background(arguments))
}

pub fn handle<S: StoreClient>(
    bridge: &QueryBridge<S>,
    call: &MethodCall,
) -> BridgeResult<JsonValue> {
    block_on(bridge.handle(call))
}
