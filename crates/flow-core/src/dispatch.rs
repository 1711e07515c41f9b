//! Block Dispatcher contract. The engine depends only on this trait;
//! the concrete HTTP implementation lives in `flow-dispatch` so `flow-core`
//! never needs a network client.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use flow_domain::BlockDefinition;
use serde_json::Value;

use crate::errors::EngineError;

/// Resolved params and the timing/retry policy for one block instance call.
#[derive(Debug, Clone)]
pub struct DispatchRequest<'a> {
    pub block: &'a BlockDefinition,
    pub params: HashMap<String, Value>,
    pub timeout: Duration,
    pub retry_count: u32,
}

/// The raw upstream response, before output projection is applied. Returned
/// on `Ok` for any completed HTTP round-trip, success or not — only
/// transport-level failures (connect error, malformed response) are `Err`.
#[derive(Debug, Clone)]
pub struct DispatchResponse {
    pub status: u16,
    pub body: Value,
    pub headers: HashMap<String, String>,
}

#[async_trait]
pub trait BlockDispatcher: Send + Sync {
    async fn dispatch(&self, request: DispatchRequest<'_>) -> Result<DispatchResponse, EngineError>;
}
