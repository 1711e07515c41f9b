//! Definition Cache contract. `flow-cache` provides the TTL-backed
//! implementation; `flow-core` only needs the shape so the engine can look
//! up a published flow and its blocks without depending on the cache's
//! storage details.

use async_trait::async_trait;
use flow_domain::{BlockDefinition, Flow};
use uuid::Uuid;

use crate::errors::EngineError;

#[async_trait]
pub trait DefinitionCache: Send + Sync {
    async fn get_flow_by_slug(&self, slug: &str) -> Result<Option<Flow>, EngineError>;
    async fn get_block(&self, id: Uuid) -> Result<Option<BlockDefinition>, EngineError>;

    /// Forces the next lookup for this slug to bypass the cache and refill
    /// from durable storage; called after a flow is published/unpublished.
    /// The engine itself never calls this — only the authoring/CRUD layer
    /// does, after a mutation.
    async fn invalidate_flow(&self, slug: &str);

    /// Forces the next lookup for this block id to bypass the cache.
    async fn invalidate_block(&self, id: Uuid);
}
