//! The `DefinitionCache` implementation: an in-process, TTL-backed
//! read-through cache in front of a [`DurableStore`]. Two keyspaces —
//! `flow:slug:<slug>` and `block:<id>` — each default to a 300s TTL.
//!
//! The engine only ever reads through this cache; invalidation is driven
//! entirely by the external authoring/CRUD layer calling
//! [`TtlDefinitionCache::invalidate_flow`] / `invalidate_block` after a
//! mutation. A durable-store error on a cache miss is logged and propagated
//! as-is — there is nothing further to degrade to.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use flow_core::errors::EngineError;
use flow_core::store::DurableStore;
use flow_core::DefinitionCache;
use flow_domain::{BlockDefinition, Flow};
use uuid::Uuid;

/// Default TTL for both keyspaces.
pub const DEFAULT_TTL_SECS: u64 = 300;

struct Entry<T> {
    value: T,
    inserted_at: Instant,
}

pub struct TtlDefinitionCache {
    store: Arc<dyn DurableStore>,
    ttl: Duration,
    flows: DashMap<String, Entry<Flow>>,
    blocks: DashMap<Uuid, Entry<BlockDefinition>>,
}

impl TtlDefinitionCache {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self::with_ttl(store, Duration::from_secs(DEFAULT_TTL_SECS))
    }

    pub fn with_ttl(store: Arc<dyn DurableStore>, ttl: Duration) -> Self {
        Self { store, ttl, flows: DashMap::new(), blocks: DashMap::new() }
    }

    fn fresh<T>(entry: &Entry<T>, ttl: Duration) -> bool {
        entry.inserted_at.elapsed() < ttl
    }
}

#[async_trait]
impl DefinitionCache for TtlDefinitionCache {
    async fn get_flow_by_slug(&self, slug: &str) -> Result<Option<Flow>, EngineError> {
        if let Some(entry) = self.flows.get(slug) {
            if Self::fresh(entry.value(), self.ttl) {
                return Ok(Some(entry.value.clone()));
            }
        }

        match self.store.find_flow_by_slug(slug).await {
            Ok(Some(flow)) => {
                self.flows.insert(slug.to_string(), Entry { value: flow.clone(), inserted_at: Instant::now() });
                Ok(Some(flow))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                tracing::warn!(error = %err, slug, "durable store lookup failed on flow cache miss");
                Err(err)
            }
        }
    }

    async fn get_block(&self, id: Uuid) -> Result<Option<BlockDefinition>, EngineError> {
        if let Some(entry) = self.blocks.get(&id) {
            if Self::fresh(entry.value(), self.ttl) {
                return Ok(Some(entry.value.clone()));
            }
        }

        match self.store.find_block(id).await {
            Ok(Some(block)) => {
                self.blocks.insert(id, Entry { value: block.clone(), inserted_at: Instant::now() });
                Ok(Some(block))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                tracing::warn!(error = %err, block_id = %id, "durable store lookup failed on block cache miss");
                Err(err)
            }
        }
    }

    async fn invalidate_flow(&self, slug: &str) {
        self.flows.remove(slug);
    }

    async fn invalidate_block(&self, id: Uuid) {
        self.blocks.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::store::InMemoryStore;
    use flow_domain::{BlockSource, BlockType, FlowConfig, FlowStatus, HttpMethod};

    fn sample_flow(slug: &str) -> Flow {
        Flow { id: Uuid::new_v4(), slug: slug.to_string(), version: 1, status: FlowStatus::Published, inputs: vec![], outputs: vec![], blocks: vec![], connections: vec![], config: FlowConfig::default(), published_at: None }
    }

    fn sample_block() -> BlockDefinition {
        BlockDefinition { id: Uuid::new_v4(),
                           name: "b".into(),
                           block_type: BlockType::ApiCall,
                           source: BlockSource { operation_id: "op".into(), path: "/x".into(), method: HttpMethod::Get, server_url: None },
                           inputs: vec![],
                           outputs: vec![] }
    }

    #[tokio::test]
    async fn miss_populates_from_store() {
        let store = Arc::new(InMemoryStore::new());
        store.put_flow(sample_flow("echo"));
        let cache = TtlDefinitionCache::new(store);

        let found = cache.get_flow_by_slug("echo").await.unwrap();
        assert!(found.is_some());
        // second lookup is served from cache (no panic if store were dropped)
        let found_again = cache.get_flow_by_slug("echo").await.unwrap();
        assert_eq!(found.unwrap().id, found_again.unwrap().id);
    }

    #[tokio::test]
    async fn invalidate_forces_a_reload() {
        let store = Arc::new(InMemoryStore::new());
        let block = sample_block();
        store.put_block(block.clone());
        let cache = TtlDefinitionCache::new(store);

        cache.get_block(block.id).await.unwrap();
        cache.invalidate_block(block.id).await;
        let reloaded = cache.get_block(block.id).await.unwrap();
        assert!(reloaded.is_some());
    }

    #[tokio::test]
    async fn unknown_slug_is_a_clean_miss() {
        let store = Arc::new(InMemoryStore::new());
        let cache = TtlDefinitionCache::new(store);
        assert!(cache.get_flow_by_slug("nope").await.unwrap().is_none());
    }
}
