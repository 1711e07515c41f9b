//! Durable storage contract. `flow-persistence` provides the Postgres-backed
//! implementation; the in-memory one here backs unit/integration tests and
//! `flow-cli` so neither needs a database to exercise the engine.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use flow_domain::{BlockDefinition, Flow};
use uuid::Uuid;

use crate::errors::EngineError;
use crate::log::ExecutionLogEntry;

#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn find_flow_by_slug(&self, slug: &str) -> Result<Option<Flow>, EngineError>;
    async fn find_block(&self, id: Uuid) -> Result<Option<BlockDefinition>, EngineError>;
    async fn insert_execution_log(&self, entry: ExecutionLogEntry) -> Result<(), EngineError>;

    /// Most recent `limit` log entries for `slug`, most recent first
    /// (`GET /api/execute/<slug>/logs`).
    async fn recent_logs(&self, slug: &str, limit: i64) -> Result<Vec<ExecutionLogEntry>, EngineError>;
}

#[derive(Default)]
pub struct InMemoryStore {
    flows: RwLock<HashMap<String, Flow>>,
    blocks: RwLock<HashMap<Uuid, BlockDefinition>>,
    logs: RwLock<Vec<ExecutionLogEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_flow(&self, flow: Flow) {
        self.flows.write().expect("lock poisoned").insert(flow.slug.clone(), flow);
    }

    pub fn put_block(&self, block: BlockDefinition) {
        self.blocks.write().expect("lock poisoned").insert(block.id, block);
    }

    pub fn logs_snapshot(&self) -> Vec<ExecutionLogEntry> {
        self.logs.read().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl DurableStore for InMemoryStore {
    async fn find_flow_by_slug(&self, slug: &str) -> Result<Option<Flow>, EngineError> {
        Ok(self.flows.read().expect("lock poisoned").get(slug).cloned())
    }

    async fn find_block(&self, id: Uuid) -> Result<Option<BlockDefinition>, EngineError> {
        Ok(self.blocks.read().expect("lock poisoned").get(&id).cloned())
    }

    async fn insert_execution_log(&self, entry: ExecutionLogEntry) -> Result<(), EngineError> {
        self.logs.write().expect("lock poisoned").push(entry);
        Ok(())
    }

    async fn recent_logs(&self, slug: &str, limit: i64) -> Result<Vec<ExecutionLogEntry>, EngineError> {
        let mut matching: Vec<ExecutionLogEntry> =
            self.logs.read().expect("lock poisoned").iter().filter(|e| e.flow_slug == slug).cloned().collect();
        matching.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        matching.truncate(limit.max(0) as usize);
        Ok(matching)
    }
}
