//! Execution log and its async sink.
//!
//! Every flow run produces one [`ExecutionLogEntry`]. Writing it to durable
//! storage happens off the request path: [`LogSink::push`] only touches an
//! in-memory queue, and a background task drains it into the
//! [`crate::store::DurableStore`]. The queue is bounded; once full, the
//! oldest entry is dropped to make room for the newest rather than applying
//! backpressure to block execution.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::model::BlockExecutionResult;
use crate::store::DurableStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub id: Uuid,
    pub flow_slug: String,
    pub flow_version: i64,
    pub status: ExecutionStatus,
    pub inputs: Value,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub block_results: Vec<BlockExecutionResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Bounded, drop-oldest-on-overflow queue feeding a background writer task.
pub struct LogSink {
    queue: Mutex<VecDeque<ExecutionLogEntry>>,
    notify: Notify,
    capacity: usize,
    dropped: AtomicU64,
}

impl LogSink {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self { queue: Mutex::new(VecDeque::with_capacity(capacity)), notify: Notify::new(), capacity, dropped: AtomicU64::new(0) })
    }

    /// Enqueues `entry`. Never blocks: if the queue is at capacity, the
    /// oldest pending entry is evicted first.
    pub fn push(&self, entry: ExecutionLogEntry) {
        let mut queue = self.queue.lock().expect("lock poisoned");
        if queue.len() >= self.capacity {
            queue.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(entry);
        drop(queue);
        self.notify.notify_one();
    }

    /// Count of entries evicted before a writer got to them.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Spawns the background task that drains the queue into `store`. The
    /// returned handle is only useful for tests/shutdown; the task otherwise
    /// runs for the lifetime of the server.
    pub fn spawn_writer(self: Arc<Self>, store: Arc<dyn DurableStore>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                self.notify.notified().await;
                loop {
                    let next = {
                        let mut queue = self.queue.lock().expect("lock poisoned");
                        queue.pop_front()
                    };
                    match next {
                        Some(entry) => {
                            if let Err(err) = store.insert_execution_log(entry).await {
                                tracing::warn!(error = %err, "failed to persist execution log entry");
                            }
                        }
                        None => break,
                    }
                }
            }
        })
    }
}
