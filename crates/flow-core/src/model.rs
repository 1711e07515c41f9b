//! Runtime model shared by the planner, mapping resolver, dispatcher and
//! projector: the state threaded through a single flow execution, and the
//! result each block instance produces.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Accumulates the caller's validated flow inputs plus the projected outputs
/// of every block instance that has completed so far. Mapping resolution
/// reads from this; nothing outside the engine mutates it mid-run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub flow_inputs: HashMap<String, Value>,
    pub block_outputs: HashMap<String, HashMap<String, Value>>,
}

impl ExecutionContext {
    pub fn new(flow_inputs: HashMap<String, Value>) -> Self {
        Self { flow_inputs, block_outputs: HashMap::new() }
    }

    pub fn flow_input(&self, name: &str) -> Option<&Value> {
        self.flow_inputs.get(name)
    }

    pub fn block_output(&self, block_instance_id: &str, output_name: &str) -> Option<&Value> {
        self.block_outputs.get(block_instance_id).and_then(|o| o.get(output_name))
    }

    pub fn record_block_outputs(&mut self, block_instance_id: &str, outputs: HashMap<String, Value>) {
        self.block_outputs.insert(block_instance_id.to_string(), outputs);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStatus {
    Success,
    Failed,
    Skipped,
}

/// The raw upstream response (status code, body, headers), recorded
/// regardless of whether the call ended up successful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawResponse {
    pub status_code: u16,
    pub body: Value,
    pub headers: HashMap<String, String>,
}

/// What a single block instance produced (or failed to produce) during one
/// execution. `skipped` is used when an upstream dependency failed and the
/// flow's error handling is `stop`, so downstream blocks never ran at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockExecutionResult {
    pub block_instance_id: String,
    pub status: BlockStatus,
    pub outputs: HashMap<String, Value>,
    pub raw: Option<RawResponse>,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub attempt: u32,
}

impl BlockExecutionResult {
    pub fn skipped(block_instance_id: &str, reason: &str) -> Self {
        Self { block_instance_id: block_instance_id.to_string(),
               status: BlockStatus::Skipped,
               outputs: HashMap::new(),
               raw: None,
               error: Some(reason.to_string()),
               duration_ms: 0,
               attempt: 0 }
    }
}
