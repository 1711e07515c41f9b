//! The orchestrator: cache lookup, validation, planning, mapping
//! resolution, dispatch and projection wired together into one flow
//! execution, end to end.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use flow_domain::Flow;
use serde_json::Value;
use uuid::Uuid;

use crate::cache::DefinitionCache;
use crate::constants::{DEFAULT_BLOCK_TIMEOUT_MS, DEFAULT_FLOW_TIMEOUT_MS, DEFAULT_RETRY_COUNT, RETRY_BASE_MS, RETRY_CAP_MS};
use crate::dispatch::{BlockDispatcher, DispatchRequest};
use crate::errors::EngineError;
use crate::log::{ExecutionLogEntry, ExecutionStatus, LogSink};
use crate::model::{BlockExecutionResult, BlockStatus, ExecutionContext, RawResponse};
use crate::planner::{self, ExecutionPlan};
use crate::projector;
use crate::resolver;
use crate::validator;

pub struct FlowExecutionEngine {
    cache: Arc<dyn DefinitionCache>,
    dispatcher: Arc<dyn BlockDispatcher>,
    log_sink: Arc<LogSink>,
}

/// What a caller gets back from a completed execution. Execution only
/// reaches this type when every block either succeeded or failed with
/// `continueOnError` set — any other block failure aborts the plan and
/// surfaces as an `Err(EngineError::BlockFailed)` instead.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub output: Value,
    pub status: ExecutionStatus,
    pub block_results: Vec<BlockExecutionResult>,
}

impl FlowExecutionEngine {
    pub fn new(cache: Arc<dyn DefinitionCache>, dispatcher: Arc<dyn BlockDispatcher>, log_sink: Arc<LogSink>) -> Self {
        Self { cache, dispatcher, log_sink }
    }

    /// Runs `slug` for a real caller. Logs the execution regardless of
    /// outcome.
    pub async fn execute(&self, slug: &str, raw_inputs: HashMap<String, Value>) -> Result<ExecutionOutcome, EngineError> {
        self.execute_inner(slug, raw_inputs, false).await
    }

    /// Runs `slug` in test mode: every block dispatch is short-circuited to
    /// a synthetic success and no log entry is written.
    pub async fn execute_test(&self, slug: &str, raw_inputs: HashMap<String, Value>) -> Result<ExecutionOutcome, EngineError> {
        self.execute_inner(slug, raw_inputs, true).await
    }

    async fn execute_inner(&self, slug: &str, raw_inputs: HashMap<String, Value>, is_test: bool) -> Result<ExecutionOutcome, EngineError> {
        let started_at = Utc::now();
        let start = Instant::now();

        let flow = self.cache
                        .get_flow_by_slug(slug)
                        .await?
                        .filter(Flow::is_executable)
                        .ok_or_else(|| EngineError::SlugNotFound(slug.to_string()))?;

        let result = self.run(&flow, &raw_inputs, is_test).await;

        if is_test {
            tracing::info!(flow_slug = %flow.slug, elapsed_ms = start.elapsed().as_millis() as u64, "test execution finished (not logged)");
            return result;
        }

        let (status, output, error, block_results) = match &result {
            Ok(outcome) => (outcome.status, Some(outcome.output.clone()), None, outcome.block_results.clone()),
            Err(err) => (ExecutionStatus::Failed, None, Some(err.to_string()), Vec::new()),
        };

        self.log_sink.push(ExecutionLogEntry { id: Uuid::new_v4(),
                                                flow_slug: flow.slug.clone(),
                                                flow_version: flow.version,
                                                status,
                                                inputs: serde_json::to_value(&raw_inputs).unwrap_or(Value::Null),
                                                output,
                                                error,
                                                block_results,
                                                started_at,
                                                finished_at: Utc::now() });

        tracing::info!(flow_slug = %flow.slug, elapsed_ms = start.elapsed().as_millis() as u64, "flow execution finished");
        result
    }

    async fn run(&self, flow: &Flow, raw_inputs: &HashMap<String, Value>, is_test: bool) -> Result<ExecutionOutcome, EngineError> {
        let resolved_inputs = validator::validate(&flow.inputs, raw_inputs)?;
        let plan = planner::plan(flow)?;

        let flow_timeout = Duration::from_millis(flow.config.timeout_ms.unwrap_or(DEFAULT_FLOW_TIMEOUT_MS));
        tokio::time::timeout(flow_timeout, self.run_plan(flow, &plan, resolved_inputs, is_test)).await.map_err(|_| EngineError::FlowTimeout)?
    }

    /// Runs every layer in order; within a layer, blocks dispatch
    /// concurrently when `flow.config.parallel` is set and strictly
    /// sequentially otherwise. A block failure with `continueOnError`
    /// records a failed result and lets the plan continue — downstream
    /// mappings that read its outputs resolve to `null` (an "undefined"
    /// value). Any other block failure aborts the whole plan immediately,
    /// naming the offending block.
    async fn run_plan(&self, flow: &Flow, plan: &ExecutionPlan, resolved_inputs: HashMap<String, Value>, is_test: bool) -> Result<ExecutionOutcome, EngineError> {
        let mut ctx = ExecutionContext::new(resolved_inputs);
        let mut results = Vec::with_capacity(plan.block_count());
        let mut any_contained_failure = false;

        for layer in &plan.layers {
            let layer_results = if flow.config.parallel {
                let futures = layer.iter().map(|instance_id| self.run_block(flow, instance_id, &ctx, is_test));
                futures::future::join_all(futures).await
            } else {
                let mut sequential = Vec::with_capacity(layer.len());
                for instance_id in layer {
                    sequential.push(self.run_block(flow, instance_id, &ctx, is_test).await);
                }
                sequential
            };

            for outcome in layer_results {
                let result = outcome?;
                match result {
                    Ok(r) => {
                        ctx.record_block_outputs(&r.block_instance_id, r.outputs.clone());
                        results.push(r);
                    }
                    Err(contained) => {
                        any_contained_failure = true;
                        results.push(contained);
                    }
                }
            }
        }

        let output = projector::project_flow_outputs(&flow.outputs, &ctx);
        let status = if any_contained_failure { ExecutionStatus::Failed } else { ExecutionStatus::Success };
        Ok(ExecutionOutcome { output, status, block_results: results })
    }

    /// Runs one block instance. The outer `Result` carries flow-aborting
    /// errors (unknown block def, mapping rejected, or a non-`continueOnError`
    /// dispatch failure); the inner `Result` distinguishes a clean success
    /// from a `continueOnError`-contained failure.
    async fn run_block(&self, flow: &Flow, instance_id: &str, ctx: &ExecutionContext, is_test: bool) -> Result<Result<BlockExecutionResult, BlockExecutionResult>, EngineError> {
        let instance = flow.block(instance_id).ok_or_else(|| EngineError::Internal(format!("planner produced unknown block instance {instance_id}")))?;
        let block_def = self.cache
                             .get_block(instance.block_def_id)
                             .await?
                             .ok_or_else(|| EngineError::BlockDefMissing(instance.block_def_id.to_string()))?;

        // Test-mode short-circuit: no upstream call, no retry/timeout,
        // always succeeds.
        if is_test {
            let outputs = HashMap::from([("_test".to_string(), Value::Bool(true)), ("blockId".to_string(), Value::String(block_def.id.to_string()))]);
            return Ok(Ok(BlockExecutionResult { block_instance_id: instance_id.to_string(), status: BlockStatus::Success, outputs, raw: None, error: None, duration_ms: 0, attempt: 0 }));
        }

        let continue_on_error = instance.config.as_ref().and_then(|c| c.continue_on_error).unwrap_or(false);

        let params = match resolver::resolve_mappings(&instance.input_mappings, ctx) {
            Ok(p) => resolver::resolved_as_map(&p),
            Err(err) => return Err(EngineError::BlockFailed { block_instance_id: instance_id.to_string(), source: Box::new(err) }),
        };

        let timeout_ms = instance.config.as_ref().and_then(|c| c.timeout_ms).unwrap_or(DEFAULT_BLOCK_TIMEOUT_MS);
        let retry_count = instance.config.as_ref().and_then(|c| c.retry_count).unwrap_or(DEFAULT_RETRY_COUNT);

        let start = Instant::now();
        let dispatch_result = self.dispatch_with_retry(&block_def, params, timeout_ms, retry_count).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match dispatch_result {
            Ok((response, attempt)) => {
                let outputs = projector::project_block_outputs(&block_def, &response.body)
                    .map_err(|err| EngineError::BlockFailed { block_instance_id: instance_id.to_string(), source: Box::new(err) })?;
                let raw = Some(RawResponse { status_code: response.status, body: response.body, headers: response.headers });
                Ok(Ok(BlockExecutionResult { block_instance_id: instance_id.to_string(), status: BlockStatus::Success, outputs, raw, error: None, duration_ms, attempt }))
            }
            Err(err) if continue_on_error && err.is_containable() => {
                tracing::warn!(block_instance_id = instance_id, error = %err, "block failed, continuing (continueOnError)");
                let raw = raw_from_error(&err);
                Ok(Err(BlockExecutionResult { block_instance_id: instance_id.to_string(),
                                               status: BlockStatus::Failed,
                                               outputs: HashMap::new(),
                                               raw,
                                               error: Some(err.to_string()),
                                               duration_ms,
                                               attempt: retry_count + 1 }))
            }
            Err(err) => Err(EngineError::BlockFailed { block_instance_id: instance_id.to_string(), source: Box::new(err) }),
        }
    }

    async fn dispatch_with_retry(&self, block: &flow_domain::BlockDefinition, params: HashMap<String, Value>, timeout_ms: u64, retry_count: u32) -> Result<(crate::dispatch::DispatchResponse, u32), EngineError> {
        let timeout = Duration::from_millis(timeout_ms);
        let mut last_err = None;

        for attempt in 0..=retry_count {
            let request = DispatchRequest { block, params: params.clone(), timeout, retry_count };
            let outcome = match tokio::time::timeout(timeout, self.dispatcher.dispatch(request)).await {
                Ok(Ok(response)) => return Ok((response, attempt + 1)),
                Ok(Err(err)) => err,
                Err(_) => EngineError::UpstreamTimeout(timeout_ms),
            };

            let retryable = outcome.is_retryable();
            last_err = Some(outcome);
            if !retryable || attempt >= retry_count {
                break;
            }
            let backoff = (RETRY_BASE_MS * 2u64.saturating_pow(attempt)).min(RETRY_CAP_MS);
            tokio::time::sleep(Duration::from_millis(backoff)).await;
        }

        Err(last_err.unwrap_or_else(|| EngineError::Internal("dispatch failed with no recorded error".into())))
    }
}

/// Recovers the raw upstream response carried on a non-2xx `UpstreamHttpError`
/// so a contained failure still records what came back over the wire.
fn raw_from_error(err: &EngineError) -> Option<RawResponse> {
    match err {
        EngineError::UpstreamHttpError { status, body, headers, .. } => {
            Some(RawResponse { status_code: *status, body: body.clone(), headers: headers.clone() })
        }
        _ => None,
    }
}
