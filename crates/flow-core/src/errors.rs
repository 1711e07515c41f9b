//! Engine-level errors. Each variant names a distinct failure the execution
//! endpoint needs to report; the HTTP layer maps these to status codes and
//! `{code, message}` bodies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineError {
    #[error("published flow not found: {0}")]
    SlugNotFound(String),

    #[error("Missing required input: {0}")]
    InputMissing(String),

    #[error("flow graph is cyclic; unresolved blocks: {0:?}")]
    CycleDetected(Vec<String>),

    #[error("block definition missing for instance {0}")]
    BlockDefMissing(String),

    #[error("unsupported block type: {0}")]
    UnsupportedBlockType(String),

    #[error("upstream call timed out after {0}ms")]
    UpstreamTimeout(u64),

    #[error("upstream returned {status}: {message}")]
    UpstreamHttpError { status: u16, message: String, body: serde_json::Value, headers: std::collections::HashMap<String, String> },

    #[error("unresolved path placeholder {{{0}}}")]
    MissingPathParam(String),

    #[error("transport error calling upstream: {0}")]
    Transport(String),

    #[error("flow execution exceeded its deadline")]
    FlowTimeout,

    #[error("expression mappings are not supported in strict mode")]
    UnsupportedMapping,

    #[error("block {block_instance_id} failed: {source}")]
    BlockFailed { block_instance_id: String, source: Box<EngineError> },

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// The `code` string used in the HTTP error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::SlugNotFound(_) => "FLOW_NOT_FOUND",
            EngineError::InputMissing(_) => "INPUT_MISSING",
            EngineError::CycleDetected(_) => "FLOW_INVALID",
            EngineError::BlockDefMissing(_) => "BLOCK_NOT_FOUND",
            EngineError::UnsupportedBlockType(_) => "UNSUPPORTED_BLOCK_TYPE",
            EngineError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            EngineError::UpstreamHttpError { .. } => "UPSTREAM_HTTP_ERROR",
            EngineError::MissingPathParam(_) => "UPSTREAM_HTTP_ERROR",
            EngineError::Transport(_) => "UPSTREAM_HTTP_ERROR",
            EngineError::FlowTimeout => "EXECUTION_ERROR",
            EngineError::UnsupportedMapping => "UNSUPPORTED_MAPPING",
            EngineError::BlockFailed { source, .. } => source.code(),
            EngineError::Internal(_) => "EXECUTION_ERROR",
        }
    }

    /// Whether a failure that originates from a single block is eligible to
    /// be contained by that block instance's `continueOnError`. Flow-level
    /// failures (bad slug, bad graph, overall deadline) are never
    /// containable — they abort the whole request.
    pub fn is_containable(&self) -> bool {
        matches!(self,
                 EngineError::BlockDefMissing(_)
                 | EngineError::UnsupportedBlockType(_)
                 | EngineError::UpstreamTimeout(_)
                 | EngineError::UpstreamHttpError { .. }
                 | EngineError::MissingPathParam(_)
                 | EngineError::Transport(_))
    }

    /// Retry on transport failures and 5xx responses; never on 4xx (the
    /// caller/upstream contract, not a transient condition).
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::UpstreamTimeout(_) | EngineError::Transport(_) => true,
            EngineError::UpstreamHttpError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status the execution endpoint returns for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            EngineError::SlugNotFound(_) => 404,
            EngineError::InputMissing(_) => 400,
            EngineError::CycleDetected(_) => 400,
            EngineError::UnsupportedMapping => 400,
            EngineError::BlockFailed { source, .. } => source.http_status(),
            _ => 500,
        }
    }
}
