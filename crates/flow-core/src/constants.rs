//! Engine-wide constants.
//!
//! Timeouts and retry backoff are named here so the dispatcher and the HTTP
//! layer agree on what "default" means; individual flows/blocks may override
//! them via their `config`.

/// Per-block upstream call timeout when neither the block instance nor the
/// flow config overrides it.
pub const DEFAULT_BLOCK_TIMEOUT_MS: u64 = 30_000;

/// Whole-flow execution deadline when the flow config doesn't set one.
pub const DEFAULT_FLOW_TIMEOUT_MS: u64 = 60_000;

/// Retry attempts for a failed upstream call before giving up (0 = no retry).
pub const DEFAULT_RETRY_COUNT: u32 = 0;

/// Base delay for exponential retry backoff.
pub const RETRY_BASE_MS: u64 = 100;

/// Retry backoff is capped here regardless of attempt number.
pub const RETRY_CAP_MS: u64 = 2_000;

/// Capacity of the async execution-log channel; once full, the oldest queued
/// entry is dropped to make room rather than blocking block execution.
pub const LOG_SINK_CAPACITY: usize = 1_024;
