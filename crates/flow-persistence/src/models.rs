//! Row types for the document-store tables in `schema.rs`, plus their
//! conversions to/from the `flow-core`/`flow-domain` types the rest of the
//! engine actually works with. Each row carries just enough scalar columns
//! to query by (slug, status, timestamps) alongside the full value as
//! `document`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use flow_core::log::{ExecutionLogEntry, ExecutionStatus};
use flow_domain::{BlockDefinition, Flow, FlowStatus};
use serde_json::Value;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::schema::{blocks, execution_logs, flows};

#[derive(Queryable, Debug)]
pub struct FlowRow {
    pub id: Uuid,
    pub slug: String,
    pub version: i64,
    pub status: String,
    pub document: Value,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = flows)]
pub struct NewFlowRow<'a> {
    pub id: &'a Uuid,
    pub slug: &'a str,
    pub version: i64,
    pub status: &'a str,
    pub document: &'a Value,
    pub published_at: Option<DateTime<Utc>>,
}

impl FlowRow {
    pub fn into_domain(self) -> Result<Flow, PersistenceError> {
        serde_json::from_value(self.document).map_err(|e| PersistenceError::Unknown(format!("corrupt flow document: {e}")))
    }
}

fn flow_status_str(status: FlowStatus) -> &'static str {
    match status {
        FlowStatus::Draft => "draft",
        FlowStatus::Published => "published",
        FlowStatus::Archived => "archived",
    }
}

pub fn new_flow_row(flow: &Flow, document: &Value) -> NewFlowRow<'_> {
    NewFlowRow { id: &flow.id, slug: &flow.slug, version: flow.version, status: flow_status_str(flow.status), document, published_at: flow.published_at }
}

#[derive(Queryable, Debug)]
pub struct BlockRow {
    pub id: Uuid,
    pub document: Value,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = blocks)]
pub struct NewBlockRow<'a> {
    pub id: &'a Uuid,
    pub document: &'a Value,
}

impl BlockRow {
    pub fn into_domain(self) -> Result<BlockDefinition, PersistenceError> {
        serde_json::from_value(self.document).map_err(|e| PersistenceError::Unknown(format!("corrupt block document: {e}")))
    }
}

#[derive(Queryable, Debug)]
pub struct ExecutionLogRow {
    pub id: Uuid,
    pub flow_slug: String,
    pub flow_version: i64,
    pub status: String,
    pub document: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = execution_logs)]
pub struct NewExecutionLogRow<'a> {
    pub id: &'a Uuid,
    pub flow_slug: &'a str,
    pub flow_version: i64,
    pub status: &'a str,
    pub document: &'a Value,
    pub created_at: DateTime<Utc>,
}

fn execution_status_str(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Success => "success",
        ExecutionStatus::Failed => "failed",
    }
}

pub fn new_execution_log_row(entry: &ExecutionLogEntry, document: &Value) -> NewExecutionLogRow<'_> {
    NewExecutionLogRow {
        id: &entry.id,
        flow_slug: &entry.flow_slug,
        flow_version: entry.flow_version,
        status: execution_status_str(entry.status),
        document,
        created_at: entry.started_at,
    }
}

impl ExecutionLogRow {
    pub fn into_domain(self) -> Result<ExecutionLogEntry, PersistenceError> {
        serde_json::from_value(self.document).map_err(|e| PersistenceError::Unknown(format!("corrupt execution log document: {e}")))
    }
}
