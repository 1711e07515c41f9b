//! Flow: a DAG of block instances plus input/output declarations, exposed at
//! a URL slug once published.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DomainError;
use crate::mapping::InputMapping;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-z0-9-]+$").unwrap());

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandling {
    Stop,
    Continue,
    Rollback,
}

impl Default for ErrorHandling {
    fn default() -> Self {
        ErrorHandling::Stop
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowInputDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: InputType,
    pub required: bool,
    pub default_value: Option<Value>,
    pub location: crate::block::InputLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowOutputDecl {
    pub name: String,
    pub source_block_id: String,
    pub source_output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FlowConfig {
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub error_handling: ErrorHandling,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BlockInstanceConfig {
    pub timeout_ms: Option<u64>,
    pub retry_count: Option<u32>,
    pub continue_on_error: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockInstance {
    /// Unique within the flow; this is the id connections and output/mapping
    /// references use, distinct from the `BlockDefinition::id` it wraps.
    pub id: String,
    pub block_def_id: Uuid,
    pub input_mappings: Vec<InputMapping>,
    #[serde(default)]
    pub config: Option<BlockInstanceConfig>,
    /// Editor-only coordinates; the engine never reads this.
    #[serde(default)]
    pub position: Option<(f64, f64)>,
}

impl BlockInstance {
    /// Invariant: no two mappings target the same input.
    pub fn validate_mapping_targets(&self) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for m in &self.input_mappings {
            if !seen.insert(m.target_input.as_str()) {
                return Err(DomainError::DuplicateMappingTarget(self.id.clone(), m.target_input.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub id: String,
    pub from_block_instance_id: String,
    pub to_block_instance_id: String,
    /// Reserved; condition expressions are not evaluated in this release.
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flow {
    pub id: Uuid,
    pub slug: String,
    pub version: i64,
    pub status: FlowStatus,
    pub inputs: Vec<FlowInputDecl>,
    pub outputs: Vec<FlowOutputDecl>,
    pub blocks: Vec<BlockInstance>,
    pub connections: Vec<Connection>,
    pub config: FlowConfig,
    pub published_at: Option<DateTime<Utc>>,
}

impl Flow {
    pub fn is_valid_slug(slug: &str) -> bool {
        !slug.is_empty() && SLUG_RE.is_match(slug)
    }

    pub fn is_executable(&self) -> bool {
        self.status == FlowStatus::Published
    }

    pub fn block(&self, instance_id: &str) -> Option<&BlockInstance> {
        self.blocks.iter().find(|b| b.id == instance_id)
    }

    /// Shape checks cheap enough to run at execute time in addition to
    /// create/update time. Cycle detection is the planner's job, not this
    /// crate's.
    pub fn validate_shape(&self) -> Result<(), DomainError> {
        if !Self::is_valid_slug(&self.slug) {
            return Err(DomainError::InvalidSlug(self.slug.clone()));
        }

        let mut input_names = HashSet::new();
        for i in &self.inputs {
            if !input_names.insert(i.name.as_str()) {
                return Err(DomainError::DuplicateInputName(i.name.clone()));
            }
        }

        let mut output_names = HashSet::new();
        for o in &self.outputs {
            if !output_names.insert(o.name.as_str()) {
                return Err(DomainError::DuplicateOutputName(o.name.clone()));
            }
            if self.block(&o.source_block_id).is_none() {
                return Err(DomainError::OutputReferencesUnknownBlock(o.name.clone(), o.source_block_id.clone()));
            }
        }

        let mut block_ids = HashSet::new();
        for b in &self.blocks {
            if !block_ids.insert(b.id.as_str()) {
                return Err(DomainError::DuplicateBlockInstanceId(b.id.clone()));
            }
            b.validate_mapping_targets()?;
        }

        for c in &self.connections {
            if c.from_block_instance_id == c.to_block_instance_id {
                return Err(DomainError::SelfLoop(c.id.clone(), c.from_block_instance_id.clone()));
            }
            if self.block(&c.from_block_instance_id).is_none() {
                return Err(DomainError::ConnectionReferencesUnknownBlock(c.id.clone(), c.from_block_instance_id.clone()));
            }
            if self.block(&c.to_block_instance_id).is_none() {
                return Err(DomainError::ConnectionReferencesUnknownBlock(c.id.clone(), c.to_block_instance_id.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::InputLocation;

    fn sample_flow() -> Flow {
        Flow { id: Uuid::new_v4(),
               slug: "echo".into(),
               version: 1,
               status: FlowStatus::Published,
               inputs: vec![FlowInputDecl { name: "msg".into(),
                                            type_tag: InputType::String,
                                            required: true,
                                            default_value: None,
                                            location: InputLocation::Query }],
               outputs: vec![],
               blocks: vec![],
               connections: vec![],
               config: FlowConfig::default(),
               published_at: None }
    }

    #[test]
    fn rejects_duplicate_input_names() {
        let mut f = sample_flow();
        f.inputs.push(f.inputs[0].clone());
        assert_eq!(f.validate_shape(), Err(DomainError::DuplicateInputName("msg".into())));
    }

    #[test]
    fn rejects_output_to_missing_block() {
        let mut f = sample_flow();
        f.outputs.push(FlowOutputDecl { name: "reply".into(),
                                         source_block_id: "missing".into(),
                                         source_output: "x".into() });
        assert!(matches!(f.validate_shape(), Err(DomainError::OutputReferencesUnknownBlock(_, _))));
    }
}
