//! Validation errors for the data model. Distinct from `flow_core::EngineError`:
//! these are authoring-time shape problems, not execution failures.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid slug: {0}")]
    InvalidSlug(String),
    #[error("duplicate flow input name: {0}")]
    DuplicateInputName(String),
    #[error("duplicate flow output name: {0}")]
    DuplicateOutputName(String),
    #[error("duplicate block instance id: {0}")]
    DuplicateBlockInstanceId(String),
    #[error("flow output {0} references unknown block instance {1}")]
    OutputReferencesUnknownBlock(String, String),
    #[error("connection {0} references unknown block instance {1}")]
    ConnectionReferencesUnknownBlock(String, String),
    #[error("connection {0} is a self-loop on block {1}")]
    SelfLoop(String, String),
    #[error("block instance {0} maps target input {1} more than once")]
    DuplicateMappingTarget(String, String),
}
