//! Block definitions: reusable wrappers over an upstream HTTP operation (or,
//! for non-`api_call` kinds, a local transform reserved for future use).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    ApiCall,
    Transform,
    Condition,
    Loop,
    Aggregate,
    Custom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputLocation {
    Path,
    Query,
    Header,
    Body,
}

/// Where the underlying upstream operation lives and how to reach it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockSource {
    /// OpenAPI operationId this block wraps (informational; the engine never
    /// re-resolves it against the catalog at execute time).
    pub operation_id: String,
    /// Path template, e.g. `/users/{id}`.
    pub path: String,
    pub method: HttpMethod,
    /// Server base URL; `None` means the path is already absolute.
    pub server_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockInputSpec {
    pub name: String,
    #[serde(rename = "in")]
    pub location: InputLocation,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockOutputSpec {
    pub name: String,
    /// JSONPath-subset projection path against the upstream response body.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockDefinition {
    pub id: Uuid,
    pub name: String,
    pub block_type: BlockType,
    pub source: BlockSource,
    pub inputs: Vec<BlockInputSpec>,
    pub outputs: Vec<BlockOutputSpec>,
}

impl BlockDefinition {
    pub fn input_named(&self, name: &str) -> Option<&BlockInputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn output_named(&self, name: &str) -> Option<&BlockOutputSpec> {
        self.outputs.iter().find(|o| o.name == name)
    }
}
