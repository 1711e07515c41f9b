//! Input mappings: the rule that produces one named block input.
//!
//! Four source variants. `Expression` is reserved — the
//! resolver in `flow-core` decides whether to honour it (pass-through) or
//! reject it (strict mode); this crate only carries the shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputMapping {
    pub target_input: String,
    pub source: MappingSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappingSource {
    FlowInput { name: String },
    BlockOutput { block_id: String, output_name: String },
    Constant { value: Value },
    Expression { text: String },
}
