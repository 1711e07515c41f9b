//! Output Projector: applies each block's declared output paths to
//! its upstream response body, and assembles the flow's final response body
//! from its declared outputs.

use std::collections::HashMap;

use flow_domain::{BlockDefinition, FlowOutputDecl};
use serde_json::Value;

use crate::errors::EngineError;
use crate::jsonpath;
use crate::model::ExecutionContext;

/// Projects a block's raw response body into its named outputs. An output
/// whose path resolves to "undefined" (missing field, traversal through
/// `null`, mismatched type) is left out of the map entirely rather than
/// stored as `null` — a downstream mapping reading it, or a flow output
/// sourced from it, then correctly sees it as absent.
pub fn project_block_outputs(block: &BlockDefinition, body: &Value) -> Result<HashMap<String, Value>, EngineError> {
    let mut outputs = HashMap::with_capacity(block.outputs.len());
    for spec in &block.outputs {
        if let Some(value) = jsonpath::evaluate(body, &spec.path)? {
            outputs.insert(spec.name.clone(), value);
        }
    }
    Ok(outputs)
}

/// Assembles the flow's response body from its declared outputs, reading
/// each from the block that already ran. A declared output whose source
/// block/output never produced a value (skipped upstream, `continue`
/// handling, or a projection that resolved to "undefined") is omitted from
/// the result object entirely rather than reported as `null` (§4.F, §8).
pub fn project_flow_outputs(decls: &[FlowOutputDecl], ctx: &ExecutionContext) -> Value {
    let mut out = serde_json::Map::with_capacity(decls.len());
    for decl in decls {
        if let Some(value) = ctx.block_output(&decl.source_block_id, &decl.source_output) {
            out.insert(decl.name.clone(), value.clone());
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_domain::BlockOutputSpec;
    use serde_json::json;

    fn block_with_outputs(specs: Vec<BlockOutputSpec>) -> BlockDefinition {
        use flow_domain::{BlockSource, BlockType, HttpMethod};
        BlockDefinition {
            id: uuid::Uuid::new_v4(),
            name: "b".into(),
            block_type: BlockType::ApiCall,
            source: BlockSource { operation_id: "op".into(), path: "/x".into(), method: HttpMethod::Get, server_url: None },
            inputs: vec![],
            outputs: specs,
        }
    }

    #[test]
    fn missing_output_path_is_omitted_not_null() {
        let block = block_with_outputs(vec![BlockOutputSpec { name: "first".into(), path: "$.items[0].name".into() }]);
        let body = json!({"items": []});
        let outputs = project_block_outputs(&block, &body).unwrap();
        assert!(!outputs.contains_key("first"));
    }

    #[test]
    fn flow_output_with_no_recorded_block_output_is_absent() {
        let decls = vec![FlowOutputDecl { name: "reply".into(), source_block_id: "call".into(), source_output: "missing".into() }];
        let ctx = ExecutionContext::new(HashMap::new());
        let out = project_flow_outputs(&decls, &ctx);
        assert_eq!(out, json!({}));
        assert!(out.get("reply").is_none());
    }
}
