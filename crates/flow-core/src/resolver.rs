//! Mapping Resolver: turns a block instance's `input_mappings` into the flat
//! params object the dispatcher sends upstream.
//!
//! Each mapping resolves independently to an optional JSON value, keyed by
//! its `target_input`. A `flow_input`/`block_output` source that has no
//! value yet (an omitted optional flow input, or the output of a block that
//! failed under `continueOnError`) is "undefined" per §4.D: the target key
//! is left out of the params object entirely rather than carrying a JSON
//! `null`, so the dispatcher sees the field as not provided at all. Mappings
//! are folded in declaration order; the later mapping in the list wins on a
//! shared `target_input`, including winning with "undefined" over an
//! earlier mapping's value.

use std::collections::HashMap;

use flow_domain::mapping::MappingSource;
use flow_domain::InputMapping;
use serde_json::Value;

use crate::errors::EngineError;
use crate::model::ExecutionContext;

/// Resolves one mapping's source against the running context. `None` means
/// "undefined" (§4.D): the source exists but has no value yet. `Expression`
/// is rejected outright: this release runs in strict mode and never
/// evaluates caller-supplied expression text.
pub fn resolve_source(source: &MappingSource, ctx: &ExecutionContext) -> Result<Option<Value>, EngineError> {
    match source {
        MappingSource::FlowInput { name } => Ok(ctx.flow_input(name).cloned()),
        MappingSource::BlockOutput { block_id, output_name } => Ok(ctx.block_output(block_id, output_name).cloned()),
        MappingSource::Constant { value } => Ok(Some(value.clone())),
        MappingSource::Expression { .. } => Err(EngineError::UnsupportedMapping),
    }
}

/// Resolves every mapping for a block instance into a single params object,
/// keyed by `target_input` and folded in list order. A target whose final
/// resolution is "undefined" is omitted from the object rather than set to
/// `null`.
pub fn resolve_mappings(mappings: &[InputMapping], ctx: &ExecutionContext) -> Result<Value, EngineError> {
    let mut resolved: HashMap<String, Option<Value>> = HashMap::new();
    for mapping in mappings {
        let value = resolve_source(&mapping.source, ctx)?;
        resolved.insert(mapping.target_input.clone(), value);
    }

    let mut out = serde_json::Map::with_capacity(resolved.len());
    for (target, value) in resolved {
        if let Some(value) = value {
            out.insert(target, value);
        }
    }
    Ok(Value::Object(out))
}

/// Convenience view of a resolved params object as a flat map, for callers
/// (the dispatcher) that want to distribute values across path/query/header
/// locations rather than hand the whole object to a single body.
pub fn resolved_as_map(resolved: &Value) -> HashMap<String, Value> {
    match resolved {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_domain::mapping::InputMapping;
    use serde_json::json;

    #[test]
    fn missing_flow_input_is_omitted_from_params() {
        let ctx = ExecutionContext::new(HashMap::new());
        let mappings = vec![InputMapping { target_input: "msg".into(), source: MappingSource::FlowInput { name: "msg".into() } }];
        let resolved = resolve_mappings(&mappings, &ctx).unwrap();
        assert_eq!(resolved, json!({}));
    }

    #[test]
    fn block_output_of_a_failed_block_is_omitted_from_params() {
        // A's outputs are never recorded on the context when it fails, so
        // `block_output` returns `None` here exactly as it would after a
        // `continueOnError`-contained failure.
        let ctx = ExecutionContext::new(HashMap::new());
        let mappings = vec![InputMapping { target_input: "to".into(), source: MappingSource::BlockOutput { block_id: "a".into(), output_name: "email".into() } }];
        let resolved = resolve_mappings(&mappings, &ctx).unwrap();
        assert_eq!(resolved, json!({}));
    }

    #[test]
    fn constant_mapping_is_always_present() {
        let ctx = ExecutionContext::new(HashMap::new());
        let mappings = vec![InputMapping { target_input: "subject".into(), source: MappingSource::Constant { value: json!("hello") } }];
        let resolved = resolve_mappings(&mappings, &ctx).unwrap();
        assert_eq!(resolved, json!({"subject": "hello"}));
    }

    #[test]
    fn later_mapping_wins_even_when_it_resolves_to_undefined() {
        let mut ctx = ExecutionContext::new(HashMap::from([("id".to_string(), json!(1))]));
        ctx.record_block_outputs("a", HashMap::new());
        let mappings = vec![
            InputMapping { target_input: "id".into(), source: MappingSource::FlowInput { name: "id".into() } },
            InputMapping { target_input: "id".into(), source: MappingSource::BlockOutput { block_id: "a".into(), output_name: "missing".into() } },
        ];
        let resolved = resolve_mappings(&mappings, &ctx).unwrap();
        assert_eq!(resolved, json!({}));
    }
}
