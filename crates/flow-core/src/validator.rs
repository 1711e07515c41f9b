//! Input Validator: checks a caller's request body against a flow's declared
//! inputs before planning or dispatch begins. Required inputs must be
//! present (after defaults are applied). Declared type tags are informational
//! only in this release — no coercion or type rejection is performed beyond
//! presence/required, per the open question on input type tags.

use std::collections::HashMap;

use flow_domain::FlowInputDecl;
use serde_json::Value;

use crate::errors::EngineError;

/// Validates and fills in defaults for `raw` against `decls`, returning the
/// resolved flow-input map the rest of the engine operates on.
pub fn validate(decls: &[FlowInputDecl], raw: &HashMap<String, Value>) -> Result<HashMap<String, Value>, EngineError> {
    let mut resolved = HashMap::with_capacity(decls.len());

    for decl in decls {
        let value = match raw.get(&decl.name) {
            Some(v) => v.clone(),
            None => match &decl.default_value {
                Some(default) => default.clone(),
                None => {
                    if decl.required {
                        return Err(EngineError::InputMissing(decl.name.clone()));
                    }
                    continue;
                }
            },
        };

        resolved.insert(decl.name.clone(), value);
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_domain::block::InputLocation;
    use flow_domain::InputType;

    fn decl(name: &str, required: bool, ty: InputType) -> FlowInputDecl {
        FlowInputDecl { name: name.to_string(), type_tag: ty, required, default_value: None, location: InputLocation::Query }
    }

    #[test]
    fn missing_required_input_is_rejected() {
        let decls = vec![decl("q", true, InputType::String)];
        let err = validate(&decls, &HashMap::new()).unwrap_err();
        assert!(matches!(err, EngineError::InputMissing(_)));
    }

    #[test]
    fn default_value_fills_optional_input() {
        let mut d = decl("limit", false, InputType::Number);
        d.default_value = Some(serde_json::json!(10));
        let resolved = validate(&[d], &HashMap::new()).unwrap();
        assert_eq!(resolved.get("limit"), Some(&serde_json::json!(10)));
    }

    #[test]
    fn type_tag_is_informational_only() {
        // A declared `number` input receiving a string value is accepted
        // unchanged — type tags carry no runtime enforcement in this release.
        let decls = vec![decl("q", true, InputType::Number)];
        let mut raw = HashMap::new();
        raw.insert("q".to_string(), serde_json::json!("not a number"));
        let resolved = validate(&decls, &raw).unwrap();
        assert_eq!(resolved.get("q"), Some(&serde_json::json!("not a number")));
    }
}
