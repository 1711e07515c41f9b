//! Deterministic JSON parameter merging.
//!
//! Implements a shallow merge where `b`'s keys override `a`'s. Could extend
//! to a deep merge for nested objects if that's ever needed; for now the
//! simple, predictable semantics are enough.

use serde_json::Value;

/// Shallow merge: keys from `b` override keys from `a` when both are objects.
/// When either value isn't an object, `b` takes precedence outright.
pub fn merge_json(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Object(ma), Value::Object(mb)) => {
            let mut out = ma.clone();
            for (k, v) in mb.iter() {
                out.insert(k.clone(), v.clone());
            }
            Value::Object(out)
        }
        // Non-objects: override
        (_, other) => other.clone(),
    }
}
