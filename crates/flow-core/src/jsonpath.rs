//! JSONPath-subset evaluator used for block output projection.
//!
//! Supports a root `$`, dotted object keys and `[n]` array indices — no
//! filters, wildcards or slices. This is enough to pull a field (or a field
//! nested inside arrays of objects) out of an upstream response body; it is
//! intentionally not a general JSONPath implementation.

use serde_json::Value;

use crate::errors::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

fn parse(path: &str) -> Result<Vec<Segment>, EngineError> {
    let path = path.trim();
    let rest = path.strip_prefix('$').unwrap_or(path);

    let mut segments = Vec::new();
    let mut chars = rest.chars().peekable();
    let mut current = String::new();

    let flush = |current: &mut String, segments: &mut Vec<Segment>| {
        if !current.is_empty() {
            segments.push(Segment::Key(std::mem::take(current)));
        }
    };

    while let Some(&c) = chars.peek() {
        match c {
            '.' => {
                chars.next();
                flush(&mut current, &mut segments);
            }
            '[' => {
                chars.next();
                flush(&mut current, &mut segments);
                let mut idx = String::new();
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                    idx.push(c);
                }
                let n = idx.trim()
                           .parse::<usize>()
                           .map_err(|_| EngineError::Internal(format!("invalid JSONPath array index: [{idx}]")))?;
                segments.push(Segment::Index(n));
            }
            _ => {
                current.push(c);
                chars.next();
            }
        }
    }
    flush(&mut current, &mut segments);

    Ok(segments)
}

/// Evaluates `path` against `root`, returning `None` if any segment along
/// the way is missing, or traverses through `null`, or hits a
/// mismatched-type container (a block that legitimately returns an optional
/// field should not fail the whole execution for it) — callers must treat
/// `None` as "undefined" and omit the corresponding output key rather than
/// projecting a JSON `null`.
pub fn evaluate(root: &Value, path: &str) -> Result<Option<Value>, EngineError> {
    let segments = parse(path)?;
    let mut cursor = root;

    for segment in &segments {
        if cursor.is_null() {
            return Ok(None);
        }
        cursor = match (segment, cursor) {
            (Segment::Key(k), Value::Object(map)) => match map.get(k) {
                Some(v) => v,
                None => return Ok(None),
            },
            (Segment::Index(i), Value::Array(arr)) => match arr.get(*i) {
                Some(v) => v,
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
    }

    if cursor.is_null() { Ok(None) } else { Ok(Some(cursor.clone())) }
}
