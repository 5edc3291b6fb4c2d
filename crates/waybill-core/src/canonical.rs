//! Canonical JSON encoding for deterministic digesting.
//!
//! History entries are digested over a canonical JSON form:
//! - Object keys sorted by byte comparison
//! - No whitespace between tokens
//! - Integer-only numbers (floats are rejected)
//! - Absent optional fields omitted entirely
//!
//! The `digest` and `signature` fields never enter the canonical form, so an
//! entry's digest stays stable while its signature migrates with the chain
//! tip. The canonical encoding is critical: the same entry must produce
//! identical bytes (and thus an identical digest) across all platforms.

use std::fmt::Write as _;

use serde_json::Value;

use crate::error::CanonicalError;
use crate::history::HistoryEntry;

/// Maximum nesting depth accepted in canonical form.
///
/// Payloads are caller-supplied; the cap keeps adversarial nesting from
/// overflowing the stack.
pub const MAX_DEPTH: usize = 128;

/// Encode a history entry to canonical bytes, excluding digest and signature.
pub fn canonical_entry_bytes(entry: &HistoryEntry) -> Result<Vec<u8>, CanonicalError> {
    let mut fields = serde_json::Map::new();
    if !entry.links.is_empty() {
        let links: Vec<Value> = entry
            .links
            .iter()
            .map(|l| {
                let mut link = serde_json::Map::new();
                link.insert("digest".to_string(), Value::String(l.digest.to_string()));
                link.insert("name".to_string(), Value::String(l.name.clone()));
                Value::Object(link)
            })
            .collect();
        fields.insert("links".to_string(), Value::Array(links));
    }
    if let Some(parent) = &entry.parent {
        fields.insert("parent".to_string(), Value::String(parent.to_string()));
    }
    fields.insert("payload".to_string(), entry.payload.to_value());
    fields.insert(
        "timestamp".to_string(),
        Value::String(entry.timestamp.to_string()),
    );
    canonical_bytes(&Value::Object(fields))
}

/// Encode an arbitrary JSON value to canonical bytes.
pub fn canonical_bytes(value: &Value) -> Result<Vec<u8>, CanonicalError> {
    let mut out = String::new();
    encode_value(&mut out, value, 0)?;
    Ok(out.into_bytes())
}

fn encode_value(out: &mut String, value: &Value, depth: usize) -> Result<(), CanonicalError> {
    if depth > MAX_DEPTH {
        return Err(CanonicalError::MaxDepthExceeded(MAX_DEPTH));
    }
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            if !n.is_i64() && !n.is_u64() {
                return Err(CanonicalError::FloatNotAllowed);
            }
            write!(out, "{n}").map_err(|e| CanonicalError::Encoding(e.to_string()))?;
        }
        Value::String(s) => encode_string(out, s)?,
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                encode_value(out, item, depth + 1)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                encode_string(out, key)?;
                out.push(':');
                encode_value(out, &map[key], depth + 1)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn encode_string(out: &mut String, s: &str) -> Result<(), CanonicalError> {
    let escaped =
        serde_json::to_string(s).map_err(|e| CanonicalError::Encoding(e.to_string()))?;
    out.push_str(&escaped);
    Ok(())
}
