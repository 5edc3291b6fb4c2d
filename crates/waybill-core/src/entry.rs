//! Entry payloads: the typed content carried by history entries.
//!
//! The core treats payloads as opaque beyond a small surface: a type
//! identifier, a human description, and a validity check. Concrete payload
//! kinds are registered externally; unknown kinds stay generic and still
//! digest, sign, and verify like any other entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SlipError};

/// The field every payload envelope must carry.
pub const TYPE_FIELD: &str = "type";

/// Type name of the built-in comment payload.
pub const COMMENT_TYPE: &str = "comment";

/// A parsed payload type identifier: `name` or `name/vN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKind {
    name: String,
    version: Option<String>,
}

impl EntryKind {
    /// Parse a type identifier, splitting a trailing `/vN` version suffix.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(SlipError::InvalidPayload("empty entry type".to_string()));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
        {
            return Err(SlipError::InvalidPayload(format!(
                "invalid entry type {s:?}"
            )));
        }
        if s.starts_with('/') || s.ends_with('/') {
            return Err(SlipError::InvalidPayload(format!(
                "invalid entry type {s:?}"
            )));
        }
        match s.rsplit_once('/') {
            Some((name, version)) if is_version(version) => Ok(Self {
                name: name.to_string(),
                version: Some(version.to_string()),
            }),
            _ => Ok(Self {
                name: s.to_string(),
                version: None,
            }),
        }
    }

    /// The type name without its version suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The version suffix, if any (e.g. `v1`).
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}/{}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

fn is_version(s: &str) -> bool {
    s.len() > 1 && s.starts_with('v') && s[1..].chars().all(|c| c.is_ascii_digit())
}

/// A payload carried by a history entry.
///
/// Implementations provide the typed envelope; the chain itself only ever
/// stores the generic form.
pub trait Entry {
    /// The full type identifier, including any version suffix.
    fn entry_type(&self) -> String;

    /// A short human-readable summary of the payload.
    fn describe(&self) -> String;

    /// Check the payload for well-formedness.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Convert into the generic envelope stored in the chain.
    fn to_generic(&self) -> Result<GenericEntry>;
}

/// The generic payload envelope: a JSON object with a mandatory `type` field.
///
/// This is the in-chain representation of every payload, registered kind or
/// not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenericEntry {
    fields: serde_json::Map<String, Value>,
}

impl GenericEntry {
    /// Build from a field map, requiring a well-formed `type` field.
    pub fn new(fields: serde_json::Map<String, Value>) -> Result<Self> {
        let entry = Self { fields };
        entry.kind()?;
        Ok(entry)
    }

    /// Build from a type identifier and additional fields.
    pub fn with_fields<I>(entry_type: &str, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        EntryKind::parse(entry_type)?;
        let mut map = serde_json::Map::new();
        map.insert(
            TYPE_FIELD.to_string(),
            Value::String(entry_type.to_string()),
        );
        for (k, v) in fields {
            map.insert(k, v);
        }
        Self::new(map)
    }

    /// Parse from an arbitrary JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Self::new(fields),
            other => Err(SlipError::InvalidPayload(format!(
                "payload must be an object, got {other}"
            ))),
        }
    }

    /// The full type identifier.
    pub fn entry_type(&self) -> &str {
        match self.fields.get(TYPE_FIELD) {
            Some(Value::String(s)) => s,
            _ => "",
        }
    }

    /// The parsed type identifier.
    pub fn kind(&self) -> Result<EntryKind> {
        match self.fields.get(TYPE_FIELD) {
            Some(Value::String(s)) => EntryKind::parse(s),
            Some(_) => Err(SlipError::InvalidPayload(
                "type field must be a string".to_string(),
            )),
            None => Err(SlipError::InvalidPayload(
                "payload has no type field".to_string(),
            )),
        }
    }

    /// Access a payload field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The payload as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Summarize scalar fields, up to four, skipping the type field.
    fn describe_fields(&self) -> String {
        let mut described = Vec::new();
        let mut skipped_type = 0usize;
        for (key, value) in &self.fields {
            if key == TYPE_FIELD {
                skipped_type = 1;
                continue;
            }
            if described.len() >= 4 {
                continue;
            }
            let Some(rendered) = scalar_to_string(value) else {
                continue;
            };
            described.push(format!("{key}: {rendered}"));
        }
        if described.is_empty() {
            return "<unknown type>".to_string();
        }
        if self.fields.len() > described.len() + skipped_type {
            return format!("{}, ...", described.join(", "));
        }
        described.join(", ")
    }
}

impl Entry for GenericEntry {
    fn entry_type(&self) -> String {
        GenericEntry::entry_type(self).to_string()
    }

    fn describe(&self) -> String {
        self.describe_fields()
    }

    fn validate(&self) -> Result<()> {
        self.kind().map(|_| ())
    }

    fn to_generic(&self) -> Result<GenericEntry> {
        Ok(self.clone())
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// The built-in comment payload: free text attached to a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEntry {
    pub comment: String,
}

impl CommentEntry {
    pub fn new(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
        }
    }

    /// Decode from the generic envelope.
    pub fn from_generic(generic: &GenericEntry) -> Result<Self> {
        match generic.get("comment") {
            Some(Value::String(s)) => Ok(Self::new(s.clone())),
            Some(_) => Err(SlipError::InvalidPayload(
                "comment field must be a string".to_string(),
            )),
            None => Err(SlipError::InvalidPayload(
                "comment entry without comment field".to_string(),
            )),
        }
    }
}

impl Entry for CommentEntry {
    fn entry_type(&self) -> String {
        COMMENT_TYPE.to_string()
    }

    fn describe(&self) -> String {
        format!("Comment: {}", self.comment)
    }

    fn validate(&self) -> Result<()> {
        if self.comment.is_empty() {
            return Err(SlipError::InvalidPayload(
                "comment must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn to_generic(&self) -> Result<GenericEntry> {
        GenericEntry::with_fields(
            COMMENT_TYPE,
            [("comment".to_string(), Value::String(self.comment.clone()))],
        )
    }
}

/// Decoder callback for one payload kind.
pub type EntryDecoder = Arc<dyn Fn(&GenericEntry) -> Result<Box<dyn Entry>> + Send + Sync>;

/// Registry of known payload kinds, keyed by type name (version-agnostic).
///
/// Decoding is non-strict: payloads with unregistered types stay generic and
/// validate as opaque objects.
pub struct EntryTypeRegistry {
    decoders: HashMap<String, EntryDecoder>,
}

impl EntryTypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register a decoder for a payload type name.
    pub fn register<F>(&mut self, name: &str, decoder: F)
    where
        F: Fn(&GenericEntry) -> Result<Box<dyn Entry>> + Send + Sync + 'static,
    {
        self.decoders.insert(name.to_string(), Arc::new(decoder));
    }

    /// Decode a generic payload into its registered kind, if any.
    pub fn decode(&self, generic: &GenericEntry) -> Result<Option<Box<dyn Entry>>> {
        let kind = generic.kind()?;
        match self.decoders.get(kind.name()) {
            Some(decoder) => decoder(generic).map(Some),
            None => Ok(None),
        }
    }

    /// Describe a generic payload via its registered kind, falling back to
    /// the generic scalar-field summary.
    pub fn describe(&self, generic: &GenericEntry) -> String {
        match self.decode(generic) {
            Ok(Some(entry)) => entry.describe(),
            Ok(None) => generic.describe_fields(),
            Err(err) => format!("invalid entry: {err}"),
        }
    }

    /// Validate a generic payload, delegating to its registered kind.
    pub fn validate(&self, generic: &GenericEntry) -> Result<()> {
        match self.decode(generic)? {
            Some(entry) => entry.validate(),
            None => Entry::validate(generic),
        }
    }
}

impl Default for EntryTypeRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(COMMENT_TYPE, |g| {
            Ok(Box::new(CommentEntry::from_generic(g)?) as Box<dyn Entry>)
        });
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_kind_parse() {
        let kind = EntryKind::parse("comment").unwrap();
        assert_eq!(kind.name(), "comment");
        assert_eq!(kind.version(), None);

        let kind = EntryKind::parse("acme.org/test").unwrap();
        assert_eq!(kind.name(), "acme.org/test");
        assert_eq!(kind.version(), None);

        let kind = EntryKind::parse("acme.org/test/v1").unwrap();
        assert_eq!(kind.name(), "acme.org/test");
        assert_eq!(kind.version(), Some("v1"));
        assert_eq!(kind.to_string(), "acme.org/test/v1");
    }

    #[test]
    fn test_entry_kind_rejects_garbage() {
        assert!(EntryKind::parse("").is_err());
        assert!(EntryKind::parse("has space").is_err());
        assert!(EntryKind::parse("/leading").is_err());
        assert!(EntryKind::parse("trailing/").is_err());
    }

    #[test]
    fn test_comment_roundtrip() {
        let comment = CommentEntry::new("first entry");
        assert_eq!(comment.describe(), "Comment: first entry");

        let generic = comment.to_generic().unwrap();
        assert_eq!(generic.entry_type(), "comment");

        let back = CommentEntry::from_generic(&generic).unwrap();
        assert_eq!(back, comment);
    }

    #[test]
    fn test_comment_validation() {
        assert!(CommentEntry::new("x").validate().is_ok());
        assert!(CommentEntry::new("").validate().is_err());
    }

    #[test]
    fn test_generic_requires_type() {
        let err = GenericEntry::from_value(json!({"comment": "no type"})).unwrap_err();
        assert!(matches!(err, SlipError::InvalidPayload(_)));

        let err = GenericEntry::from_value(json!("not an object")).unwrap_err();
        assert!(matches!(err, SlipError::InvalidPayload(_)));
    }

    #[test]
    fn test_generic_describe_scalars() {
        let generic = GenericEntry::with_fields(
            "acme.org/test",
            [
                ("name".to_string(), json!("unit-tests")),
                ("status".to_string(), json!("passed")),
            ],
        )
        .unwrap();
        assert_eq!(Entry::describe(&generic), "name: unit-tests, status: passed");
    }

    #[test]
    fn test_generic_describe_truncates() {
        let generic = GenericEntry::with_fields(
            "acme.org/test",
            ('a'..='f').map(|c| (c.to_string(), json!(1))),
        )
        .unwrap();
        assert_eq!(Entry::describe(&generic), "a: 1, b: 1, c: 1, d: 1, ...");
    }

    #[test]
    fn test_generic_describe_skips_composites() {
        let generic = GenericEntry::with_fields(
            "acme.org/test",
            [("report".to_string(), json!({"nested": true}))],
        )
        .unwrap();
        assert_eq!(Entry::describe(&generic), "<unknown type>");
    }

    #[test]
    fn test_registry_decodes_comment() {
        let registry = EntryTypeRegistry::default();
        let generic = CommentEntry::new("hi").to_generic().unwrap();
        assert_eq!(registry.describe(&generic), "Comment: hi");
        assert!(registry.validate(&generic).is_ok());
    }

    #[test]
    fn test_registry_rejects_bad_comment() {
        let registry = EntryTypeRegistry::default();
        let generic =
            GenericEntry::with_fields(COMMENT_TYPE, [("comment".to_string(), json!(""))]).unwrap();
        assert!(registry.validate(&generic).is_err());
    }

    #[test]
    fn test_registry_unknown_type_stays_generic() {
        let registry = EntryTypeRegistry::default();
        let generic = GenericEntry::with_fields(
            "vendor.example/scan",
            [("status".to_string(), json!("clean"))],
        )
        .unwrap();
        assert!(registry.decode(&generic).unwrap().is_none());
        assert_eq!(registry.describe(&generic), "status: clean");
        assert!(registry.validate(&generic).is_ok());
    }

    #[test]
    fn test_generic_serde_transparent() {
        let generic = CommentEntry::new("serialized").to_generic().unwrap();
        let json = serde_json::to_string(&generic).unwrap();
        assert_eq!(json, r#"{"comment":"serialized","type":"comment"}"#);
        let back: GenericEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, generic);
    }
}
