//! Issuer identities: distinguished names that own slips and signing keys.
//!
//! A slip name is the normalized string form of its issuer's identity. Plain
//! names (`acme.org`) are treated as a common-name-only identity and
//! normalize back to the bare name, so simple issuers keep simple slip names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlipError};

/// Recognized distinguished-name attribute keys, in normalization order.
const ATTRIBUTE_ORDER: [&str; 9] = [
    "CN",
    "SERIALNUMBER",
    "C",
    "O",
    "OU",
    "L",
    "ST",
    "STREET",
    "POSTALCODE",
];

/// A distinguished-name issuer identity.
///
/// Parsed either from a plain name (common name only) or from a comma
/// separated `KEY=value` list. Attribute order in the input is not
/// significant; the normalized form is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Issuer {
    attributes: Vec<(String, String)>,
}

impl Issuer {
    /// Parse an issuer identity.
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = |reason: &str| SlipError::InvalidIssuer {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty name"));
        }

        if !trimmed.contains('=') {
            if trimmed.contains(',') {
                return Err(invalid("plain name must not contain ','"));
            }
            return Ok(Self {
                attributes: vec![("CN".to_string(), trimmed.to_string())],
            });
        }

        let mut attributes = Vec::new();
        for part in trimmed.split(',') {
            let part = part.trim();
            let (key, value) = part.split_once('=').ok_or_else(|| {
                invalid("attribute without '='")
            })?;
            let key = key.trim().to_ascii_uppercase();
            let value = value.trim();
            if !ATTRIBUTE_ORDER.contains(&key.as_str()) {
                return Err(SlipError::InvalidIssuer {
                    name: name.to_string(),
                    reason: format!("unknown attribute {key:?}"),
                });
            }
            if value.is_empty() {
                return Err(invalid("empty attribute value"));
            }
            if key == "CN" && attributes.iter().any(|(k, _)| k == "CN") {
                return Err(invalid("duplicate CN attribute"));
            }
            attributes.push((key, value.to_string()));
        }
        if !attributes.iter().any(|(k, _)| k == "CN") {
            return Err(invalid("missing CN attribute"));
        }

        attributes.sort_by(|(ka, va), (kb, vb)| {
            attribute_rank(ka)
                .cmp(&attribute_rank(kb))
                .then_with(|| va.cmp(vb))
        });
        Ok(Self { attributes })
    }

    /// The common name.
    pub fn common_name(&self) -> &str {
        self.attributes
            .iter()
            .find(|(k, _)| k == "CN")
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    /// The deterministic string form: a bare common name when it is the only
    /// attribute, otherwise the ordered `KEY=value` list.
    pub fn normalized(&self) -> String {
        if self.attributes.len() == 1 {
            return self.common_name().to_string();
        }
        self.attributes
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized())
    }
}

fn attribute_rank(key: &str) -> usize {
    ATTRIBUTE_ORDER
        .iter()
        .position(|k| *k == key)
        .unwrap_or(ATTRIBUTE_ORDER.len())
}
