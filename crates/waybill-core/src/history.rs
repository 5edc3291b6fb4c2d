//! History entries: the links of a routing slip's chain of custody.
//!
//! An entry is immutable once appended, with one exception: its signature is
//! cleared when the entry stops being a chain tip. The digest covers
//! everything except the digest and signature fields, so that exception
//! never invalidates content addressing.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::canonical::canonical_entry_bytes;
use crate::crypto::SignatureSpec;
use crate::entry::GenericEntry;
use crate::error::{Result, SlipError};
use crate::types::Digest;

/// A UTC timestamp with second precision.
///
/// Sub-second precision is deliberately dropped: the string form
/// (`2024-01-15T10:00:00Z`) is part of the canonical bytes, and a lossless
/// round-trip through it keeps digests stable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current time, truncated to whole seconds.
    pub fn now() -> Self {
        Self::from_unix(Utc::now().timestamp())
    }

    /// Build from Unix seconds.
    pub fn from_unix(secs: i64) -> Self {
        Self(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }

    /// Parse from the RFC 3339 string form.
    pub fn parse(s: &str) -> Result<Self> {
        let parsed = DateTime::parse_from_rfc3339(s).map_err(|_| SlipError::InvalidTimestamp {
            value: s.to_string(),
        })?;
        Ok(Self::from_unix(parsed.timestamp()))
    }

    /// Unix seconds.
    pub fn unix(&self) -> i64 {
        self.0.timestamp()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({self})")
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse(&s).map_err(D::Error::custom)
    }
}

/// A causal cross-reference to an entry in the same or another slip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Normalized name of the referenced slip.
    pub name: String,

    /// Digest of the referenced entry within that slip.
    pub digest: Digest,
}

impl Link {
    pub fn new(name: impl Into<String>, digest: Digest) -> Self {
        Self {
            name: name.into(),
            digest,
        }
    }
}

/// One link of a slip's chain: payload plus chain metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The typed payload envelope.
    pub payload: GenericEntry,

    /// When the entry was appended.
    pub timestamp: Timestamp,

    /// Digest of the entry this one extends (absent for roots).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Digest>,

    /// Cross-references established by this entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,

    /// Content digest over the canonical form (excluding this field and
    /// the signature).
    pub digest: Digest,

    /// Signature over the digest; present only while the entry is a leaf.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureSpec>,
}

impl HistoryEntry {
    /// Build an unsigned entry, computing its digest.
    pub fn new(
        payload: GenericEntry,
        timestamp: Timestamp,
        parent: Option<Digest>,
        links: Vec<Link>,
    ) -> Result<Self> {
        let mut entry = Self {
            payload,
            timestamp,
            parent,
            links,
            digest: Digest::from_bytes([0; 32]),
            signature: None,
        };
        entry.digest = entry.calculate_digest()?;
        Ok(entry)
    }

    /// Recompute the content digest from the canonical form.
    ///
    /// Equal to the stored `digest` field for untampered entries.
    pub fn calculate_digest(&self) -> Result<Digest> {
        Ok(Digest::hash(&canonical_entry_bytes(self)?))
    }
}
