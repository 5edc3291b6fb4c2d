//! Strong type definitions for Waybill.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use std::fmt;

use crate::error::SlipError;

/// The digest algorithm used for all content addressing.
pub const DIGEST_ALGORITHM: &str = "sha256";

/// A 32-byte content digest, computed as SHA-256(canonical_entry_bytes).
///
/// This is the content-address of a history entry. Two entries with the same
/// content (excluding digest and signature) have the same digest. The string
/// form carries the algorithm prefix: `sha256:<64 hex chars>`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Compute the SHA-256 digest of the given data.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The bare hex encoding, without the algorithm prefix.
    ///
    /// This is the byte sequence that gets signed.
    pub fn encoded(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from the algorithm-prefixed string form.
    pub fn parse(s: &str) -> Result<Self, SlipError> {
        let invalid = |reason: &str| SlipError::InvalidDigest {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let hex_part = match s.split_once(':') {
            Some((DIGEST_ALGORITHM, rest)) => rest,
            Some((algo, _)) => {
                return Err(SlipError::InvalidDigest {
                    value: s.to_string(),
                    reason: format!("unsupported digest algorithm {algo:?}"),
                })
            }
            None => return Err(invalid("missing algorithm prefix")),
        };
        let bytes = hex::decode(hex_part).map_err(|_| invalid("malformed hex"))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| invalid("digest must be 32 bytes"))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.encoded()[..16])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", DIGEST_ALGORITHM, self.encoded())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::parse(&s).map_err(D::Error::custom)
    }
}
