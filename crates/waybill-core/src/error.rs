//! Error types for the Waybill core.

use thiserror::Error;

use crate::types::Digest;

/// Broad failure classes surfaced by slip operations.
///
/// Every [`SlipError`] variant belongs to exactly one class; callers that do
/// not care about the concrete variant can branch on [`SlipError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An entry's recomputed digest differs from the stored one.
    ContentTampered,
    /// The chain shape is broken: missing parent, ambiguous fork, bad base.
    Structural,
    /// A cross-referenced slip or entry could not be resolved.
    Reference,
    /// Missing or unknown signing material: algorithm, key, or signature.
    Trust,
    /// Malformed input: issuer identity, payload, or serialized form.
    Validation,
}

/// Errors that can occur while building or verifying routing slips.
#[derive(Debug, Error)]
pub enum SlipError {
    #[error("content digest {actual} does not match {expected} in {slip}")]
    ContentTampered {
        slip: String,
        expected: Digest,
        actual: Digest,
    },

    #[error("parent {parent} of {child} not found in {slip}")]
    MissingParent {
        slip: String,
        parent: Digest,
        child: Digest,
    },

    #[error("no unique base entry found in {slip}")]
    AmbiguousFork { slip: String },

    #[error("entry {digest} not found in {slip}")]
    EntryNotFound { slip: String, digest: Digest },

    #[error("routing slip {name} not found")]
    SlipNotFound { name: String },

    #[error("linked entry {digest} not found in {slip}")]
    LinkTargetNotFound { slip: String, digest: Digest },

    #[error("unknown signature algorithm {0}")]
    UnknownAlgorithm(String),

    #[error("no private key for issuer {0}")]
    NoPrivateKey(String),

    #[error("no key material for issuer {0}")]
    NoKey(String),

    #[error("entry {digest} in {slip} carries no signature")]
    UnsignedLeaf { slip: String, digest: Digest },

    #[error("cannot verify entry {digest}: {reason}")]
    SignatureInvalid { digest: String, reason: String },

    #[error("signing failed for issuer {issuer}: {reason}")]
    SigningFailed { issuer: String, reason: String },

    #[error("invalid issuer identity {name:?}: {reason}")]
    InvalidIssuer { name: String, reason: String },

    #[error("invalid entry payload: {0}")]
    InvalidPayload(String),

    #[error("invalid digest {value:?}: {reason}")]
    InvalidDigest { value: String, reason: String },

    #[error("invalid timestamp {value:?}")]
    InvalidTimestamp { value: String },

    #[error("cannot canonicalize entry: {0}")]
    Canonical(#[from] CanonicalError),
}

impl SlipError {
    /// The failure class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SlipError::ContentTampered { .. } => ErrorKind::ContentTampered,
            SlipError::MissingParent { .. }
            | SlipError::AmbiguousFork { .. }
            | SlipError::EntryNotFound { .. } => ErrorKind::Structural,
            SlipError::SlipNotFound { .. } | SlipError::LinkTargetNotFound { .. } => {
                ErrorKind::Reference
            }
            SlipError::UnknownAlgorithm(_)
            | SlipError::NoPrivateKey(_)
            | SlipError::NoKey(_)
            | SlipError::UnsignedLeaf { .. }
            | SlipError::SignatureInvalid { .. }
            | SlipError::SigningFailed { .. } => ErrorKind::Trust,
            SlipError::InvalidIssuer { .. }
            | SlipError::InvalidPayload(_)
            | SlipError::InvalidDigest { .. }
            | SlipError::InvalidTimestamp { .. }
            | SlipError::Canonical(_) => ErrorKind::Validation,
        }
    }
}

/// Errors produced by the canonical JSON encoder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("float not allowed in canonical form")]
    FloatNotAllowed,

    #[error("canonical form nested deeper than {0} levels")]
    MaxDepthExceeded(usize),

    #[error("cannot encode payload: {0}")]
    Encoding(String),
}

/// Result type for core slip operations.
pub type Result<T> = std::result::Result<T, SlipError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_classification() {
        let e = SlipError::AmbiguousFork {
            slip: "acme.org".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Structural);

        let e = SlipError::SlipNotFound {
            name: "other.org".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Reference);

        let e = SlipError::UnknownAlgorithm("rot13".into());
        assert_eq!(e.kind(), ErrorKind::Trust);

        let e = SlipError::InvalidPayload("missing type".into());
        assert_eq!(e.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_canonical_error_converts() {
        let e: SlipError = CanonicalError::FloatNotAllowed.into();
        assert_eq!(e.kind(), ErrorKind::Validation);
    }
}
