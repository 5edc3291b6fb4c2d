//! # Waybill Core
//!
//! Pure primitives for routing slips: signed, append-only, possibly forking
//! audit trails attached to versioned software components.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`RoutingSlip`] - A named, issuer-bound chain of history entries
//! - [`HistoryEntry`] - One chain link: payload, parent, links, digest,
//!   signature
//! - [`Digest`] - Content address of an entry (SHA-256 over canonical JSON)
//! - [`LabelValue`] - The persisted name-to-entries map and its merge rule
//! - [`SigningRegistry`] - Algorithm handlers and issuer key material
//!
//! ## Canonicalization
//!
//! All entries are digested over deterministic, sorted-key, whitespace-free
//! JSON excluding the digest and signature fields. See [`canonical`].

pub mod canonical;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod history;
pub mod identity;
pub mod label;
pub mod slip;
pub mod types;

pub use canonical::{canonical_bytes, canonical_entry_bytes};
pub use crypto::{
    Ed25519KeyPair, SignatureSpec, Signer, SigningContext, SigningRegistry, Verifier,
    ED25519_ALGORITHM, ED25519_MEDIA_TYPE,
};
pub use entry::{CommentEntry, Entry, EntryKind, EntryTypeRegistry, GenericEntry, COMMENT_TYPE};
pub use error::{CanonicalError, ErrorKind, Result, SlipError};
pub use history::{HistoryEntry, Link, Timestamp};
pub use identity::Issuer;
pub use label::LabelValue;
pub use slip::{RoutingSlip, SlipAccess, SlipIndex};
pub use types::{Digest, DIGEST_ALGORITHM};
