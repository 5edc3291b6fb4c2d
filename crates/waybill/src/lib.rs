//! # Waybill
//!
//! Routing slips for versioned software components: tamper-evident, signed,
//! append-only audit trails stored in component-version labels.
//!
//! ## Overview
//!
//! A routing slip is a named history of typed events owned by one issuer.
//! Entries are content-addressed, chained through parent digests, may fork,
//! and may cross-reference entries in other slips. Only the current chain
//! tips carry signatures; appending moves the signature to the new tip.
//! Independently-extended copies reconcile by digest-deduplicated union.
//!
//! ## Usage
//!
//! ```rust
//! use waybill::{SlipManager, ComponentVersionId};
//! use waybill::core::{CommentEntry, Ed25519KeyPair, Issuer, SigningRegistry, ED25519_ALGORITHM};
//! use waybill::store::MemoryLabelStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let issuer = Issuer::parse("acme.org")?;
//! let mut registry = SigningRegistry::new();
//! registry.add_ed25519_keypair(&issuer, &Ed25519KeyPair::generate());
//!
//! let manager = SlipManager::new(MemoryLabelStore::new(), registry);
//! let version = ComponentVersionId::new("acme.org/widget", "1.0.0");
//!
//! manager.add_entry(
//!     &version,
//!     "acme.org",
//!     ED25519_ALGORITHM,
//!     &CommentEntry::new("released"),
//!     &[],
//!     None,
//! )?;
//! manager.verify(&version, "acme.org", true)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! - `waybill::core` - Core primitives (RoutingSlip, HistoryEntry, ...)
//! - `waybill::store` - Label storage abstraction

pub mod error;
pub mod manager;

// Re-export component crates
pub use waybill_core as core;
pub use waybill_store as store;

// Re-export main types for convenience
pub use error::{ManagerError, Result};
pub use manager::SlipManager;

// Re-export commonly used types
pub use waybill_core::{
    CommentEntry, Digest, Entry, EntryTypeRegistry, GenericEntry, HistoryEntry, Issuer,
    LabelValue, Link, RoutingSlip, SigningRegistry, SlipAccess, Timestamp,
};
pub use waybill_store::{ComponentVersionId, LabelStore, MemoryLabelStore, ROUTING_SLIP_LABEL};
