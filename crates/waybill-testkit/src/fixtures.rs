//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a memory-backed manager with
//! generated issuer keys and shortcuts for building chains and forks.

use waybill::{SlipManager, SigningRegistry};
use waybill_core::{
    CommentEntry, Digest, Ed25519KeyPair, HistoryEntry, Issuer, LabelValue, Link,
    ED25519_ALGORITHM,
};
use waybill_store::{ComponentVersionId, MemoryLabelStore};

/// A test fixture: manager, store, and keys for a set of issuers.
pub struct TestFixture {
    pub manager: SlipManager<MemoryLabelStore>,
    pub version: ComponentVersionId,
}

impl TestFixture {
    /// Create a fixture with deterministic keys for the given issuers.
    pub fn new(issuers: &[&str]) -> Self {
        let mut registry = SigningRegistry::new();
        for (i, name) in issuers.iter().enumerate() {
            let issuer = Issuer::parse(name).expect("fixture issuer must parse");
            let mut seed = [0u8; 32];
            seed[0] = i as u8 + 1;
            registry.add_ed25519_keypair(&issuer, &Ed25519KeyPair::from_seed(&seed));
        }
        Self {
            manager: SlipManager::new(MemoryLabelStore::new(), registry),
            version: ComponentVersionId::new("test.de/x", "v1"),
        }
    }

    /// Create a fixture with random keys for the given issuers.
    pub fn with_random_keys(issuers: &[&str]) -> Self {
        let mut registry = SigningRegistry::new();
        for name in issuers {
            let issuer = Issuer::parse(name).expect("fixture issuer must parse");
            registry.add_ed25519_keypair(&issuer, &Ed25519KeyPair::generate());
        }
        Self {
            manager: SlipManager::new(MemoryLabelStore::new(), registry),
            version: ComponentVersionId::new("test.de/x", "v1"),
        }
    }

    /// Append a comment entry to a slip.
    pub fn add_comment(&self, slip: &str, text: &str) -> HistoryEntry {
        self.add_comment_with(slip, text, &[], None)
    }

    /// Append a comment entry with links and/or an explicit parent.
    pub fn add_comment_with(
        &self,
        slip: &str,
        text: &str,
        links: &[Link],
        parent: Option<&Digest>,
    ) -> HistoryEntry {
        self.manager
            .add_entry(
                &self.version,
                slip,
                ED25519_ALGORITHM,
                &CommentEntry::new(text),
                links,
                parent,
            )
            .expect("fixture append must succeed")
    }

    /// Fork a slip at the given entry into two comment branches.
    pub fn fork(&self, slip: &str, at: &Digest, left: &str, right: &str) -> (Digest, Digest) {
        let a = self.add_comment_with(slip, left, &[], Some(at)).digest;
        let b = self.add_comment_with(slip, right, &[], Some(at)).digest;
        (a, b)
    }

    /// The current routing-slip label of the fixture's component version.
    pub fn label(&self) -> LabelValue {
        self.manager
            .label(&self.version)
            .expect("fixture label must load")
    }

    /// Verify a named slip, signatures included.
    pub fn verify(&self, slip: &str) {
        self.manager
            .verify(&self.version, slip, true)
            .expect("fixture slip must verify");
    }
}
