//! The persisted label value: slip-name to entry-list, and the merge rule.
//!
//! A component version carries all of its routing slips inside one label.
//! Independently-extended copies of that label are reconciled by merging:
//! key union across names, digest-deduplicated entry union within a name.
//! Entries with equal digests have equal content by construction, so the
//! merge never has conflicts to resolve; diverging forks are preserved as
//! multiple leaves.

use std::collections::{btree_map, BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SlipError};
use crate::history::HistoryEntry;
use crate::identity::Issuer;
use crate::slip::{RoutingSlip, SlipAccess};
use crate::types::Digest;

/// All routing slips of one component version, keyed by normalized slip
/// name. This is the unit of storage and of reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelValue {
    slips: BTreeMap<String, Vec<HistoryEntry>>,
}

impl LabelValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slips.is_empty()
    }

    /// The slip names present, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slips.keys().map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.slips.contains_key(name)
    }

    /// The raw entry list stored under a name.
    pub fn get(&self, name: &str) -> Option<&[HistoryEntry]> {
        self.slips.get(name).map(Vec::as_slice)
    }

    /// Replace the entry list stored under a name.
    pub fn set(&mut self, name: impl Into<String>, entries: Vec<HistoryEntry>) {
        self.slips.insert(name.into(), entries);
    }

    /// Store a slip's entries back under its normalized name.
    pub fn set_slip(&mut self, slip: &RoutingSlip) {
        self.set(slip.name().to_string(), slip.entries().to_vec());
    }

    /// Build the named slip from this label.
    ///
    /// An absent name yields an empty slip, ready for its first entry.
    pub fn slip(&self, name: &str) -> Result<RoutingSlip> {
        let issuer = Issuer::parse(name)?;
        let normalized = issuer.normalized();
        let entries = self.slips.get(&normalized).cloned().unwrap_or_default();
        RoutingSlip::from_entries(&normalized, entries)
    }

    /// Merge another copy of this label into this one.
    ///
    /// Returns whether anything changed, so callers can skip persisting
    /// no-op reconciliations.
    pub fn merge(&mut self, other: &LabelValue) -> bool {
        let mut changed = false;
        for (name, theirs) in &other.slips {
            match self.slips.entry(name.clone()) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(theirs.clone());
                    changed = true;
                }
                btree_map::Entry::Occupied(mut slot) => {
                    let ours = slot.get_mut();
                    let mut seen: HashSet<Digest> =
                        ours.iter().map(|e| e.digest).collect();
                    for entry in theirs {
                        if seen.insert(entry.digest) {
                            ours.push(entry.clone());
                            changed = true;
                        }
                    }
                }
            }
        }
        if changed {
            debug!(names = self.slips.len(), "merged routing slip label");
        }
        changed
    }
}

impl SlipAccess for LabelValue {
    /// Resolve a linked slip. Unlike [`LabelValue::slip`], an absent name is
    /// an error here: a link must point at a slip that exists.
    fn get(&self, name: &str) -> Result<RoutingSlip> {
        let issuer = Issuer::parse(name)?;
        let normalized = issuer.normalized();
        let entries = self
            .slips
            .get(&normalized)
            .cloned()
            .ok_or_else(|| SlipError::SlipNotFound {
                name: normalized.clone(),
            })?;
        RoutingSlip::from_entries(&normalized, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::crypto::{Ed25519KeyPair, SigningRegistry, ED25519_ALGORITHM};
    use crate::entry::CommentEntry;

    fn registry_for(issuers: &[&str]) -> SigningRegistry {
        let mut registry = SigningRegistry::new();
        for (i, name) in issuers.iter().enumerate() {
            let issuer = Issuer::parse(name).unwrap();
            let mut seed = [0u8; 32];
            seed[0] = i as u8 + 1;
            registry.add_ed25519_keypair(&issuer, &Ed25519KeyPair::from_seed(&seed));
        }
        registry
    }

    fn add_comment(
        label: &mut LabelValue,
        registry: &SigningRegistry,
        name: &str,
        text: &str,
        parent: Option<&Digest>,
    ) -> Digest {
        let mut slip = label.slip(name).unwrap();
        let access = label.clone();
        let digest = slip
            .add(
                registry,
                ED25519_ALGORITHM,
                &CommentEntry::new(text),
                &[],
                parent,
                &access,
            )
            .unwrap()
            .digest;
        label.set_slip(&slip);
        digest
    }

    #[test]
    fn test_label_access_distinguishes_absent() {
        let label = LabelValue::new();
        // Building a new slip from an absent name works...
        assert!(label.slip("acme.org").unwrap().is_empty());
        // ...but resolving it as a link target does not.
        assert!(matches!(
            SlipAccess::get(&label, "acme.org"),
            Err(SlipError::SlipNotFound { .. })
        ));
    }

    #[test]
    fn test_label_normalizes_names() {
        let mut label = LabelValue::new();
        let registry = registry_for(&["acme.org"]);
        add_comment(&mut label, &registry, "CN=acme.org", "start", None);
        assert!(label.has("acme.org"));
        assert_eq!(label.names().collect::<Vec<_>>(), vec!["acme.org"]);
    }

    #[test]
    fn test_merge_distinct_names_is_union() {
        let registry = registry_for(&["acme.org", "other.org"]);
        let mut ours = LabelValue::new();
        add_comment(&mut ours, &registry, "acme.org", "ours", None);
        let mut theirs = LabelValue::new();
        add_comment(&mut theirs, &registry, "other.org", "theirs", None);

        assert!(ours.merge(&theirs));
        assert_eq!(
            ours.names().collect::<Vec<_>>(),
            vec!["acme.org", "other.org"]
        );
    }

    #[test]
    fn test_merge_deduplicates_on_digest() {
        let registry = registry_for(&["acme.org"]);
        let mut ours = LabelValue::new();
        add_comment(&mut ours, &registry, "acme.org", "shared", None);
        let theirs = ours.clone();

        assert!(!ours.merge(&theirs));
        assert_eq!(ours.get("acme.org").unwrap().len(), 1);
    }

    #[test]
    fn test_merge_preserves_diverged_forks() {
        let registry = registry_for(&["acme.org"]);

        // A common ancestor, then two copies extended independently.
        let mut base = LabelValue::new();
        let e1 = add_comment(&mut base, &registry, "acme.org", "start", None);

        let mut copy_a = base.clone();
        let e2a = add_comment(&mut copy_a, &registry, "acme.org", "branch a", None);
        let mut copy_b = base.clone();
        let e2b = add_comment(&mut copy_b, &registry, "acme.org", "branch b", None);

        assert!(copy_a.merge(&copy_b));
        let entries = copy_a.get("acme.org").unwrap();
        assert_eq!(entries.len(), 3);

        let merged = copy_a.slip("acme.org").unwrap();
        let leaves = merged.leaves();
        assert_eq!(leaves.len(), 2);
        assert!(leaves.contains(&e2a));
        assert!(leaves.contains(&e2b));
        assert!(!leaves.contains(&e1));

        // Both branches stay independently verifiable.
        merged.verify(&registry, true, &copy_a).unwrap();
    }

    #[test]
    fn test_merge_is_idempotent_and_symmetric_on_content() {
        let registry = registry_for(&["acme.org"]);
        let mut base = LabelValue::new();
        add_comment(&mut base, &registry, "acme.org", "start", None);

        let mut copy_a = base.clone();
        add_comment(&mut copy_a, &registry, "acme.org", "a", None);
        let mut copy_b = base.clone();
        add_comment(&mut copy_b, &registry, "acme.org", "b", None);

        let mut ab = copy_a.clone();
        ab.merge(&copy_b);
        let mut ba = copy_b.clone();
        ba.merge(&copy_a);

        // Merging again changes nothing.
        assert!(!ab.merge(&copy_b));

        // Entry sets agree regardless of merge direction.
        let digests = |label: &LabelValue| {
            let mut v: Vec<Digest> = label
                .get("acme.org")
                .unwrap()
                .iter()
                .map(|e| e.digest)
                .collect();
            v.sort_by_key(|d| d.encoded());
            v
        };
        assert_eq!(digests(&ab), digests(&ba));
    }

    #[test]
    fn test_label_serde_roundtrip() {
        let registry = registry_for(&["acme.org"]);
        let mut label = LabelValue::new();
        add_comment(&mut label, &registry, "acme.org", "start", None);
        add_comment(&mut label, &registry, "acme.org", "next", None);

        let json = serde_json::to_string(&label).unwrap();
        let back: LabelValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, label);

        // The label serializes as a plain name-to-entries object.
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.as_object().unwrap().contains_key("acme.org"));

        back.slip("acme.org")
            .unwrap()
            .verify(&registry, true, &back)
            .unwrap();
    }
}
