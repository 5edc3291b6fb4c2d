//! Routing slips: named, issuer-bound, append-only entry chains.
//!
//! A slip is assembled from a persisted label snapshot, mutated by
//! sequential `add` calls, and persisted again by the caller. There is no
//! internal locking; concurrent copies of the same logical slip reconcile
//! through the label merge rule.
//!
//! The chain is not necessarily linear. Appending with an explicit parent
//! can fork it, after which several leaves coexist until they are extended.
//! Only leaves carry signatures; extending an entry moves the signature to
//! the new tip.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::crypto::{SigningContext, SigningRegistry};
use crate::entry::Entry;
use crate::error::{Result, SlipError};
use crate::history::{HistoryEntry, Link, Timestamp};
use crate::identity::Issuer;
use crate::types::Digest;

/// Resolves named slips for cross-document link verification.
///
/// Passed explicitly into `verify` and `add`; the core never consults
/// ambient state to find other slips.
pub trait SlipAccess {
    fn get(&self, name: &str) -> Result<RoutingSlip>;
}

/// A named, issuer-bound routing slip.
#[derive(Debug, Clone)]
pub struct RoutingSlip {
    name: String,
    issuer: Issuer,
    entries: Vec<HistoryEntry>,
    by_digest: HashMap<Digest, usize>,
}

impl RoutingSlip {
    /// An empty slip for the given issuer name.
    pub fn new(name: &str) -> Result<Self> {
        Self::from_entries(name, Vec::new())
    }

    /// Build a slip from a persisted entry list.
    ///
    /// The name is parsed and normalized as an issuer identity. Should the
    /// list contain several entries under one digest, the last occurrence
    /// wins in the index.
    pub fn from_entries(name: &str, entries: Vec<HistoryEntry>) -> Result<Self> {
        let issuer = Issuer::parse(name)?;
        let name = issuer.normalized();
        let mut by_digest = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            by_digest.insert(entry.digest, pos);
        }
        Ok(Self {
            name,
            issuer,
            entries,
            by_digest,
        })
    }

    /// The normalized slip name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning issuer identity.
    pub fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    /// The entries in append order.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at the given append position.
    pub fn get(&self, pos: usize) -> Option<&HistoryEntry> {
        self.entries.get(pos)
    }

    /// Entry with the given digest.
    pub fn lookup(&self, digest: &Digest) -> Option<&HistoryEntry> {
        self.by_digest.get(digest).map(|&pos| &self.entries[pos])
    }

    /// A borrowed index view over this slip's entries.
    pub fn index(&self) -> SlipIndex<'_> {
        SlipIndex {
            name: &self.name,
            entries: &self.entries,
            by_digest: &self.by_digest,
        }
    }

    /// Current chain tips: digests never referenced as a parent.
    pub fn leaves(&self) -> Vec<Digest> {
        self.index().leaves()
    }

    /// Verify the whole chain from every leaf.
    ///
    /// With `check_signatures`, every leaf must carry a signature that
    /// verifies against the issuer's key material.
    pub fn verify(
        &self,
        registry: &SigningRegistry,
        check_signatures: bool,
        access: &dyn SlipAccess,
    ) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        debug!(slip = %self.name, entries = self.entries.len(), "verifying routing slip");
        self.index()
            .verify(registry, &self.issuer, check_signatures, access)
    }

    /// Append a new entry to the chain.
    ///
    /// The existing chain is verified (signatures included) before any
    /// mutation; on any failure the slip is left untouched. On success the
    /// base entry's signature moves to the new tip and the new entry is
    /// returned. Persisting the updated label is the caller's concern.
    pub fn add(
        &mut self,
        registry: &SigningRegistry,
        algorithm: &str,
        entry: &dyn Entry,
        links: &[Link],
        parent: Option<&Digest>,
        access: &dyn SlipAccess,
    ) -> Result<&HistoryEntry> {
        let signer = registry
            .signer(algorithm)
            .ok_or_else(|| SlipError::UnknownAlgorithm(algorithm.to_string()))?;
        let private = registry
            .resolve_private_key(&self.issuer)
            .ok_or_else(|| SlipError::NoPrivateKey(self.issuer.normalized()))?;
        let public = registry.public_key(&self.issuer);

        // Refuse to extend a chain that no longer verifies.
        self.verify(registry, true, access)?;

        entry.validate()?;
        let payload = entry.to_generic()?;

        let base_pos = self.base_position(parent)?;
        let base_digest = base_pos.map(|pos| self.entries[pos].digest);

        // The link implied by the parent edge is elided; every other link
        // must resolve, and foreign slips must verify before being linked.
        let mut kept = Vec::with_capacity(links.len());
        for link in links {
            if link.name == self.name && Some(link.digest) == base_digest {
                continue;
            }
            if link.name == self.name {
                if !self.by_digest.contains_key(&link.digest) {
                    return Err(SlipError::LinkTargetNotFound {
                        slip: self.name.clone(),
                        digest: link.digest,
                    });
                }
            } else {
                let linked = access.get(&link.name)?;
                linked.verify(registry, true, access)?;
                if linked.lookup(&link.digest).is_none() {
                    return Err(SlipError::LinkTargetNotFound {
                        slip: link.name.clone(),
                        digest: link.digest,
                    });
                }
            }
            kept.push(link.clone());
        }

        let mut new_entry = HistoryEntry::new(payload, Timestamp::now(), base_digest, kept)?;
        let context = SigningContext {
            private_key: Some(private),
            public_key: public,
            issuer: &self.issuer,
        };
        new_entry.signature = Some(signer.sign(&new_entry.digest.encoded(), &context)?);

        debug!(slip = %self.name, digest = %new_entry.digest, "appending history entry");

        // Keep signatures for leaves only.
        if let Some(pos) = base_pos {
            self.entries[pos].signature = None;
        }
        let pos = self.entries.len();
        self.by_digest.insert(new_entry.digest, pos);
        self.entries.push(new_entry);
        Ok(&self.entries[pos])
    }

    /// Pick the entry the new one will extend.
    fn base_position(&self, parent: Option<&Digest>) -> Result<Option<usize>> {
        if let Some(digest) = parent {
            let pos = self
                .by_digest
                .get(digest)
                .copied()
                .ok_or_else(|| SlipError::EntryNotFound {
                    slip: self.name.clone(),
                    digest: *digest,
                })?;
            return Ok(Some(pos));
        }
        if self.entries.is_empty() {
            return Ok(None);
        }
        let leaves = self.index().leaves();
        if leaves.len() == 1 {
            return Ok(Some(self.by_digest[&leaves[0]]));
        }
        // Several leaves: fall back to the most recently appended entry,
        // but only if it is itself a current tip.
        let last = self.entries.len() - 1;
        if leaves.contains(&self.entries[last].digest) {
            return Ok(Some(last));
        }
        Err(SlipError::AmbiguousFork {
            slip: self.name.clone(),
        })
    }
}

/// A borrowed digest-to-entry view over one slip's entries.
#[derive(Debug, Clone, Copy)]
pub struct SlipIndex<'a> {
    name: &'a str,
    entries: &'a [HistoryEntry],
    by_digest: &'a HashMap<Digest, usize>,
}

impl<'a> SlipIndex<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry with the given digest.
    pub fn lookup(&self, digest: &Digest) -> Option<&'a HistoryEntry> {
        self.by_digest.get(digest).map(|&pos| &self.entries[pos])
    }

    /// Digests never referenced as a parent, in append order.
    pub fn leaves(&self) -> Vec<Digest> {
        let parents: HashSet<&Digest> = self
            .entries
            .iter()
            .filter_map(|e| e.parent.as_ref())
            .collect();
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| e.digest)
            .filter(|d| !parents.contains(d) && seen.insert(*d))
            .collect()
    }

    /// Verify every chain reachable from the current leaves.
    pub fn verify(
        &self,
        registry: &SigningRegistry,
        issuer: &Issuer,
        check_signatures: bool,
        access: &dyn SlipAccess,
    ) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let leaves = self.leaves();

        if check_signatures {
            let public = registry.public_key(issuer);
            let private = registry.resolve_private_key(issuer);
            if public.is_none() && private.is_none() {
                return Err(SlipError::NoKey(issuer.normalized()));
            }
            for digest in &leaves {
                let entry = self.lookup(digest).ok_or_else(|| SlipError::EntryNotFound {
                    slip: self.name.to_string(),
                    digest: *digest,
                })?;
                let signature =
                    entry
                        .signature
                        .as_ref()
                        .ok_or_else(|| SlipError::UnsignedLeaf {
                            slip: self.name.to_string(),
                            digest: *digest,
                        })?;
                let verifier = registry
                    .verifier(&signature.algorithm)
                    .ok_or_else(|| SlipError::UnknownAlgorithm(signature.algorithm.clone()))?;
                let context = SigningContext {
                    private_key: private,
                    public_key: public,
                    issuer,
                };
                verifier.verify(&digest.encoded(), signature, &context)?;
            }
        }

        // One visited set across all leaves: shared ancestors and cyclic
        // cross-links are walked at most once.
        let mut visited = HashSet::new();
        for digest in &leaves {
            self.verify_from(digest, access, &mut visited)?;
        }
        Ok(())
    }

    /// Walk backwards from `start`, recomputing digests and following links.
    pub fn verify_from(
        &self,
        start: &Digest,
        access: &dyn SlipAccess,
        visited: &mut HashSet<Digest>,
    ) -> Result<()> {
        let mut current = self
            .lookup(start)
            .ok_or_else(|| SlipError::LinkTargetNotFound {
                slip: self.name.to_string(),
                digest: *start,
            })?;
        loop {
            if !visited.insert(current.digest) {
                return Ok(());
            }
            let computed = current.calculate_digest()?;
            if computed != current.digest {
                return Err(SlipError::ContentTampered {
                    slip: self.name.to_string(),
                    expected: current.digest,
                    actual: computed,
                });
            }
            for link in &current.links {
                if link.name == self.name {
                    self.verify_from(&link.digest, access, visited)?;
                } else {
                    let linked = access.get(&link.name)?;
                    linked.index().verify_from(&link.digest, access, visited)?;
                }
            }
            match &current.parent {
                None => break,
                Some(parent) => {
                    let child = current.digest;
                    current = self.lookup(parent).ok_or_else(|| SlipError::MissingParent {
                        slip: self.name.to_string(),
                        parent: *parent,
                        child,
                    })?;
                }
            }
        }
        Ok(())
    }
}
