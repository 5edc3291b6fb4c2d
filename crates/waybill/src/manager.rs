//! The slip manager: the unified API over storage and signing.
//!
//! A manager wires a [`LabelStore`], a [`SigningRegistry`], and an
//! [`EntryTypeRegistry`] into the routing-slip operations of a component
//! version: load, append, verify, reconcile. Every append is a full
//! read-modify-write of the routing-slip label; callers serialize appends
//! per (component version, slip name) pair.

use std::sync::Arc;

use tracing::debug;

use waybill_core::{
    Digest, Entry, EntryTypeRegistry, HistoryEntry, LabelValue, Link, RoutingSlip,
    SigningRegistry,
};
use waybill_store::{ComponentVersionId, LabelStore, LabelStoreExt};

use crate::error::Result;

/// Routing-slip operations over component-version labels.
pub struct SlipManager<S: LabelStore> {
    store: Arc<S>,
    registry: Arc<SigningRegistry>,
    entry_types: Arc<EntryTypeRegistry>,
}

impl<S: LabelStore> SlipManager<S> {
    /// Create a manager with the default entry types (comment).
    pub fn new(store: S, registry: SigningRegistry) -> Self {
        Self::with_entry_types(store, registry, EntryTypeRegistry::default())
    }

    /// Create a manager with a custom entry-type registry.
    pub fn with_entry_types(
        store: S,
        registry: SigningRegistry,
        entry_types: EntryTypeRegistry,
    ) -> Self {
        Self {
            store: Arc::new(store),
            registry: Arc::new(registry),
            entry_types: Arc::new(entry_types),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The signing registry.
    pub fn registry(&self) -> &SigningRegistry {
        &self.registry
    }

    /// The entry-type registry.
    pub fn entry_types(&self) -> &EntryTypeRegistry {
        &self.entry_types
    }

    /// Load the routing-slip label of a component version.
    pub fn label(&self, version: &ComponentVersionId) -> Result<LabelValue> {
        Ok(self.store.routing_slips(version)?)
    }

    /// Load one named slip of a component version.
    ///
    /// A name without stored entries yields an empty slip.
    pub fn slip(&self, version: &ComponentVersionId, name: &str) -> Result<RoutingSlip> {
        Ok(self.label(version)?.slip(name)?)
    }

    /// Append an entry to a named slip and persist the updated label.
    pub fn add_entry(
        &self,
        version: &ComponentVersionId,
        name: &str,
        algorithm: &str,
        entry: &dyn Entry,
        links: &[Link],
        parent: Option<&Digest>,
    ) -> Result<HistoryEntry> {
        let mut label = self.label(version)?;
        let mut slip = label.slip(name)?;

        // Registered kinds get their full validation, not just the typed
        // entry's own check.
        let generic = entry.to_generic()?;
        self.entry_types.validate(&generic)?;

        let added = slip
            .add(&self.registry, algorithm, entry, links, parent, &label)?
            .clone();
        debug!(%version, slip = slip.name(), digest = %added.digest, "added routing slip entry");

        label.set_slip(&slip);
        self.store.set_routing_slips(version, &label)?;
        Ok(added)
    }

    /// Verify one named slip of a component version.
    pub fn verify(
        &self,
        version: &ComponentVersionId,
        name: &str,
        check_signatures: bool,
    ) -> Result<()> {
        let label = self.label(version)?;
        let slip = label.slip(name)?;
        slip.verify(&self.registry, check_signatures, &label)?;
        Ok(())
    }

    /// Merge an independently-extended copy of the label into the stored
    /// one. Persists only when the merge changed anything; returns whether
    /// it did.
    pub fn reconcile(&self, version: &ComponentVersionId, incoming: &LabelValue) -> Result<bool> {
        let mut label = self.label(version)?;
        let changed = label.merge(incoming);
        if changed {
            debug!(%version, "reconciled routing slip label");
            self.store.set_routing_slips(version, &label)?;
        }
        Ok(changed)
    }

    /// Human-readable summaries of a slip's entries, in append order.
    pub fn describe(&self, version: &ComponentVersionId, name: &str) -> Result<Vec<String>> {
        let slip = self.slip(version, name)?;
        Ok(slip
            .entries()
            .iter()
            .map(|e| self.entry_types.describe(&e.payload))
            .collect())
    }
}
