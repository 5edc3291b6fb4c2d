//! Store trait: the abstract interface for component-version labels.
//!
//! Labels are opaque JSON values to the store; typed decoding happens in the
//! layer above. Implementations must be safe to share across threads, but
//! offer no cross-call transactions: callers serialize read-modify-write
//! cycles per component version themselves.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use waybill_core::LabelValue;

use crate::error::{Result, StoreError};

/// Name of the label holding a component version's routing slips.
pub const ROUTING_SLIP_LABEL: &str = "routing-slips";

/// Identity of one component version: the persistence key for labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentVersionId {
    /// Component name, e.g. `acme.org/widget`.
    pub component: String,

    /// Version string, e.g. `1.2.0`.
    pub version: String,
}

impl ComponentVersionId {
    pub fn new(component: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ComponentVersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.component, self.version)
    }
}

/// Synchronous access to the labels of component versions.
///
/// # Design Notes
///
/// - **Opaque values**: the store neither validates nor interprets label
///   content.
/// - **Last write wins**: `set_label` replaces the stored value; merging
///   concurrent copies is the caller's concern.
/// - **Missing is not an error**: reading an absent label yields `None`.
pub trait LabelStore: Send + Sync {
    /// Read a label of a component version.
    fn get_label(&self, version: &ComponentVersionId, name: &str) -> Result<Option<Value>>;

    /// Write a label of a component version, replacing any existing value.
    fn set_label(&self, version: &ComponentVersionId, name: &str, value: Value) -> Result<()>;
}

/// Extension trait: typed access to the routing-slip label.
pub trait LabelStoreExt: LabelStore {
    /// Load the routing-slip label; an absent label is an empty one.
    fn routing_slips(&self, version: &ComponentVersionId) -> Result<LabelValue> {
        match self.get_label(version, ROUTING_SLIP_LABEL)? {
            None => Ok(LabelValue::new()),
            Some(value) => {
                serde_json::from_value(value).map_err(|e| StoreError::MalformedLabel {
                    version: version.to_string(),
                    name: ROUTING_SLIP_LABEL.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Persist the routing-slip label.
    fn set_routing_slips(&self, version: &ComponentVersionId, label: &LabelValue) -> Result<()> {
        let value = serde_json::to_value(label).map_err(|e| StoreError::MalformedLabel {
            version: version.to_string(),
            name: ROUTING_SLIP_LABEL.to_string(),
            reason: e.to_string(),
        })?;
        self.set_label(version, ROUTING_SLIP_LABEL, value)
    }
}

impl<S: LabelStore + ?Sized> LabelStoreExt for S {}
