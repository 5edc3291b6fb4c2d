//! Error types for the unified Waybill API.

use thiserror::Error;

use waybill_core::SlipError;
use waybill_store::StoreError;

/// Errors that can occur during manager operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Slip-level error: tamper, structure, reference, trust, validation.
    #[error("routing slip error: {0}")]
    Slip(#[from] SlipError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl ManagerError {
    /// The slip failure class, when this wraps a slip error.
    pub fn slip_kind(&self) -> Option<waybill_core::ErrorKind> {
        match self {
            ManagerError::Slip(e) => Some(e.kind()),
            ManagerError::Store(_) => None,
        }
    }
}

/// Result type for manager operations.
pub type Result<T> = std::result::Result<T, ManagerError>;
