//! Error types for the registry and the trace service.

use herbtrace_ledger::LedgerError;
use herbtrace_types::{BatchId, BatchStatus, TxHash};

/// Errors from [`BatchRegistry`](crate::registry::BatchRegistry) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No batch with this identifier is registered.
    #[error("batch {0} not found")]
    BatchNotFound(BatchId),

    /// A batch with this identifier is already registered.
    #[error("batch {0} is already registered")]
    DuplicateBatch(BatchId),

    /// The requested status is earlier in the lifecycle than the current one.
    #[error("batch {batch_id} cannot move from {from:?} back to {to:?}")]
    StatusRegression {
        /// The batch being updated.
        batch_id: BatchId,
        /// Current status.
        from: BatchStatus,
        /// Requested status.
        to: BatchStatus,
    },
}

/// Errors returned by [`TraceService`](crate::service::TraceService).
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// Ledger rejection (validation, unknown or duplicate batch).
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Registry rejection.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The simulated confirmation did not complete in time; nothing was
    /// appended.
    #[error("transaction confirmation timed out after {timeout_ms} ms")]
    ConfirmationTimeout {
        /// The configured timeout.
        timeout_ms: u64,
    },

    /// No transaction carries this hash.
    #[error("transaction {0} not found")]
    TransactionNotFound(TxHash),
}

impl TraceError {
    /// Whether the caller should correct the input and resubmit.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Ledger(LedgerError::Validation(_)))
    }

    /// Whether a referenced batch or transaction does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Ledger(LedgerError::BatchNotEstablished(_))
                | Self::Registry(RegistryError::BatchNotFound(_))
                | Self::TransactionNotFound(_)
        )
    }

    /// Whether the request conflicts with the current batch state.
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Ledger(LedgerError::DuplicateBatch(_))
                | Self::Registry(
                    RegistryError::DuplicateBatch(_) | RegistryError::StatusRegression { .. }
                )
        )
    }

    /// The flat list of rule violations, for validation failures.
    pub fn validation_messages(&self) -> Option<&[String]> {
        match self {
            Self::Ledger(LedgerError::Validation(err)) => Some(&err.messages),
            _ => None,
        }
    }
}
