//! Event validation and the append-only transaction ledger for HerbTrace.
//!
//! Every accepted collection, processing step, quality test and custody
//! transfer becomes one [`LedgerTransaction`] on this ledger. Entries are
//! never mutated or removed. Collection and processing events are gated by
//! the [`Validator`]; a rejected event leaves the ledger untouched.
//!
//! # Architecture
//!
//! - [`validation`] -- The [`Validator`]: stateless business, quantity and
//!   geofence rules that accumulate every violation.
//! - [`ledger`] -- The [`Ledger`] struct: append-only log with recording
//!   methods and per-batch / global queries.
//! - [`transaction`] -- The [`TransactionBuilder`] and hash derivation.
//! - [`simulation`] -- Simulated gas cost ranges per event type.
//!
//! # Batch establishment
//!
//! A batch exists on the ledger once a collection event for it has been
//! accepted. Processing, quality test and transfer records for a batch that
//! was never established are rejected with
//! [`LedgerError::BatchNotEstablished`].
//!
//! # Usage
//!
//! ```
//! use herbtrace_ledger::Ledger;
//! use herbtrace_types::BatchId;
//!
//! let mut ledger = Ledger::with_seed(7);
//! let batch = BatchId::new();
//!
//! // Nothing can be recorded against a batch before its collection.
//! assert!(ledger.record_transfer(batch, "farmer-1", "processor-1").is_err());
//! assert!(ledger.is_empty());
//! ```
//!
//! [`LedgerTransaction`]: herbtrace_types::LedgerTransaction

pub mod ledger;
pub mod simulation;
pub mod transaction;
pub mod validation;

// Re-export primary types at crate root.
pub use ledger::Ledger;
pub use simulation::{GasRange, GasSchedule};
pub use transaction::TransactionBuilder;
pub use validation::Validator;

use herbtrace_types::BatchId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A rejected event: one or more rule violations, in rule order.
///
/// Displays as the flat joined list shown to submitters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Validation failed: {}", .messages.join(", "))]
pub struct ValidationError {
    /// Plain-language rule violations.
    pub messages: Vec<String>,
}

impl ValidationError {
    /// Wrap a list of rule violations.
    pub const fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }
}

/// Errors that can occur when recording ledger transactions.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The submitted event failed validation; nothing was appended.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The batch has no accepted collection event.
    #[error("batch {0} has not been established by a collection event")]
    BatchNotEstablished(BatchId),

    /// A collection event was already accepted for this batch.
    #[error("batch {0} already has a collection event")]
    DuplicateBatch(BatchId),

    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The transaction payload could not be serialized.
    #[error("failed to serialize transaction payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal error that should not occur in normal operation.
    #[error("internal ledger error: {0}")]
    InternalError(&'static str),
}
