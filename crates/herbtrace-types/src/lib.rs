//! Shared type definitions for the HerbTrace provenance ledger.
//!
//! This crate is the single source of truth for the records exchanged
//! between the ledger, the batch registry and the HTTP API. Types flow
//! downstream to `TypeScript` via `ts-rs` for the collector and consumer
//! front ends.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers and the opaque transaction hash
//! - [`enums`] -- Enumeration types (species, processing, lifecycle, ledger)
//! - [`structs`] -- Events, batches, ledger transactions and statistics

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    BatchStatus, HarvestMethod, NetworkHealth, ProcessType, QualityTestType, QuantityUnit,
    ScoreGrade, SpeciesCategory, SustainabilityStatus, TransactionEventType,
};
pub use ids::{
    BatchId, CollectionEventId, InvalidTxHash, ProcessingEventId, QualityTestId, TX_HASH_HEX_LEN,
    TransactionId, TxHash,
};
pub use structs::{
    Actor, Batch, CollectionEvent, CollectionEventDraft, Coordinate, FinalProduct,
    LedgerTransaction, NetworkStats, ProcessingEvent, ProcessingEventDraft, QualityTest,
    RegistryStats, SiteLocation, Species, TimelineEntry, TimelineStep, ValidationReport,
};
