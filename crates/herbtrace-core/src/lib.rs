//! Batch registry, scoring, monitoring and the trace service for HerbTrace.
//!
//! This crate sits above the ledger. It keeps the per-batch view that
//! consumers and dashboards read, derives sustainability scores and
//! provenance timelines, and owns the [`TraceService`] that serializes
//! every write through one lock.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `herbtrace-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- [`RegistryError`] and the service-level [`TraceError`].
//! - [`monitor`] -- Network statistics over the ledger.
//! - [`registry`] -- The [`BatchRegistry`]: batches keyed by identifier and
//!   QR reference, with a forward-only status lifecycle.
//! - [`score`] -- The 0-100 sustainability score.
//! - [`service`] -- The [`TraceService`] tying ledger and registry together
//!   behind simulated network confirmation.
//! - [`timeline`] -- Consumer-facing provenance timeline.

pub mod config;
pub mod error;
pub mod monitor;
pub mod registry;
pub mod score;
pub mod service;
pub mod timeline;

pub use config::{ConfigError, TraceConfig};
pub use error::{RegistryError, TraceError};
pub use monitor::{classify_health, network_stats};
pub use registry::BatchRegistry;
pub use score::compute_sustainability_score;
pub use service::{Receipt, TraceService};
pub use timeline::provenance_timeline;
