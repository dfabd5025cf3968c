//! Trace API server for HerbTrace.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for submitting collection, processing, quality test
//!   and custody transfer events, and for querying batches, transactions,
//!   provenance timelines and statistics
//! - **Dry-run validation** endpoints that report every rule violation
//!   without touching the ledger
//! - **`WebSocket` endpoint** (`/ws/transactions`) streaming each accepted
//!   ledger transaction via [`tokio::sync::broadcast`]
//!
//! # Architecture
//!
//! Every handler delegates to the shared [`TraceService`], which owns the
//! ledger and batch registry. Handlers that append to the ledger publish
//! the resulting transaction on the broadcast channel once the append has
//! been confirmed.
//!
//! [`TraceService`]: herbtrace_core::TraceService

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
