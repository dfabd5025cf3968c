//! Shared application state for the trace API.
//!
//! [`AppState`] holds the [`TraceService`] every handler delegates to and
//! the broadcast channel that feeds the live transaction stream.

use std::sync::Arc;

use herbtrace_core::TraceService;
use herbtrace_types::LedgerTransaction;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for accepted transactions.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The trace service owning ledger and registry.
    pub service: Arc<TraceService>,
    /// Broadcast sender for accepted transactions.
    pub tx: broadcast::Sender<LedgerTransaction>,
}

impl AppState {
    /// Create application state around a trace service.
    pub fn new(service: TraceService) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            service: Arc::new(service),
            tx,
        }
    }

    /// Subscribe to the transaction broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerTransaction> {
        self.tx.subscribe()
    }

    /// Publish an accepted transaction to all connected clients.
    ///
    /// Returns the number of receivers that received the message.
    /// Returns 0 if no clients are connected (this is not an error).
    pub fn broadcast(&self, transaction: &LedgerTransaction) -> usize {
        // send returns Err only when there are zero receivers,
        // which is normal when no WebSocket clients are connected.
        self.tx.send(transaction.clone()).unwrap_or(0)
    }
}
