//! `WebSocket` handler for the live transaction feed.
//!
//! Clients connect to `GET /ws/transactions` and receive each accepted
//! [`LedgerTransaction`](herbtrace_types::LedgerTransaction) as a JSON text
//! frame. If a client falls behind, lagged messages are skipped and the
//! client resumes from the most recent transaction.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming transactions.
pub async fn ws_transactions(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("transaction feed client connected");

    let mut rx = state.subscribe();

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(transaction) => {
                        let json = match serde_json::to_string(&transaction) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!(error = %e, "failed to serialize transaction");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            debug!("transaction feed client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "transaction feed client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("broadcast channel closed, shutting down transaction feed");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("transaction feed client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(error = %e, "transaction feed socket error");
                        return;
                    }
                    // Client-sent text and binary frames are ignored.
                    _ => {}
                }
            }
        }
    }
}
