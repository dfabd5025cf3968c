//! Axum router construction for the trace API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for the field and consumer frontends.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the trace server.
///
/// See [`handlers`] for the endpoint table. The live transaction stream
/// is served at `GET /ws/transactions`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Consumer view
        .route("/verify/{reference}", get(handlers::verify_batch))
        // WebSocket
        .route("/ws/transactions", get(ws::ws_transactions))
        // REST API
        .route("/api/health", get(handlers::health))
        .route("/api/collections", post(handlers::create_collection))
        .route("/api/validate/collection", post(handlers::validate_collection))
        .route("/api/validate/processing", post(handlers::validate_processing))
        .route("/api/batches", get(handlers::list_batches))
        .route("/api/batches/stats", get(handlers::batch_stats))
        .route("/api/batches/{id}", get(handlers::get_batch))
        .route("/api/batches/{id}/processing", post(handlers::add_processing))
        .route("/api/batches/{id}/quality-tests", post(handlers::add_quality_test))
        .route("/api/batches/{id}/transfers", post(handlers::add_transfer))
        .route("/api/batches/{id}/status", put(handlers::set_status))
        .route("/api/batches/{id}/final-product", put(handlers::set_final_product))
        .route("/api/batches/{id}/transactions", get(handlers::batch_transactions))
        .route("/api/batches/{id}/timeline", get(handlers::batch_timeline))
        .route("/api/transactions", get(handlers::list_transactions))
        .route("/api/transactions/{hash}", get(handlers::get_transaction))
        .route("/api/transactions/{hash}/verify", get(handlers::verify_transaction))
        .route("/api/network/stats", get(handlers::network_stats))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
