//! REST API endpoint handlers for the trace server.
//!
//! All handlers delegate to the shared [`TraceService`] via [`AppState`].
//! Handlers that append to the ledger broadcast the accepted transaction
//! to `WebSocket` subscribers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/health` | Liveness and ledger size |
//! | `POST` | `/api/collections` | Submit a collection event (creates a batch) |
//! | `POST` | `/api/validate/collection` | Dry-run collection validation |
//! | `POST` | `/api/validate/processing` | Dry-run processing validation |
//! | `GET` | `/api/batches` | List batches, newest first |
//! | `GET` | `/api/batches/stats` | Registry statistics |
//! | `GET` | `/api/batches/{id}` | Single batch |
//! | `POST` | `/api/batches/{id}/processing` | Submit a processing step |
//! | `POST` | `/api/batches/{id}/quality-tests` | Record a quality test |
//! | `POST` | `/api/batches/{id}/transfers` | Record a custody transfer |
//! | `PUT` | `/api/batches/{id}/status` | Move a batch forward in its lifecycle |
//! | `PUT` | `/api/batches/{id}/final-product` | Attach the final product |
//! | `GET` | `/api/batches/{id}/transactions` | Batch transaction history |
//! | `GET` | `/api/batches/{id}/timeline` | Provenance timeline |
//! | `GET` | `/api/transactions` | All transactions, newest first |
//! | `GET` | `/api/transactions/{hash}` | Single transaction |
//! | `GET` | `/api/transactions/{hash}/verify` | Confirmation check |
//! | `GET` | `/api/network/stats` | Network statistics |
//! | `GET` | `/verify/{reference}` | Consumer view by batch id or QR reference |
//!
//! [`TraceService`]: herbtrace_core::TraceService

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::debug;

use herbtrace_core::Receipt;
use herbtrace_core::timeline::provenance_timeline;
use herbtrace_types::{
    BatchId, BatchStatus, CollectionEventDraft, FinalProduct, ProcessingEventDraft, QualityTest,
    ScoreGrade, TxHash,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Default page size for list endpoints.
const DEFAULT_LIMIT: usize = 100;

/// Largest page size a client may request.
const MAX_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// Request and query structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/batches` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct BatchesQuery {
    /// Only return batches at this lifecycle stage.
    pub status: Option<BatchStatus>,
    /// Maximum number of batches to return (default 100).
    pub limit: Option<usize>,
}

/// Query parameters for the `GET /api/transactions` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct TransactionsQuery {
    /// Maximum number of transactions to return (default 100).
    pub limit: Option<usize>,
}

/// Body of `POST /api/batches/{id}/quality-tests`.
#[derive(Debug, serde::Deserialize)]
pub struct QualityTestRequest {
    /// The user recording the result.
    pub user_id: String,
    /// The test result.
    pub test: QualityTest,
}

/// Body of `POST /api/batches/{id}/transfers`.
#[derive(Debug, serde::Deserialize)]
pub struct TransferRequest {
    /// Current custodian.
    pub from_user_id: String,
    /// New custodian.
    pub to_user_id: String,
}

/// Body of `PUT /api/batches/{id}/status`.
#[derive(Debug, serde::Deserialize)]
pub struct StatusUpdate {
    /// Requested lifecycle stage.
    pub status: BatchStatus,
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

/// Liveness probe.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.service.network_stats().await;
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "transactions": stats.total_transactions,
        "batches": stats.total_batches,
    }))
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

/// Submit a collection event. On acceptance a new batch is registered and
/// the receipt is returned with `201 Created`.
pub async fn create_collection(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<CollectionEventDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state.service.submit_collection(draft).await?;
    Ok((StatusCode::CREATED, Json(published(&state, receipt))))
}

/// Submit a processing step for a batch.
pub async fn add_processing(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(draft): Json<ProcessingEventDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let batch_id = parse_batch_id(&id_str)?;
    let receipt = state.service.submit_processing(batch_id, draft).await?;
    Ok((StatusCode::CREATED, Json(published(&state, receipt))))
}

/// Record a laboratory test result for a batch.
pub async fn add_quality_test(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(body): Json<QualityTestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let batch_id = parse_batch_id(&id_str)?;
    let receipt = state
        .service
        .record_quality_test(batch_id, &body.user_id, body.test)
        .await?;
    Ok((StatusCode::CREATED, Json(published(&state, receipt))))
}

/// Record a custody transfer for a batch.
pub async fn add_transfer(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(body): Json<TransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let batch_id = parse_batch_id(&id_str)?;
    let receipt = state
        .service
        .record_transfer(batch_id, &body.from_user_id, &body.to_user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(published(&state, receipt))))
}

// ---------------------------------------------------------------------------
// Dry-run validation
// ---------------------------------------------------------------------------

/// Validate a collection draft and return `{valid, errors}`.
pub async fn validate_collection(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<CollectionEventDraft>,
) -> impl IntoResponse {
    Json(state.service.validate_collection(&draft))
}

/// Validate a processing draft and return `{valid, errors}`.
pub async fn validate_processing(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ProcessingEventDraft>,
) -> impl IntoResponse {
    Json(state.service.validate_processing(&draft))
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

/// List batches, newest first, optionally filtered by status.
pub async fn list_batches(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BatchesQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let batches: Vec<_> = state
        .service
        .batches()
        .await
        .into_iter()
        .filter(|b| params.status.is_none_or(|s| b.status == s))
        .take(limit)
        .collect();

    Json(serde_json::json!({
        "count": batches.len(),
        "batches": batches,
    }))
}

/// Registry-wide statistics.
pub async fn batch_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.registry_stats().await)
}

/// Return a single batch.
pub async fn get_batch(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let batch_id = parse_batch_id(&id_str)?;
    Ok(Json(state.service.batch(batch_id).await?))
}

/// Move a batch to a later lifecycle stage.
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(body): Json<StatusUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let batch_id = parse_batch_id(&id_str)?;
    Ok(Json(state.service.set_batch_status(batch_id, body.status).await?))
}

/// Attach the final product descriptor to a batch.
pub async fn set_final_product(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(product): Json<FinalProduct>,
) -> Result<impl IntoResponse, ApiError> {
    let batch_id = parse_batch_id(&id_str)?;
    Ok(Json(state.service.set_final_product(batch_id, product).await?))
}

/// Transaction history of a batch, oldest first.
pub async fn batch_transactions(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let batch_id = parse_batch_id(&id_str)?;
    let transactions = state.service.batch_transactions(batch_id).await;
    Ok(Json(serde_json::json!({
        "batch_id": batch_id,
        "count": transactions.len(),
        "transactions": transactions,
    })))
}

/// Provenance timeline of a batch.
pub async fn batch_timeline(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let batch_id = parse_batch_id(&id_str)?;
    Ok(Json(state.service.provenance(batch_id).await?))
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// All transactions, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionsQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let mut transactions = state.service.all_transactions().await;
    transactions.truncate(limit);

    Json(serde_json::json!({
        "count": transactions.len(),
        "transactions": transactions,
    }))
}

/// Return a single transaction by hash.
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(hash_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let hash = parse_tx_hash(&hash_str)?;
    Ok(Json(state.service.transaction(&hash).await?))
}

/// Whether a hash names a confirmed transaction. Unknown hashes answer
/// `false` rather than `404`.
pub async fn verify_transaction(
    State(state): State<Arc<AppState>>,
    Path(hash_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let hash = parse_tx_hash(&hash_str)?;
    let confirmed = state.service.verify_transaction(&hash).await?;
    Ok(Json(serde_json::json!({
        "tx_hash": hash,
        "confirmed": confirmed,
    })))
}

/// Ledger-wide network statistics.
pub async fn network_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.network_stats().await)
}

// ---------------------------------------------------------------------------
// GET /verify/{reference} -- consumer view
// ---------------------------------------------------------------------------

/// The page a consumer reaches by scanning a batch's QR label: the batch,
/// its graded score and its provenance timeline.
pub async fn verify_batch(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let batch = state
        .service
        .batch_by_qr(&reference)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("batch {reference}")))?;
    debug!(batch_id = %batch.id, "consumer verification");

    let timeline = provenance_timeline(&batch);
    Ok(Json(serde_json::json!({
        "grade": ScoreGrade::from_score(batch.sustainability_score),
        "traceability_complete": batch.traceability_complete(),
        "timeline": timeline,
        "batch": batch,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Push the receipt's transaction to live subscribers and hand the receipt
/// back for the response body.
fn published(state: &AppState, receipt: Receipt) -> Receipt {
    let receivers = state.broadcast(&receipt.transaction);
    debug!(receivers, tx_hash = %receipt.transaction.tx_hash, "transaction broadcast");
    receipt
}

/// Parse a batch identifier, returning an [`ApiError`] on failure.
fn parse_batch_id(s: &str) -> Result<BatchId, ApiError> {
    s.parse::<BatchId>()
        .map_err(|e| ApiError::InvalidId(format!("{s}: {e}")))
}

/// Parse a transaction hash, returning an [`ApiError`] on failure.
fn parse_tx_hash(s: &str) -> Result<TxHash, ApiError> {
    s.parse::<TxHash>()
        .map_err(|e| ApiError::InvalidHash(e.to_string()))
}
