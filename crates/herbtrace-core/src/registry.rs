//! The batch registry: one record per batch, keyed by [`BatchId`].
//!
//! A batch is registered only after its collection event has been accepted
//! by the ledger. Records are never deleted. Status only moves forward
//! through the lifecycle; traceability completeness is derived from status
//! on read and never stored.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;

use herbtrace_types::{
    Batch, BatchId, BatchStatus, CollectionEvent, FinalProduct, ProcessingEvent, RegistryStats,
    Species,
};

use crate::error::RegistryError;
use crate::score::compute_sustainability_score;

/// Decimal places kept in registry statistics.
const STATS_SCALE: u32 = 2;

/// In-memory batch store.
#[derive(Debug, Clone)]
pub struct BatchRegistry {
    batches: BTreeMap<BatchId, Batch>,
    by_qr: BTreeMap<String, BatchId>,
    verify_base_url: String,
}

impl BatchRegistry {
    /// Create an empty registry whose QR references point at
    /// `{verify_base_url}/verify/{batch_id}`.
    pub fn new(verify_base_url: &str) -> Self {
        Self {
            batches: BTreeMap::new(),
            by_qr: BTreeMap::new(),
            verify_base_url: verify_base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// The consumer-facing lookup reference for a batch.
    pub fn qr_reference(&self, batch_id: BatchId) -> String {
        format!("{}/verify/{batch_id}", self.verify_base_url)
    }

    /// Number of registered batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether no batch is registered.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Register a batch for an accepted collection event.
    ///
    /// The batch takes the identifier the collection event was accepted
    /// under.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateBatch`] if the identifier is taken.
    pub fn create_batch(
        &mut self,
        species: Species,
        collection_event: CollectionEvent,
        initial_status: BatchStatus,
    ) -> Result<&Batch, RegistryError> {
        let id = collection_event.batch_id;
        if self.batches.contains_key(&id) {
            return Err(RegistryError::DuplicateBatch(id));
        }

        let now = Utc::now();
        let qr_reference = self.qr_reference(id);
        let sustainability_score = compute_sustainability_score(
            &species,
            collection_event.harvest_method,
            &collection_event.location.region,
        );

        let batch = Batch {
            id,
            qr_reference: qr_reference.clone(),
            species,
            status: initial_status,
            collection_event,
            processing_events: Vec::new(),
            final_product: None,
            sustainability_score,
            created_at: now,
            updated_at: now,
        };

        self.by_qr.insert(qr_reference, id);
        Ok(self.batches.entry(id).or_insert(batch))
    }

    /// Append an accepted processing event, keeping events ordered by
    /// timestamp, and advance the status when the step moves the batch
    /// forward.
    ///
    /// A step dated before the batch's collection is re-dated to the
    /// collection time.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::BatchNotFound`] for an unknown batch.
    pub fn append_processing_event(
        &mut self,
        batch_id: BatchId,
        mut event: ProcessingEvent,
    ) -> Result<&Batch, RegistryError> {
        let batch = self.get_mut(batch_id)?;
        let target = BatchStatus::after_process(event.process_type);
        event.timestamp = event.timestamp.max(batch.collection_event.timestamp);

        // Equal timestamps keep arrival order.
        let position = batch
            .processing_events
            .partition_point(|e| e.timestamp <= event.timestamp);
        batch.processing_events.insert(position, event);

        if target > batch.status {
            batch.status = target;
        }
        touch(batch);
        Ok(batch)
    }

    /// Move a batch forward to `status` if it is not already there or
    /// beyond. Never fails on an earlier status; it is simply kept.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::BatchNotFound`] for an unknown batch.
    pub fn advance_status(
        &mut self,
        batch_id: BatchId,
        status: BatchStatus,
    ) -> Result<&Batch, RegistryError> {
        let batch = self.get_mut(batch_id)?;
        if status > batch.status {
            batch.status = status;
            touch(batch);
        }
        Ok(batch)
    }

    /// Set the lifecycle status explicitly.
    ///
    /// Staying on the same status or skipping ahead is allowed; moving back
    /// is not.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::BatchNotFound`] for an unknown batch, or
    /// [`RegistryError::StatusRegression`] for a backwards move.
    pub fn set_status(
        &mut self,
        batch_id: BatchId,
        status: BatchStatus,
    ) -> Result<&Batch, RegistryError> {
        let batch = self.get_mut(batch_id)?;
        if status < batch.status {
            return Err(RegistryError::StatusRegression {
                batch_id,
                from: batch.status,
                to: status,
            });
        }
        batch.status = status;
        touch(batch);
        Ok(batch)
    }

    /// Attach (or replace) the final product descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::BatchNotFound`] for an unknown batch.
    pub fn set_final_product(
        &mut self,
        batch_id: BatchId,
        product: FinalProduct,
    ) -> Result<&Batch, RegistryError> {
        let batch = self.get_mut(batch_id)?;
        batch.final_product = Some(product);
        touch(batch);
        Ok(batch)
    }

    /// Look up a batch.
    pub fn get(&self, batch_id: BatchId) -> Option<&Batch> {
        self.batches.get(&batch_id)
    }

    /// Look up a batch by the reference encoded in its QR label.
    ///
    /// Accepts the full reference or a bare batch identifier.
    pub fn find_by_qr(&self, reference: &str) -> Option<&Batch> {
        let reference = reference.trim();
        self.by_qr
            .get(reference)
            .and_then(|id| self.batches.get(id))
            .or_else(|| {
                let id: BatchId = reference.rsplit('/').next()?.parse().ok()?;
                self.batches.get(&id)
            })
    }

    /// All batches, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Batch> {
        self.batches.values()
    }

    /// Dashboard aggregates over all batches.
    pub fn stats(&self) -> RegistryStats {
        let mut by_status: BTreeMap<BatchStatus, u64> =
            BatchStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        let mut total: u64 = 0;
        let mut complete: u64 = 0;
        let mut score_sum: u64 = 0;

        for batch in self.batches.values() {
            total = total.saturating_add(1);
            if let Some(count) = by_status.get_mut(&batch.status) {
                *count = count.saturating_add(1);
            }
            if derive_traceability_complete(batch) {
                complete = complete.saturating_add(1);
            }
            score_sum = score_sum.saturating_add(u64::from(batch.sustainability_score));
        }

        RegistryStats {
            total_batches: total,
            by_status,
            traceability_complete: complete,
            completion_rate_percent: ratio(complete.saturating_mul(100), total),
            average_score: ratio(score_sum, total),
        }
    }

    fn get_mut(&mut self, batch_id: BatchId) -> Result<&mut Batch, RegistryError> {
        self.batches
            .get_mut(&batch_id)
            .ok_or(RegistryError::BatchNotFound(batch_id))
    }
}

/// Whether a batch's provenance trail is complete.
pub const fn derive_traceability_complete(batch: &Batch) -> bool {
    batch.traceability_complete()
}

/// Refresh the update timestamp and recompute the score.
fn touch(batch: &mut Batch) {
    batch.updated_at = Utc::now().max(batch.updated_at);
    batch.sustainability_score = compute_sustainability_score(
        &batch.species,
        batch.collection_event.harvest_method,
        &batch.collection_event.location.region,
    );
}

/// `numerator / denominator` rounded for display; zero when empty.
fn ratio(numerator: u64, denominator: u64) -> Decimal {
    if denominator == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(numerator)
        .checked_div(Decimal::from(denominator))
        .map_or(Decimal::ZERO, |r| r.round_dp(STATS_SCALE))
}
