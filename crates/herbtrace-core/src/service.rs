//! The trace service: the single owner of ledger and registry state.
//!
//! A submission is validated, waits out the simulated network delay, and
//! is then appended to the ledger and reflected in the registry under one
//! write lock. Nothing is held locked while waiting. Reads clone a snapshot
//! under the read lock so concurrent appends never produce a torn view.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use herbtrace_ledger::{Ledger, LedgerError, ValidationError, Validator};
use herbtrace_types::{
    Batch, BatchId, BatchStatus, CollectionEvent, CollectionEventDraft, CollectionEventId,
    FinalProduct, LedgerTransaction, NetworkStats, ProcessingEvent, ProcessingEventDraft,
    ProcessingEventId, QualityTest, RegistryStats, TimelineEntry, TxHash, ValidationReport,
};

use crate::config::{SimulationConfig, TraceConfig};
use crate::error::{RegistryError, TraceError};
use crate::monitor::network_stats;
use crate::registry::BatchRegistry;
use crate::timeline::provenance_timeline;

/// An accepted append: the ledger transaction and the batch as it stands
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    /// The confirmed ledger transaction.
    pub transaction: LedgerTransaction,
    /// The batch after the append.
    pub batch: Batch,
}

#[derive(Debug)]
struct TraceStore {
    ledger: Ledger,
    registry: BatchRegistry,
}

/// Ledger, registry and simulation parameters behind one lock.
#[derive(Debug)]
pub struct TraceService {
    store: RwLock<TraceStore>,
    validator: Validator,
    simulation: SimulationConfig,
}

impl TraceService {
    /// Build a service from configuration with an empty ledger.
    pub fn new(config: &TraceConfig) -> Self {
        let validator = config.validator();
        Self::from_parts(
            Ledger::new(validator, config.simulation.gas),
            BatchRegistry::new(&config.registry.verify_base_url),
            config.simulation,
        )
    }

    /// Build a service around an existing ledger and registry.
    pub fn from_parts(ledger: Ledger, registry: BatchRegistry, simulation: SimulationConfig) -> Self {
        Self {
            validator: *ledger.validator(),
            store: RwLock::new(TraceStore { ledger, registry }),
            simulation,
        }
    }

    // -----------------------------------------------------------------------
    // Dry-run validation
    // -----------------------------------------------------------------------

    /// Validate a collection draft without touching the ledger.
    pub fn validate_collection(&self, draft: &CollectionEventDraft) -> ValidationReport {
        self.validator.validate_collection_event(draft)
    }

    /// Validate a processing draft without touching the ledger.
    pub fn validate_processing(&self, draft: &ProcessingEventDraft) -> ValidationReport {
        self.validator.validate_processing_event(draft)
    }

    // -----------------------------------------------------------------------
    // Submissions
    // -----------------------------------------------------------------------

    /// Accept a collection event: append it under a fresh batch identifier
    /// and register the batch.
    ///
    /// # Errors
    ///
    /// Validation failures, or [`TraceError::ConfirmationTimeout`].
    pub async fn submit_collection(&self, draft: CollectionEventDraft) -> Result<Receipt, TraceError> {
        let report = self.validate_collection(&draft);
        if !report.is_valid() {
            warn!(errors = report.errors().len(), "collection event rejected");
            return Err(rejected(report));
        }
        let species = draft
            .species
            .clone()
            .ok_or(LedgerError::MissingField("species"))?;

        self.simulate_network(self.simulation.network_delay()).await?;

        let mut store = self.store.write().await;
        let batch_id = BatchId::new();
        let transaction = store
            .ledger
            .record_collection_event(batch_id, &draft)?
            .clone();

        let event = CollectionEvent {
            id: CollectionEventId::new(),
            batch_id,
            species: species.clone(),
            collector: draft.collector,
            location: draft.location,
            timestamp: draft.timestamp.unwrap_or(transaction.timestamp),
            quantity: draft.quantity,
            unit: draft.unit,
            quality_notes: draft.quality_notes,
            weather_conditions: draft.weather_conditions,
            harvest_method: draft.harvest_method,
            blockchain_tx: Some(transaction.tx_hash.clone()),
            verified: transaction.confirmed,
        };
        let batch = store
            .registry
            .create_batch(species, event, BatchStatus::Collected)?
            .clone();
        drop(store);

        info!(
            %batch_id,
            tx_hash = %transaction.tx_hash,
            gas = transaction.gas_used,
            score = batch.sustainability_score,
            "collection event accepted"
        );
        Ok(Receipt { transaction, batch })
    }

    /// Accept a processing step for an existing batch.
    ///
    /// # Errors
    ///
    /// Validation failures, an unknown batch, or
    /// [`TraceError::ConfirmationTimeout`].
    pub async fn submit_processing(
        &self,
        batch_id: BatchId,
        draft: ProcessingEventDraft,
    ) -> Result<Receipt, TraceError> {
        let report = self.validate_processing(&draft);
        if !report.is_valid() {
            warn!(%batch_id, errors = report.errors().len(), "processing event rejected");
            return Err(rejected(report));
        }
        let process_type = draft
            .process_type
            .ok_or(LedgerError::MissingField("process_type"))?;
        self.require_batch(batch_id).await?;

        self.simulate_network(self.simulation.network_delay()).await?;

        let mut store = self.store.write().await;
        let transaction = store
            .ledger
            .record_processing_event(batch_id, &draft)?
            .clone();

        let event = ProcessingEvent {
            id: ProcessingEventId::new(),
            batch_id,
            processor: draft.processor,
            facility: draft.facility,
            timestamp: draft.timestamp.unwrap_or(transaction.timestamp),
            process_type,
            input_quantity: draft.input_quantity,
            output_quantity: draft.output_quantity,
            quality_tests: draft.quality_tests,
            certifications: draft.certifications,
            blockchain_tx: Some(transaction.tx_hash.clone()),
            verified: transaction.confirmed,
        };
        let batch = store
            .registry
            .append_processing_event(batch_id, event)?
            .clone();
        drop(store);

        info!(
            %batch_id,
            tx_hash = %transaction.tx_hash,
            gas = transaction.gas_used,
            status = ?batch.status,
            "processing event accepted"
        );
        Ok(Receipt { transaction, batch })
    }

    /// Record a quality test against a batch and move it to `tested` if it
    /// is not already further along.
    ///
    /// # Errors
    ///
    /// An unknown batch, or [`TraceError::ConfirmationTimeout`].
    pub async fn record_quality_test(
        &self,
        batch_id: BatchId,
        user_id: &str,
        test: QualityTest,
    ) -> Result<Receipt, TraceError> {
        self.require_batch(batch_id).await?;
        self.simulate_network(self.simulation.network_delay()).await?;

        let mut store = self.store.write().await;
        let transaction = store
            .ledger
            .record_quality_test(batch_id, user_id, &test)?
            .clone();
        let batch = store
            .registry
            .advance_status(batch_id, BatchStatus::Tested)?
            .clone();
        drop(store);

        info!(%batch_id, tx_hash = %transaction.tx_hash, passed = test.passed, "quality test recorded");
        Ok(Receipt { transaction, batch })
    }

    /// Record a custody change.
    ///
    /// # Errors
    ///
    /// An unknown batch, or [`TraceError::ConfirmationTimeout`].
    pub async fn record_transfer(
        &self,
        batch_id: BatchId,
        from_user: &str,
        to_user: &str,
    ) -> Result<Receipt, TraceError> {
        self.require_batch(batch_id).await?;
        self.simulate_network(self.simulation.network_delay()).await?;

        let mut store = self.store.write().await;
        let transaction = store
            .ledger
            .record_transfer(batch_id, from_user, to_user)?
            .clone();
        let batch = store
            .registry
            .get(batch_id)
            .cloned()
            .ok_or(RegistryError::BatchNotFound(batch_id))?;
        drop(store);

        info!(%batch_id, tx_hash = %transaction.tx_hash, from_user, to_user, "custody transferred");
        Ok(Receipt { transaction, batch })
    }

    // -----------------------------------------------------------------------
    // Registry updates
    // -----------------------------------------------------------------------

    /// Set a batch's lifecycle status. Backward moves are rejected.
    ///
    /// # Errors
    ///
    /// An unknown batch or a status regression.
    pub async fn set_batch_status(&self, batch_id: BatchId, status: BatchStatus) -> Result<Batch, TraceError> {
        let batch = self
            .store
            .write()
            .await
            .registry
            .set_status(batch_id, status)?
            .clone();
        info!(%batch_id, status = ?status, "batch status updated");
        Ok(batch)
    }

    /// Attach the final product descriptor to a batch.
    ///
    /// # Errors
    ///
    /// An unknown batch.
    pub async fn set_final_product(&self, batch_id: BatchId, product: FinalProduct) -> Result<Batch, TraceError> {
        let batch = self
            .store
            .write()
            .await
            .registry
            .set_final_product(batch_id, product)?
            .clone();
        info!(%batch_id, "final product attached");
        Ok(batch)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Fetch a batch.
    ///
    /// # Errors
    ///
    /// [`RegistryError::BatchNotFound`] for an unknown batch.
    pub async fn batch(&self, batch_id: BatchId) -> Result<Batch, TraceError> {
        self.store
            .read()
            .await
            .registry
            .get(batch_id)
            .cloned()
            .ok_or_else(|| RegistryError::BatchNotFound(batch_id).into())
    }

    /// Fetch a batch by the reference encoded in its QR label.
    pub async fn batch_by_qr(&self, reference: &str) -> Option<Batch> {
        self.store.read().await.registry.find_by_qr(reference).cloned()
    }

    /// All batches, newest first.
    pub async fn batches(&self) -> Vec<Batch> {
        let store = self.store.read().await;
        let mut batches: Vec<Batch> = store.registry.iter().cloned().collect();
        drop(store);
        batches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        batches
    }

    /// Transaction history of one batch, oldest first. Empty for an
    /// unknown batch.
    pub async fn batch_transactions(&self, batch_id: BatchId) -> Vec<LedgerTransaction> {
        let store = self.store.read().await;
        store
            .ledger
            .batch_transactions(batch_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Every transaction, newest first.
    pub async fn all_transactions(&self) -> Vec<LedgerTransaction> {
        let store = self.store.read().await;
        store.ledger.all_transactions().into_iter().cloned().collect()
    }

    /// Fetch a transaction by hash.
    ///
    /// # Errors
    ///
    /// [`TraceError::TransactionNotFound`] for an unknown hash.
    pub async fn transaction(&self, hash: &TxHash) -> Result<LedgerTransaction, TraceError> {
        self.store
            .read()
            .await
            .ledger
            .find_by_hash(hash)
            .cloned()
            .ok_or_else(|| TraceError::TransactionNotFound(hash.clone()))
    }

    /// Whether the hash names a confirmed transaction, after the simulated
    /// verification delay. Unknown hashes are not confirmed.
    ///
    /// # Errors
    ///
    /// [`TraceError::ConfirmationTimeout`] if the delay exceeds the timeout.
    pub async fn verify_transaction(&self, hash: &TxHash) -> Result<bool, TraceError> {
        self.simulate_network(self.simulation.verify_delay()).await?;
        let confirmed = self.store.read().await.ledger.verify_transaction(hash);
        debug!(tx_hash = %hash, confirmed, "transaction verified");
        Ok(confirmed)
    }

    /// Ledger-wide statistics.
    pub async fn network_stats(&self) -> NetworkStats {
        network_stats(self.store.read().await.ledger.transactions())
    }

    /// Registry-wide statistics.
    pub async fn registry_stats(&self) -> RegistryStats {
        self.store.read().await.registry.stats()
    }

    /// Consumer-facing provenance timeline of a batch.
    ///
    /// # Errors
    ///
    /// [`RegistryError::BatchNotFound`] for an unknown batch.
    pub async fn provenance(&self, batch_id: BatchId) -> Result<Vec<TimelineEntry>, TraceError> {
        self.batch(batch_id).await.map(|b| provenance_timeline(&b))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn require_batch(&self, batch_id: BatchId) -> Result<(), TraceError> {
        if self.store.read().await.registry.get(batch_id).is_some() {
            Ok(())
        } else {
            Err(RegistryError::BatchNotFound(batch_id).into())
        }
    }

    /// Wait out a simulated network delay, bounded by the confirmation
    /// timeout.
    async fn simulate_network(&self, delay: Duration) -> Result<(), TraceError> {
        if delay.is_zero() {
            return Ok(());
        }
        tokio::time::timeout(self.simulation.confirmation_timeout(), tokio::time::sleep(delay))
            .await
            .map_err(|_elapsed| TraceError::ConfirmationTimeout {
                timeout_ms: self.simulation.confirmation_timeout_ms,
            })
    }
}

fn rejected(report: ValidationReport) -> TraceError {
    LedgerError::from(ValidationError::new(report.into_errors())).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use herbtrace_types::{
        Actor, Coordinate, HarvestMethod, ProcessType, QualityTestId, QualityTestType,
        QuantityUnit, SiteLocation, Species, SpeciesCategory, SustainabilityStatus, TimelineStep,
        TransactionEventType,
    };

    use super::*;

    fn service() -> TraceService {
        TraceService::from_parts(
            Ledger::with_seed(99),
            BatchRegistry::new("https://herbtrace.vercel.app"),
            SimulationConfig::without_delay(),
        )
    }

    fn collection() -> CollectionEventDraft {
        CollectionEventDraft {
            species: Some(Species {
                id: "turmeric-001".to_owned(),
                name: "Turmeric".to_owned(),
                scientific_name: "Curcuma longa".to_owned(),
                category: SpeciesCategory::Root,
                harvest_season: Vec::new(),
                sustainability_status: SustainabilityStatus::Abundant,
            }),
            collector: Actor {
                id: "collector-1".to_owned(),
                name: "Anil".to_owned(),
            },
            location: SiteLocation {
                coordinate: Some(Coordinate::new(30.35, 76.36)),
                region: "Punjab".to_owned(),
                address: None,
            },
            timestamp: None,
            quantity: dec!(25),
            unit: QuantityUnit::Kg,
            quality_notes: None,
            weather_conditions: Some("Sunny".to_owned()),
            harvest_method: HarvestMethod::HandPicked,
        }
    }

    fn processing(process_type: ProcessType, output: Decimal) -> ProcessingEventDraft {
        ProcessingEventDraft {
            processor: Actor {
                id: "processor-1".to_owned(),
                name: "Spice Co".to_owned(),
            },
            facility: SiteLocation {
                coordinate: None,
                region: "Amritsar".to_owned(),
                address: None,
            },
            timestamp: None,
            process_type: Some(process_type),
            input_quantity: dec!(25),
            output_quantity: output,
            quality_tests: Vec::new(),
            certifications: vec!["Organic".to_owned()],
        }
    }

    fn lab_test() -> QualityTest {
        QualityTest {
            id: QualityTestId::new(),
            test_type: QualityTestType::Purity,
            result: "98.2%".to_owned(),
            passed: true,
            test_date: Utc::now(),
            lab_name: "Punjab Analytical".to_owned(),
            certificate_url: None,
        }
    }

    #[tokio::test]
    async fn collection_creates_batch_and_transaction() {
        let svc = service();
        let receipt = svc.submit_collection(collection()).await.unwrap();

        assert_eq!(receipt.transaction.event_type, TransactionEventType::Collection);
        assert_eq!(receipt.transaction.batch_id, receipt.batch.id);
        assert_eq!(receipt.batch.status, BatchStatus::Collected);
        assert_eq!(receipt.batch.sustainability_score, 100);
        assert_eq!(
            receipt.batch.collection_event.blockchain_tx.as_ref(),
            Some(&receipt.transaction.tx_hash)
        );
        assert!(receipt.batch.collection_event.verified);
        assert_eq!(
            receipt.batch.qr_reference,
            format!("https://herbtrace.vercel.app/verify/{}", receipt.batch.id)
        );
        assert_eq!(svc.all_transactions().await.len(), 1);
    }

    #[tokio::test]
    async fn rejected_collection_leaves_no_trace() {
        let svc = service();
        let mut draft = collection();
        draft.collector.name = "  ".to_owned();
        draft.quantity = Decimal::ZERO;

        let err = svc.submit_collection(draft).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.validation_messages().map(<[String]>::len), Some(2));
        assert!(svc.all_transactions().await.is_empty());
        assert!(svc.batches().await.is_empty());
    }

    #[tokio::test]
    async fn processing_on_unknown_batch_is_not_found() {
        let svc = service();
        let err = svc
            .submit_processing(BatchId::new(), processing(ProcessType::Drying, dec!(20)))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(svc.all_transactions().await.is_empty());
    }

    #[tokio::test]
    async fn full_lifecycle_builds_timeline() {
        let svc = service();
        let batch_id = svc.submit_collection(collection()).await.unwrap().batch.id;

        let dried = svc
            .submit_processing(batch_id, processing(ProcessType::Drying, dec!(20)))
            .await
            .unwrap();
        assert_eq!(dried.batch.status, BatchStatus::Processing);
        assert_eq!(dried.transaction.sequence, 2);

        let tested = svc
            .record_quality_test(batch_id, "lab-1", lab_test())
            .await
            .unwrap();
        assert_eq!(tested.batch.status, BatchStatus::Tested);

        let packed = svc
            .submit_processing(batch_id, processing(ProcessType::Packaging, dec!(19)))
            .await
            .unwrap();
        assert_eq!(packed.batch.status, BatchStatus::Packaged);
        assert!(packed.batch.traceability_complete());

        svc.set_final_product(
            batch_id,
            FinalProduct {
                product_name: "Turmeric Powder".to_owned(),
                manufacturer: "Spice Co".to_owned(),
                expiry_date: NaiveDate::from_ymd_opt(2028, 6, 30).unwrap(),
                batch_size: 500,
            },
        )
        .await
        .unwrap();

        let history = svc.batch_transactions(batch_id).await;
        let sequences: Vec<u64> = history.iter().map(|t| t.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);

        let timeline = svc.provenance(batch_id).await.unwrap();
        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline.last().unwrap().step, TimelineStep::ReadyForConsumer);
    }

    #[tokio::test]
    async fn status_cannot_move_backwards() {
        let svc = service();
        let batch_id = svc.submit_collection(collection()).await.unwrap().batch.id;
        svc.set_batch_status(batch_id, BatchStatus::Sold).await.unwrap();

        let err = svc
            .set_batch_status(batch_id, BatchStatus::Tested)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(svc.batch(batch_id).await.unwrap().status, BatchStatus::Sold);
    }

    #[tokio::test]
    async fn transfer_keeps_status() {
        let svc = service();
        let batch_id = svc.submit_collection(collection()).await.unwrap().batch.id;
        let receipt = svc
            .record_transfer(batch_id, "collector-1", "processor-1")
            .await
            .unwrap();
        assert_eq!(receipt.transaction.event_type, TransactionEventType::Transfer);
        assert_eq!(receipt.batch.status, BatchStatus::Collected);
    }

    #[tokio::test]
    async fn verify_and_lookup_by_hash() {
        let svc = service();
        let hash = svc
            .submit_collection(collection())
            .await
            .unwrap()
            .transaction
            .tx_hash;

        assert!(svc.verify_transaction(&hash).await.unwrap());
        assert_eq!(svc.transaction(&hash).await.unwrap().tx_hash, hash);

        let unknown = TxHash::from_digest(&[7; 32]);
        assert!(!svc.verify_transaction(&unknown).await.unwrap());
        assert!(svc.transaction(&unknown).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn qr_lookup_and_newest_first_listing() {
        let svc = service();
        let first = svc.submit_collection(collection()).await.unwrap().batch;
        let second = svc.submit_collection(collection()).await.unwrap().batch;

        let found = svc.batch_by_qr(&first.qr_reference).await.unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(svc.batches().await.len(), 2);
        assert_eq!(svc.registry_stats().await.total_batches, 2);
        assert!(svc.batch_by_qr("nope").await.is_none());
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn stats_follow_the_ledger() {
        let svc = service();
        let batch_id = svc.submit_collection(collection()).await.unwrap().batch.id;
        svc.record_transfer(batch_id, "a", "b").await.unwrap();

        let stats = svc.network_stats().await;
        assert_eq!(stats.total_transactions, 2);
        assert_eq!(stats.total_batches, 1);
        assert_eq!(stats.confirmed_transactions, 2);
    }

    #[tokio::test]
    async fn slow_confirmation_times_out_without_append() {
        let simulation = SimulationConfig {
            network_delay_ms: 50,
            verify_delay_ms: 50,
            confirmation_timeout_ms: 10,
            ..SimulationConfig::default()
        };
        let svc = TraceService::from_parts(
            Ledger::with_seed(1),
            BatchRegistry::new("https://herbtrace.vercel.app"),
            simulation,
        );

        let err = svc.submit_collection(collection()).await.unwrap_err();
        assert!(matches!(err, TraceError::ConfirmationTimeout { timeout_ms: 10 }));
        assert!(svc.all_transactions().await.is_empty());
        assert!(svc.batches().await.is_empty());
    }

    #[test]
    fn dry_run_validation_reports_all_errors() {
        let svc = service();
        let mut draft = processing(ProcessType::Drying, dec!(30));
        draft.process_type = None;
        let report = svc.validate_processing(&draft);
        assert!(!report.is_valid());
        assert_eq!(report.errors().len(), 2);
        assert!(svc.validate_collection(&collection()).is_valid());
    }
}
