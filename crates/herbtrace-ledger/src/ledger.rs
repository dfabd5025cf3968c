//! The ledger: an append-only log of every accepted batch event.
//!
//! # Design
//!
//! - **Append-only**: transactions are never modified or deleted.
//! - **Gated**: collection and processing events pass the [`Validator`]
//!   first; a rejection appends nothing.
//! - **Established batches**: only a collection event can introduce a
//!   batch; every other record requires one.
//! - **Ordered**: sequence numbers increase by one per append and
//!   timestamps never decrease, so append order, sequence order and
//!   timestamp order coincide.
//! - **Immediate confirmation**: every appended transaction is confirmed.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use herbtrace_types::{
    BatchId, CollectionEventDraft, LedgerTransaction, ProcessingEventDraft, QualityTest,
    TransactionEventType, TxHash,
};

use crate::simulation::GasSchedule;
use crate::validation::Validator;
use crate::{LedgerError, TransactionBuilder, ValidationError};

/// Payload tag recorded on custody transfers.
pub const CUSTODY_CHANGE: &str = "custody-change";

/// The append-only transaction ledger.
#[derive(Debug)]
pub struct Ledger {
    /// All transactions, in append order.
    transactions: Vec<LedgerTransaction>,
    /// Batches introduced by an accepted collection event.
    established: BTreeSet<BatchId>,
    /// Position of each transaction by hash.
    by_hash: BTreeMap<TxHash, usize>,
    /// Sequence number for the next append.
    next_sequence: u64,
    validator: Validator,
    gas: GasSchedule,
    rng: StdRng,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(Validator::default(), GasSchedule::default())
    }
}

impl Ledger {
    /// Create an empty ledger with the given rules and gas schedule.
    pub fn new(validator: Validator, gas: GasSchedule) -> Self {
        Self::with_rng(validator, gas, StdRng::from_os_rng())
    }

    /// Create an empty ledger with default rules and a deterministic
    /// random source (gas and hash nonces).
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(
            Validator::default(),
            GasSchedule::default(),
            StdRng::seed_from_u64(seed),
        )
    }

    const fn with_rng(validator: Validator, gas: GasSchedule, rng: StdRng) -> Self {
        Self {
            transactions: Vec::new(),
            established: BTreeSet::new(),
            by_hash: BTreeMap::new(),
            next_sequence: 1,
            validator,
            gas,
            rng,
        }
    }

    /// The rules this ledger gates events with.
    pub const fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Return the number of transactions in the ledger.
    pub const fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Return whether the ledger has no transactions.
    pub const fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Whether a collection event has been accepted for the batch.
    pub fn is_established(&self, batch_id: BatchId) -> bool {
        self.established.contains(&batch_id)
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Validate a collection event and, if it passes, append it as the
    /// transaction that establishes `batch_id`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] with every violated rule, or
    /// [`LedgerError::DuplicateBatch`] if the batch already has a collection.
    pub fn record_collection_event(
        &mut self,
        batch_id: BatchId,
        draft: &CollectionEventDraft,
    ) -> Result<&LedgerTransaction, LedgerError> {
        let report = self.validator.validate_collection_event(draft);
        if !report.is_valid() {
            return Err(ValidationError::new(report.into_errors()).into());
        }
        if self.is_established(batch_id) {
            return Err(LedgerError::DuplicateBatch(batch_id));
        }

        let data = serde_json::json!({
            "species": draft.species.as_ref().map(|s| s.name.as_str()),
            "location": draft.location,
            "quantity": draft.quantity,
            "unit": draft.unit,
            "harvest_method": draft.harvest_method,
            "quality_notes": draft.quality_notes,
            "weather_conditions": draft.weather_conditions,
        });

        self.append(
            TransactionEventType::Collection,
            batch_id,
            draft.collector.id.clone(),
            data,
        )?;
        self.established.insert(batch_id);

        self.transactions.last().ok_or(LedgerError::InternalError(
            "failed to retrieve transaction after append",
        ))
    }

    /// Validate a processing event and, if it passes, append it to an
    /// established batch.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] with every violated rule, or
    /// [`LedgerError::BatchNotEstablished`] for an unknown batch.
    pub fn record_processing_event(
        &mut self,
        batch_id: BatchId,
        draft: &ProcessingEventDraft,
    ) -> Result<&LedgerTransaction, LedgerError> {
        let report = self.validator.validate_processing_event(draft);
        if !report.is_valid() {
            return Err(ValidationError::new(report.into_errors()).into());
        }
        self.require_established(batch_id)?;

        let data = serde_json::json!({
            "process_type": draft.process_type,
            "facility": draft.facility,
            "input_quantity": draft.input_quantity,
            "output_quantity": draft.output_quantity,
            "quality_tests": draft.quality_tests,
            "certifications": draft.certifications,
        });

        self.append(
            TransactionEventType::Processing,
            batch_id,
            draft.processor.id.clone(),
            data,
        )
    }

    /// Append a quality test result. Not validated.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BatchNotEstablished`] for an unknown batch.
    pub fn record_quality_test(
        &mut self,
        batch_id: BatchId,
        user_id: &str,
        test: &QualityTest,
    ) -> Result<&LedgerTransaction, LedgerError> {
        self.require_established(batch_id)?;
        let data = serde_json::to_value(test)?;
        self.append(
            TransactionEventType::QualityTest,
            batch_id,
            user_id.to_owned(),
            data,
        )
    }

    /// Append a custody change between two users. Not validated.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BatchNotEstablished`] for an unknown batch.
    pub fn record_transfer(
        &mut self,
        batch_id: BatchId,
        from_user: &str,
        to_user: &str,
    ) -> Result<&LedgerTransaction, LedgerError> {
        self.require_established(batch_id)?;
        let data = serde_json::json!({
            "from_user_id": from_user,
            "to_user_id": to_user,
            "transfer_type": CUSTODY_CHANGE,
        });
        self.append(
            TransactionEventType::Transfer,
            batch_id,
            from_user.to_owned(),
            data,
        )
    }

    fn require_established(&self, batch_id: BatchId) -> Result<(), LedgerError> {
        if self.is_established(batch_id) {
            Ok(())
        } else {
            Err(LedgerError::BatchNotEstablished(batch_id))
        }
    }

    fn append(
        &mut self,
        event_type: TransactionEventType,
        batch_id: BatchId,
        user_id: String,
        data: serde_json::Value,
    ) -> Result<&LedgerTransaction, LedgerError> {
        let sequence = self.next_sequence;
        let next = sequence
            .checked_add(1)
            .ok_or(LedgerError::InternalError("sequence overflow"))?;

        // Wall clock may step backwards; ledger time may not.
        let now = Utc::now();
        let timestamp = self
            .transactions
            .last()
            .map_or(now, |last| last.timestamp.max(now));

        let gas = self.gas.for_event(event_type).sample(&mut self.rng);
        let nonce: u64 = self.rng.random();

        let tx = TransactionBuilder::new(event_type, batch_id)
            .user_id(user_id)
            .data(data)
            .sequence(sequence)
            .timestamp(timestamp)
            .gas_used(gas)
            .nonce(nonce)
            .build()?;

        if self.by_hash.contains_key(&tx.tx_hash) {
            return Err(LedgerError::InternalError("transaction hash collision"));
        }

        let position = self.transactions.len();
        self.by_hash.insert(tx.tx_hash.clone(), position);
        self.next_sequence = next;
        debug!(
            %batch_id,
            sequence,
            event_type = ?event_type,
            tx_hash = %tx.tx_hash,
            gas,
            "ledger append"
        );
        self.transactions.push(tx);

        // Return a reference to the transaction we just pushed.
        self.transactions.last().ok_or(LedgerError::InternalError(
            "failed to retrieve transaction after append",
        ))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// All transactions for a batch, oldest first.
    pub fn batch_transactions(&self, batch_id: BatchId) -> Vec<&LedgerTransaction> {
        self.transactions
            .iter()
            .filter(|tx| tx.batch_id == batch_id)
            .collect()
    }

    /// All transactions, newest first.
    pub fn all_transactions(&self) -> Vec<&LedgerTransaction> {
        self.transactions.iter().rev().collect()
    }

    /// All transactions in append order.
    pub fn transactions(&self) -> &[LedgerTransaction] {
        &self.transactions
    }

    /// Look up a transaction by its hash.
    pub fn find_by_hash(&self, hash: &TxHash) -> Option<&LedgerTransaction> {
        self.by_hash
            .get(hash)
            .and_then(|&position| self.transactions.get(position))
    }

    /// Whether the hash names a confirmed transaction. Unknown hashes are
    /// not confirmed.
    pub fn verify_transaction(&self, hash: &TxHash) -> bool {
        self.find_by_hash(hash).is_some_and(|tx| tx.confirmed)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use herbtrace_types::{
        Actor, Coordinate, HarvestMethod, ProcessType, QualityTestId, QualityTestType,
        QuantityUnit, SiteLocation, Species, SpeciesCategory, SustainabilityStatus,
    };

    use super::*;

    fn collection() -> CollectionEventDraft {
        CollectionEventDraft {
            species: Some(Species {
                id: "ashwagandha-001".to_owned(),
                name: "Ashwagandha".to_owned(),
                scientific_name: "Withania somnifera".to_owned(),
                category: SpeciesCategory::Root,
                harvest_season: vec!["December".to_owned()],
                sustainability_status: SustainabilityStatus::Moderate,
            }),
            collector: Actor {
                id: "collector-7".to_owned(),
                name: "Ravi".to_owned(),
            },
            location: SiteLocation {
                coordinate: Some(Coordinate::new(30.3507, 76.3595)),
                region: "Punjab".to_owned(),
                address: None,
            },
            timestamp: None,
            quantity: dec!(40),
            unit: QuantityUnit::Kg,
            quality_notes: Some("Clean roots".to_owned()),
            weather_conditions: None,
            harvest_method: HarvestMethod::ToolAssisted,
        }
    }

    fn processing(process_type: ProcessType) -> ProcessingEventDraft {
        ProcessingEventDraft {
            processor: Actor {
                id: "processor-2".to_owned(),
                name: "Herbal Works".to_owned(),
            },
            facility: SiteLocation::default(),
            timestamp: None,
            process_type: Some(process_type),
            input_quantity: dec!(40),
            output_quantity: dec!(30),
            quality_tests: Vec::new(),
            certifications: vec!["GMP".to_owned()],
        }
    }

    fn quality_test() -> QualityTest {
        QualityTest {
            id: QualityTestId::new(),
            test_type: QualityTestType::Moisture,
            result: "8%".to_owned(),
            passed: true,
            test_date: Utc::now(),
            lab_name: "Punjab Test House".to_owned(),
            certificate_url: None,
        }
    }

    fn established(ledger: &mut Ledger) -> BatchId {
        let batch = BatchId::new();
        let result = ledger.record_collection_event(batch, &collection());
        assert!(result.is_ok(), "{result:?}");
        batch
    }

    #[test]
    fn collection_appends_confirmed_transaction() {
        let mut ledger = Ledger::with_seed(1);
        let batch = BatchId::new();
        let tx = ledger.record_collection_event(batch, &collection()).ok().cloned();
        assert!(tx.is_some());
        if let Some(tx) = tx {
            assert!(tx.confirmed);
            assert_eq!(tx.sequence, 1);
            assert_eq!(tx.event_type, TransactionEventType::Collection);
            assert_eq!(tx.user_id, "collector-7");
            assert!((21_000..71_000).contains(&tx.gas_used));
            assert_eq!(tx.data.get("species"), Some(&serde_json::json!("Ashwagandha")));
        }
        assert!(ledger.is_established(batch));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn invalid_collection_appends_nothing() {
        let mut ledger = Ledger::with_seed(2);
        let mut draft = collection();
        draft.quantity = Decimal::ZERO;
        draft.collector.name = String::new();
        let batch = BatchId::new();
        let result = ledger.record_collection_event(batch, &draft);
        let violations = match result {
            Err(LedgerError::Validation(err)) => err.messages.len(),
            _ => 0,
        };
        assert_eq!(violations, 2);
        assert!(ledger.is_empty());
        assert!(!ledger.is_established(batch));
    }

    #[test]
    fn second_collection_for_batch_rejected() {
        let mut ledger = Ledger::with_seed(3);
        let batch = established(&mut ledger);
        let result = ledger.record_collection_event(batch, &collection());
        assert!(matches!(result, Err(LedgerError::DuplicateBatch(id)) if id == batch));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn unestablished_batch_rejects_every_other_record() {
        let mut ledger = Ledger::with_seed(4);
        let batch = BatchId::new();
        assert!(matches!(
            ledger.record_processing_event(batch, &processing(ProcessType::Drying)),
            Err(LedgerError::BatchNotEstablished(_))
        ));
        assert!(matches!(
            ledger.record_quality_test(batch, "lab", &quality_test()),
            Err(LedgerError::BatchNotEstablished(_))
        ));
        assert!(matches!(
            ledger.record_transfer(batch, "a", "b"),
            Err(LedgerError::BatchNotEstablished(_))
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn invalid_processing_rejected_before_batch_lookup() {
        let mut ledger = Ledger::with_seed(5);
        let mut draft = processing(ProcessType::Grinding);
        draft.output_quantity = dec!(10);
        let result = ledger.record_processing_event(BatchId::new(), &draft);
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn gas_ranges_follow_event_type() {
        let mut ledger = Ledger::with_seed(6);
        let batch = established(&mut ledger);
        for _ in 0..20 {
            let p = ledger
                .record_processing_event(batch, &processing(ProcessType::Cleaning))
                .map(|tx| tx.gas_used);
            assert!(p.is_ok_and(|g| (30_000..105_000).contains(&g)));
            let q = ledger
                .record_quality_test(batch, "lab-1", &quality_test())
                .map(|tx| tx.gas_used);
            assert!(q.is_ok_and(|g| (25_000..65_000).contains(&g)));
            let t = ledger.record_transfer(batch, "a", "b").map(|tx| tx.gas_used);
            assert!(t.is_ok_and(|g| (20_000..55_000).contains(&g)));
        }
    }

    #[test]
    fn transfer_payload_records_custody_change() {
        let mut ledger = Ledger::with_seed(7);
        let batch = established(&mut ledger);
        let tx = ledger
            .record_transfer(batch, "farmer-1", "processor-1")
            .ok()
            .cloned();
        assert_eq!(
            tx.map(|t| (t.user_id, t.data)),
            Some((
                "farmer-1".to_owned(),
                serde_json::json!({
                    "from_user_id": "farmer-1",
                    "to_user_id": "processor-1",
                    "transfer_type": "custody-change",
                })
            ))
        );
    }

    #[test]
    fn batch_history_is_append_only_and_ordered() {
        let mut ledger = Ledger::with_seed(8);
        let batch = established(&mut ledger);
        let other = established(&mut ledger);

        let first_snapshot: Vec<LedgerTransaction> =
            ledger.batch_transactions(batch).into_iter().cloned().collect();

        for _ in 0..4 {
            assert!(
                ledger
                    .record_processing_event(batch, &processing(ProcessType::Drying))
                    .is_ok()
            );
            assert!(ledger.record_transfer(other, "x", "y").is_ok());
        }

        let history = ledger.batch_transactions(batch);
        assert_eq!(history.len(), 5);
        for pair in history.windows(2) {
            if let [a, b] = pair {
                assert!(a.timestamp <= b.timestamp);
                assert!(a.sequence < b.sequence);
            }
        }
        // The earliest entry is untouched by later appends.
        assert_eq!(history.first().copied(), first_snapshot.first());
    }

    #[test]
    fn global_listing_is_newest_first() {
        let mut ledger = Ledger::with_seed(9);
        let batch = established(&mut ledger);
        assert!(ledger.record_transfer(batch, "a", "b").is_ok());
        assert!(ledger.record_transfer(batch, "b", "c").is_ok());

        let sequences: Vec<u64> = ledger.all_transactions().iter().map(|t| t.sequence).collect();
        assert_eq!(sequences, vec![3, 2, 1]);
    }

    #[test]
    fn verify_round_trip() {
        let mut ledger = Ledger::with_seed(10);
        let batch = BatchId::new();
        let hash = ledger
            .record_collection_event(batch, &collection())
            .map(|tx| tx.tx_hash.clone())
            .ok();
        assert!(hash.is_some());
        if let Some(hash) = hash {
            assert!(ledger.verify_transaction(&hash));
            assert_eq!(ledger.find_by_hash(&hash).map(|t| t.batch_id), Some(batch));
        }
        assert!(!ledger.verify_transaction(&TxHash::from_digest(&[0; 32])));
    }

    #[test]
    fn hashes_are_unique_across_appends() {
        let mut ledger = Ledger::with_seed(11);
        let batch = established(&mut ledger);
        for _ in 0..50 {
            assert!(ledger.record_transfer(batch, "a", "b").is_ok());
        }
        let unique: BTreeSet<&TxHash> = ledger.transactions().iter().map(|t| &t.tx_hash).collect();
        assert_eq!(unique.len(), ledger.len());
    }
}
