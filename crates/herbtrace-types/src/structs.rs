//! Core record types: species, events, batches, ledger transactions and
//! the aggregate statistics derived from them.
//!
//! Draft types (`*Draft`) are what external collaborators submit: every
//! field a form might leave empty is optional or defaulted, so the
//! validator can report *all* problems instead of failing at
//! deserialization. Accepted types carry the identifiers and ledger
//! references assigned on acceptance and are never mutated afterwards.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

use crate::enums::{
    BatchStatus, HarvestMethod, NetworkHealth, ProcessType, QualityTestType, QuantityUnit,
    SpeciesCategory, SustainabilityStatus, TransactionEventType,
};
use crate::ids::{
    BatchId, CollectionEventId, ProcessingEventId, QualityTestId, TransactionId, TxHash,
};

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
    /// Altitude in meters, when the device reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl Coordinate {
    /// A coordinate without altitude.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
        }
    }
}

/// Where something happened: an optional GPS fix plus free-text region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SiteLocation {
    /// GPS fix; `None` when the collaborator could not obtain one.
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    /// Free-text region (e.g. `"Kerala, India"`).
    #[serde(default)]
    pub region: String,
    /// Optional street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// A medicinal plant species from the reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Species {
    /// Catalog identifier (e.g. `"turmeric-001"`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Binomial name.
    pub scientific_name: String,
    /// Harvested plant part.
    pub category: SpeciesCategory,
    /// Months in which the species is harvested, in calendar order.
    #[serde(default)]
    pub harvest_season: Vec<String>,
    /// Conservation status.
    pub sustainability_status: SustainabilityStatus,
}

/// A person or organisation acting on a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Actor {
    /// Stable user identifier.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// A collection event as submitted from the field, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CollectionEventDraft {
    /// Species collected.
    #[serde(default)]
    pub species: Option<Species>,
    /// Collector identity.
    #[serde(default)]
    pub collector: Actor,
    /// Collection site.
    #[serde(default)]
    pub location: SiteLocation,
    /// When the material was collected; defaults to acceptance time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Quantity collected.
    #[serde(default)]
    #[ts(as = "String")]
    pub quantity: Decimal,
    /// Unit of [`quantity`](Self::quantity).
    pub unit: QuantityUnit,
    /// Free-text notes on quality.
    #[serde(default)]
    pub quality_notes: Option<String>,
    /// Free-text weather description.
    #[serde(default)]
    pub weather_conditions: Option<String>,
    /// Harvest technique.
    pub harvest_method: HarvestMethod,
}

/// A collection event accepted onto the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CollectionEvent {
    /// Event identifier assigned on acceptance.
    pub id: CollectionEventId,
    /// Batch this collection established.
    pub batch_id: BatchId,
    /// Species collected.
    pub species: Species,
    /// Collector identity.
    pub collector: Actor,
    /// Collection site (coordinate always present once accepted).
    pub location: SiteLocation,
    /// When the material was collected.
    pub timestamp: DateTime<Utc>,
    /// Quantity collected.
    #[ts(as = "String")]
    pub quantity: Decimal,
    /// Unit of [`quantity`](Self::quantity).
    pub unit: QuantityUnit,
    /// Free-text notes on quality.
    pub quality_notes: Option<String>,
    /// Free-text weather description.
    pub weather_conditions: Option<String>,
    /// Harvest technique.
    pub harvest_method: HarvestMethod,
    /// Hash of the ledger transaction that recorded this event.
    pub blockchain_tx: Option<TxHash>,
    /// Whether the event is backed by a confirmed ledger transaction.
    pub verified: bool,
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

/// A laboratory test result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QualityTest {
    /// Test identifier; generated when the submitter omits it.
    #[serde(default)]
    pub id: QualityTestId,
    /// Test category.
    pub test_type: QualityTestType,
    /// Free-text result as reported by the lab.
    pub result: String,
    /// Whether the sample passed.
    pub passed: bool,
    /// When the test was performed.
    pub test_date: DateTime<Utc>,
    /// Testing laboratory.
    pub lab_name: String,
    /// Link to the lab certificate, if issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_url: Option<String>,
}

/// A processing step as submitted by a facility, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProcessingEventDraft {
    /// Processor identity.
    #[serde(default)]
    pub processor: Actor,
    /// Facility location.
    #[serde(default)]
    pub facility: SiteLocation,
    /// When the step was performed; defaults to acceptance time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Step performed.
    #[serde(default)]
    pub process_type: Option<ProcessType>,
    /// Material going in.
    #[serde(default)]
    #[ts(as = "String")]
    pub input_quantity: Decimal,
    /// Material coming out.
    #[serde(default)]
    #[ts(as = "String")]
    pub output_quantity: Decimal,
    /// Tests performed during the step.
    #[serde(default)]
    pub quality_tests: Vec<QualityTest>,
    /// Certification labels held by the facility for this step.
    #[serde(default)]
    pub certifications: Vec<String>,
}

/// A processing step accepted onto the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProcessingEvent {
    /// Event identifier assigned on acceptance.
    pub id: ProcessingEventId,
    /// Batch the step was applied to.
    pub batch_id: BatchId,
    /// Processor identity.
    pub processor: Actor,
    /// Facility location.
    pub facility: SiteLocation,
    /// When the step was performed.
    pub timestamp: DateTime<Utc>,
    /// Step performed.
    pub process_type: ProcessType,
    /// Material going in.
    #[ts(as = "String")]
    pub input_quantity: Decimal,
    /// Material coming out (never more than the input).
    #[ts(as = "String")]
    pub output_quantity: Decimal,
    /// Tests performed during the step.
    pub quality_tests: Vec<QualityTest>,
    /// Certification labels.
    pub certifications: Vec<String>,
    /// Hash of the ledger transaction that recorded this step.
    pub blockchain_tx: Option<TxHash>,
    /// Whether the step is backed by a confirmed ledger transaction.
    pub verified: bool,
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Descriptor of the packaged product a batch ended up in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FinalProduct {
    /// Retail product name.
    pub product_name: String,
    /// Manufacturer.
    pub manufacturer: String,
    /// Best-before date.
    pub expiry_date: NaiveDate,
    /// Number of retail units produced.
    pub batch_size: u32,
}

/// The unit of traceability: one collection plus its processing history.
///
/// The wire form also carries `traceability_complete`, computed from
/// [`status`](Self::status) on serialization and ignored on input.
#[derive(Debug, Clone, PartialEq, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Batch {
    /// Batch identifier (shared with the ledger).
    pub id: BatchId,
    /// Consumer-facing lookup reference encoded in the QR label.
    pub qr_reference: String,
    /// Species collected.
    pub species: Species,
    /// Current lifecycle stage.
    pub status: BatchStatus,
    /// The collection that established the batch.
    pub collection_event: CollectionEvent,
    /// Processing steps, ordered by timestamp.
    pub processing_events: Vec<ProcessingEvent>,
    /// Final product, once packaged.
    pub final_product: Option<FinalProduct>,
    /// Derived 0-100 sustainability score.
    pub sustainability_score: u8,
    /// When the batch was registered.
    pub created_at: DateTime<Utc>,
    /// When the batch was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// Whether the batch has reached a stage with a complete provenance trail.
    ///
    /// Derived from [`status`](Self::status); there is no separately stored flag.
    pub const fn traceability_complete(&self) -> bool {
        self.status.completes_traceability()
    }
}

impl Serialize for Batch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Batch", 11)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("qr_reference", &self.qr_reference)?;
        state.serialize_field("species", &self.species)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("collection_event", &self.collection_event)?;
        state.serialize_field("processing_events", &self.processing_events)?;
        state.serialize_field("final_product", &self.final_product)?;
        state.serialize_field("sustainability_score", &self.sustainability_score)?;
        state.serialize_field("traceability_complete", &self.traceability_complete())?;
        state.serialize_field("created_at", &self.created_at)?;
        state.serialize_field("updated_at", &self.updated_at)?;
        state.end()
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// An append-only ledger record with simulated confirmation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LedgerTransaction {
    /// Transaction identifier.
    pub id: TransactionId,
    /// Opaque `0x`-prefixed hash used as the public reference.
    pub tx_hash: TxHash,
    /// Position in the ledger, starting at 1.
    pub sequence: u64,
    /// Kind of event recorded.
    pub event_type: TransactionEventType,
    /// Batch the event belongs to.
    pub batch_id: BatchId,
    /// Acting user.
    pub user_id: String,
    /// Append time; non-decreasing in ledger order.
    pub timestamp: DateTime<Utc>,
    /// Event payload.
    pub data: serde_json::Value,
    /// Simulated resource cost.
    pub gas_used: u64,
    /// Always `true`: confirmation is immediate.
    pub confirmed: bool,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Outcome of validating a draft event: valid iff there are no errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ValidationReport {
    valid: bool,
    errors: Vec<String>,
}

impl ValidationReport {
    /// Build a report from the accumulated rule violations.
    pub const fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Whether every rule passed.
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Rule violations in the order the rules ran.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Consume the report, returning the violations.
    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

impl<'de> Deserialize<'de> for ValidationReport {
    /// Only `errors` is read; validity is recomputed from it.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Wire {
            #[serde(default)]
            errors: Vec<String>,
        }

        Wire::deserialize(deserializer).map(|wire| Self::from_errors(wire.errors))
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Ledger-wide aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NetworkStats {
    /// Number of transactions on the ledger.
    pub total_transactions: u64,
    /// Number of distinct batches referenced.
    pub total_batches: u64,
    /// Mean simulated gas per transaction (0 when empty).
    #[ts(as = "String")]
    pub average_gas_used: Decimal,
    /// Health classification.
    pub network_health: NetworkHealth,
    /// Number of confirmed transactions.
    pub confirmed_transactions: u64,
    /// Transaction count per event type.
    pub transactions_by_type: BTreeMap<TransactionEventType, u64>,
}

/// Registry-wide batch aggregates for dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RegistryStats {
    /// Number of registered batches.
    pub total_batches: u64,
    /// Batch count per lifecycle stage.
    pub by_status: BTreeMap<BatchStatus, u64>,
    /// Batches whose provenance trail is complete.
    pub traceability_complete: u64,
    /// Share of complete batches, in percent (0 when empty).
    #[ts(as = "String")]
    pub completion_rate_percent: Decimal,
    /// Mean sustainability score (0 when empty).
    #[ts(as = "String")]
    pub average_score: Decimal,
}

// ---------------------------------------------------------------------------
// Provenance timeline
// ---------------------------------------------------------------------------

/// Kind of step shown on the consumer provenance timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum TimelineStep {
    /// The field collection.
    Collection,
    /// A processing step.
    Processing,
    /// The batch is ready for the consumer.
    ReadyForConsumer,
}

/// One entry of the consumer-facing provenance timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimelineEntry {
    /// Kind of step.
    pub step: TimelineStep,
    /// Short title (e.g. `"Processing: drying"`).
    pub title: String,
    /// When the step happened.
    pub timestamp: DateTime<Utc>,
    /// Region the step happened in.
    pub location: String,
    /// Human-readable detail line.
    pub details: String,
    /// Whether the step is backed by a confirmed ledger record.
    pub completed: bool,
}
