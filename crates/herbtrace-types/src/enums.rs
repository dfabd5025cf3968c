//! Enumeration types for the HerbTrace core.
//!
//! Wire names follow the vocabulary the collection and processing forms
//! already speak (`hand-picked`, `quality-test`, `heavy-metals`, ...), so
//! payloads produced by external collaborators deserialize unchanged.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Species reference data
// ---------------------------------------------------------------------------

/// Botanical part a species is harvested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum SpeciesCategory {
    /// Roots and rhizomes (turmeric, ashwagandha).
    Root,
    /// Leaves (neem, tulsi).
    Leaf,
    /// Flowers.
    Flower,
    /// Seeds.
    Seed,
    /// Bark.
    Bark,
    /// Fruit.
    Fruit,
}

/// Conservation status of a species in the wild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum SustainabilityStatus {
    /// Plentiful; harvesting has negligible impact.
    Abundant,
    /// Stable populations under managed harvest.
    Moderate,
    /// Populations under pressure.
    Vulnerable,
    /// At risk of disappearing from the wild.
    Endangered,
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Unit a collected quantity is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum QuantityUnit {
    /// Kilograms.
    Kg,
    /// Grams.
    Grams,
    /// Hand-tied bundles.
    Bundles,
}

impl QuantityUnit {
    /// Wire name, for display.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Kg => "kg",
            Self::Grams => "grams",
            Self::Bundles => "bundles",
        }
    }
}

/// How the material was harvested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum HarvestMethod {
    /// Picked by hand.
    HandPicked,
    /// Cut or dug with hand tools.
    ToolAssisted,
    /// Harvested by machine.
    Mechanical,
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

/// A processing step applied to a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ProcessType {
    /// Washing and sorting.
    Cleaning,
    /// Sun or oven drying.
    Drying,
    /// Milling into powder.
    Grinding,
    /// Solvent or steam extraction.
    Extraction,
    /// Final packaging for distribution.
    Packaging,
}

impl ProcessType {
    /// Wire name, for display.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cleaning => "cleaning",
            Self::Drying => "drying",
            Self::Grinding => "grinding",
            Self::Extraction => "extraction",
            Self::Packaging => "packaging",
        }
    }
}

/// Laboratory test category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum QualityTestType {
    /// Identity and adulterant screening.
    Purity,
    /// Active compound concentration.
    Potency,
    /// Microbial or pesticide contamination.
    Contamination,
    /// Residual moisture content.
    Moisture,
    /// Lead, arsenic, cadmium and mercury limits.
    HeavyMetals,
}

// ---------------------------------------------------------------------------
// Batch lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle stage of a batch.
///
/// Variants are declared in lifecycle order, so the derived [`Ord`] is the
/// progression `Collected < Processing < ... < Sold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum BatchStatus {
    /// Collected in the field; no processing yet.
    Collected,
    /// At least one processing step recorded.
    Processing,
    /// Laboratory tested.
    Tested,
    /// Packaged as a final product.
    Packaged,
    /// Handed to the distribution network.
    Distributed,
    /// Sold to a consumer.
    Sold,
}

impl BatchStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Collected,
        Self::Processing,
        Self::Tested,
        Self::Packaged,
        Self::Distributed,
        Self::Sold,
    ];

    /// Whether a batch at this stage has a complete provenance trail.
    pub const fn completes_traceability(self) -> bool {
        matches!(self, Self::Packaged | Self::Distributed | Self::Sold)
    }

    /// The stage a batch reaches once the given processing step is recorded.
    pub const fn after_process(process: ProcessType) -> Self {
        match process {
            ProcessType::Packaging => Self::Packaged,
            ProcessType::Cleaning
            | ProcessType::Drying
            | ProcessType::Grinding
            | ProcessType::Extraction => Self::Processing,
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Kind of domain event a ledger transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum TransactionEventType {
    /// Field collection (establishes the batch).
    Collection,
    /// A processing step.
    Processing,
    /// A laboratory test result.
    QualityTest,
    /// Custody change between two parties.
    Transfer,
}

/// Coarse health classification of the simulated network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum NetworkHealth {
    /// Accepting and confirming transactions normally.
    Healthy,
    /// Confirmations delayed.
    Congested,
    /// Not accepting transactions.
    Offline,
}

/// Consumer-facing label for a sustainability score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ScoreGrade {
    /// Below 40.
    Poor,
    /// 40 to 59.
    Fair,
    /// 60 to 79.
    Good,
    /// 80 and above.
    Excellent,
}

impl ScoreGrade {
    /// Classify a 0-100 sustainability score.
    pub const fn from_score(score: u8) -> Self {
        match score {
            80.. => Self::Excellent,
            60..=79 => Self::Good,
            40..=59 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_collaborator_vocabulary() {
        let json = serde_json::to_string(&HarvestMethod::HandPicked).ok();
        assert_eq!(json.as_deref(), Some("\"hand-picked\""));

        let json = serde_json::to_string(&TransactionEventType::QualityTest).ok();
        assert_eq!(json.as_deref(), Some("\"quality-test\""));

        let json = serde_json::to_string(&QualityTestType::HeavyMetals).ok();
        assert_eq!(json.as_deref(), Some("\"heavy-metals\""));

        let parsed: Option<BatchStatus> = serde_json::from_str("\"distributed\"").ok();
        assert_eq!(parsed, Some(BatchStatus::Distributed));
    }

    #[test]
    fn status_order_follows_lifecycle() {
        for pair in BatchStatus::ALL.windows(2) {
            if let [earlier, later] = pair {
                assert!(earlier < later, "{earlier:?} should precede {later:?}");
            }
        }
    }

    #[test]
    fn only_late_stages_complete_traceability() {
        let complete: Vec<BatchStatus> = BatchStatus::ALL
            .into_iter()
            .filter(|s| s.completes_traceability())
            .collect();
        assert_eq!(
            complete,
            vec![BatchStatus::Packaged, BatchStatus::Distributed, BatchStatus::Sold]
        );
    }

    #[test]
    fn packaging_step_moves_batch_to_packaged() {
        assert_eq!(
            BatchStatus::after_process(ProcessType::Packaging),
            BatchStatus::Packaged
        );
        assert_eq!(
            BatchStatus::after_process(ProcessType::Drying),
            BatchStatus::Processing
        );
    }

    #[test]
    fn labels_match_wire_names() {
        for process in [ProcessType::Cleaning, ProcessType::Extraction, ProcessType::Packaging] {
            let wire = serde_json::to_value(process).ok();
            assert_eq!(wire, Some(serde_json::Value::from(process.label())));
        }
        let wire = serde_json::to_value(QuantityUnit::Bundles).ok();
        assert_eq!(wire, Some(serde_json::Value::from(QuantityUnit::Bundles.label())));
    }

    #[test]
    fn score_grade_boundaries() {
        assert_eq!(ScoreGrade::from_score(100), ScoreGrade::Excellent);
        assert_eq!(ScoreGrade::from_score(80), ScoreGrade::Excellent);
        assert_eq!(ScoreGrade::from_score(79), ScoreGrade::Good);
        assert_eq!(ScoreGrade::from_score(60), ScoreGrade::Good);
        assert_eq!(ScoreGrade::from_score(40), ScoreGrade::Fair);
        assert_eq!(ScoreGrade::from_score(39), ScoreGrade::Poor);
        assert_eq!(ScoreGrade::from_score(0), ScoreGrade::Poor);
    }
}
