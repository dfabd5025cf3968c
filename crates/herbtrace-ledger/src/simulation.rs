//! Simulated resource cost ("gas") for ledger transactions.
//!
//! Gas has no meaning beyond presentation. Each event type draws from its
//! own half-open range; the defaults reproduce the figures collaborators
//! are used to seeing.

use rand::Rng;
use serde::{Deserialize, Serialize};

use herbtrace_types::TransactionEventType;

/// Half-open range `[min, max)` of simulated gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasRange {
    /// Inclusive lower bound.
    pub min: u64,
    /// Exclusive upper bound.
    pub max: u64,
}

impl GasRange {
    /// Create a range.
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Draw a gas value. A degenerate range always yields `min`.
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> u64 {
        if self.max <= self.min {
            return self.min;
        }
        rng.random_range(self.min..self.max)
    }
}

/// Gas ranges for every transaction event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasSchedule {
    /// Field collection.
    #[serde(default = "default_collection")]
    pub collection: GasRange,
    /// Processing step.
    #[serde(default = "default_processing")]
    pub processing: GasRange,
    /// Quality test.
    #[serde(default = "default_quality_test")]
    pub quality_test: GasRange,
    /// Custody transfer.
    #[serde(default = "default_transfer")]
    pub transfer: GasRange,
}

impl GasSchedule {
    /// Range used for the given event type.
    pub const fn for_event(&self, event_type: TransactionEventType) -> GasRange {
        match event_type {
            TransactionEventType::Collection => self.collection,
            TransactionEventType::Processing => self.processing,
            TransactionEventType::QualityTest => self.quality_test,
            TransactionEventType::Transfer => self.transfer,
        }
    }
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            processing: default_processing(),
            quality_test: default_quality_test(),
            transfer: default_transfer(),
        }
    }
}

const fn default_collection() -> GasRange {
    GasRange::new(21_000, 71_000)
}

const fn default_processing() -> GasRange {
    GasRange::new(30_000, 105_000)
}

const fn default_quality_test() -> GasRange {
    GasRange::new(25_000, 65_000)
}

const fn default_transfer() -> GasRange {
    GasRange::new(20_000, 55_000)
}
