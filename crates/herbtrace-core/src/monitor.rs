//! Ledger-wide network statistics.
//!
//! Computed on demand from a consistent snapshot of the ledger. Counts and
//! the gas mean are exact; health is reported as healthy because the
//! simulated network has no failure modes.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use herbtrace_types::{LedgerTransaction, NetworkHealth, NetworkStats};

/// Aggregate statistics over every transaction in the slice.
pub fn network_stats(transactions: &[LedgerTransaction]) -> NetworkStats {
    let mut batches = BTreeSet::new();
    let mut by_type = BTreeMap::new();
    let mut total: u64 = 0;
    let mut confirmed: u64 = 0;
    let mut gas_sum = Decimal::ZERO;

    for tx in transactions {
        total = total.saturating_add(1);
        if tx.confirmed {
            confirmed = confirmed.saturating_add(1);
        }
        batches.insert(tx.batch_id);
        let count: &mut u64 = by_type.entry(tx.event_type).or_default();
        *count = count.saturating_add(1);
        gas_sum = gas_sum.saturating_add(Decimal::from(tx.gas_used));
    }

    let average_gas_used = if total == 0 {
        Decimal::ZERO
    } else {
        gas_sum
            .checked_div(Decimal::from(total))
            .unwrap_or(Decimal::ZERO)
    };

    NetworkStats {
        total_transactions: total,
        total_batches: u64::try_from(batches.len()).unwrap_or(u64::MAX),
        average_gas_used,
        network_health: classify_health(),
        confirmed_transactions: confirmed,
        transactions_by_type: by_type,
    }
}

/// Health classification. Constant for the simulated network.
pub const fn classify_health() -> NetworkHealth {
    NetworkHealth::Healthy
}
