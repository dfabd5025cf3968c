//! Transaction construction and hash derivation.
//!
//! A [`TransactionBuilder`] collects the header fields of a
//! [`LedgerTransaction`] and derives its public hash. The hash is SHA-256
//! over the canonical JSON of the header, the payload, the ledger sequence
//! number and a random nonce: content-bound, yet unique per append even for
//! identical payloads.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use herbtrace_types::{BatchId, LedgerTransaction, TransactionEventType, TransactionId, TxHash};

use crate::LedgerError;

// ---------------------------------------------------------------------------
// Transaction builder
// ---------------------------------------------------------------------------

/// Builder for constructing [`LedgerTransaction`] values.
///
/// # Examples
///
/// ```
/// use herbtrace_ledger::TransactionBuilder;
/// use herbtrace_types::{BatchId, TransactionEventType};
///
/// let tx = TransactionBuilder::new(TransactionEventType::Transfer, BatchId::new())
///     .user_id("farmer-1".to_owned())
///     .data(serde_json::json!({ "to_user_id": "processor-1" }))
///     .sequence(1)
///     .gas_used(21_000)
///     .build();
///
/// assert!(tx.is_ok());
/// ```
#[derive(Debug)]
pub struct TransactionBuilder {
    event_type: TransactionEventType,
    batch_id: BatchId,
    user_id: Option<String>,
    data: Option<serde_json::Value>,
    sequence: Option<u64>,
    timestamp: Option<DateTime<Utc>>,
    gas_used: Option<u64>,
    nonce: u64,
}

impl TransactionBuilder {
    /// Start building a transaction of the given type for a batch.
    pub const fn new(event_type: TransactionEventType, batch_id: BatchId) -> Self {
        Self {
            event_type,
            batch_id,
            user_id: None,
            data: None,
            sequence: None,
            timestamp: None,
            gas_used: None,
            nonce: 0,
        }
    }

    /// Set the acting user.
    #[must_use]
    pub fn user_id(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Set the event payload.
    #[must_use]
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the ledger sequence number.
    #[must_use]
    pub const fn sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Set the append timestamp. Defaults to now.
    #[must_use]
    pub const fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the simulated gas cost.
    #[must_use]
    pub const fn gas_used(mut self, gas: u64) -> Self {
        self.gas_used = Some(gas);
        self
    }

    /// Set the hash nonce.
    #[must_use]
    pub const fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Validate inputs, derive the hash and produce a confirmed
    /// [`LedgerTransaction`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingField`] if a required field is not set.
    /// Returns [`LedgerError::Serialization`] if the hash input cannot be
    /// serialized.
    pub fn build(self) -> Result<LedgerTransaction, LedgerError> {
        let user_id = self.user_id.ok_or(LedgerError::MissingField("user_id"))?;
        let data = self.data.ok_or(LedgerError::MissingField("data"))?;
        let sequence = self.sequence.ok_or(LedgerError::MissingField("sequence"))?;
        let gas_used = self.gas_used.ok_or(LedgerError::MissingField("gas_used"))?;
        let timestamp = self.timestamp.unwrap_or_else(Utc::now);
        let id = TransactionId::new();

        let tx_hash = transaction_hash(&HashInput {
            id,
            sequence,
            event_type: self.event_type,
            batch_id: self.batch_id,
            user_id: &user_id,
            timestamp,
            data: &data,
            gas_used,
            nonce: self.nonce,
        })?;

        Ok(LedgerTransaction {
            id,
            tx_hash,
            sequence,
            event_type: self.event_type,
            batch_id: self.batch_id,
            user_id,
            timestamp,
            data,
            gas_used,
            confirmed: true,
        })
    }
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Canonical hash input. Field order is part of the hash format.
#[derive(Serialize)]
struct HashInput<'a> {
    id: TransactionId,
    sequence: u64,
    event_type: TransactionEventType,
    batch_id: BatchId,
    user_id: &'a str,
    timestamp: DateTime<Utc>,
    data: &'a serde_json::Value,
    gas_used: u64,
    nonce: u64,
}

fn transaction_hash(input: &HashInput<'_>) -> Result<TxHash, LedgerError> {
    let bytes = serde_json::to_vec(input)?;
    let digest: [u8; 32] = Sha256::digest(&bytes).into();
    Ok(TxHash::from_digest(&digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> TransactionBuilder {
        TransactionBuilder::new(TransactionEventType::Collection, BatchId::new())
            .user_id("collector-1".to_owned())
            .data(serde_json::json!({ "species": "Turmeric" }))
            .sequence(1)
            .gas_used(30_000)
    }

    #[test]
    fn builder_produces_confirmed_transaction() {
        let tx = base().build().ok();
        assert!(tx.is_some());
        if let Some(tx) = tx {
            assert!(tx.confirmed);
            assert_eq!(tx.sequence, 1);
            assert_eq!(tx.gas_used, 30_000);
            assert_eq!(tx.event_type, TransactionEventType::Collection);
        }
    }

    #[test]
    fn hash_has_canonical_shape() {
        let tx = base().build().ok();
        let hash = tx.map(|t| t.tx_hash.to_string()).unwrap_or_default();
        assert_eq!(hash.len(), 66);
        assert!(hash.starts_with("0x"));
        assert!(hash.chars().skip(2).all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(hash.parse::<TxHash>().is_ok());
    }

    #[test]
    fn identical_payloads_hash_differently() {
        let a = base().nonce(1).build().ok().map(|t| t.tx_hash);
        let b = base().nonce(1).build().ok().map(|t| t.tx_hash);
        assert!(a.is_some());
        assert_ne!(a, b);
    }

    #[test]
    fn missing_user_rejected() {
        let result = TransactionBuilder::new(TransactionEventType::Transfer, BatchId::new())
            .data(serde_json::Value::Null)
            .sequence(1)
            .gas_used(1)
            .build();
        assert!(matches!(result, Err(LedgerError::MissingField("user_id"))));
    }

    #[test]
    fn missing_gas_rejected() {
        let result = TransactionBuilder::new(TransactionEventType::Transfer, BatchId::new())
            .user_id("u".to_owned())
            .data(serde_json::Value::Null)
            .sequence(1)
            .build();
        assert!(matches!(result, Err(LedgerError::MissingField("gas_used"))));
    }
}
