//! Type-safe identifier wrappers.
//!
//! Every record the core assigns an identity to gets a strongly-typed ID
//! so batch, transaction and event identifiers cannot be mixed up at
//! compile time. All IDs use UUID v7 (time-ordered): they sort by creation
//! time and their canonical hyphenated form is URL-safe, which matters for
//! the consumer-facing `/verify/{batch_id}` links.
//!
//! [`TxHash`] is the odd one out: it is an opaque `0x`-prefixed hex token
//! handed to collaborators as a display/reference value.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a batch, the unit of traceability.
    BatchId
}

define_id! {
    /// Unique identifier for a ledger transaction.
    TransactionId
}

define_id! {
    /// Unique identifier for an accepted collection event.
    CollectionEventId
}

define_id! {
    /// Unique identifier for an accepted processing event.
    ProcessingEventId
}

define_id! {
    /// Unique identifier for a quality test record.
    QualityTestId
}

/// Number of hex digits in a transaction hash (after the `0x` prefix).
pub const TX_HASH_HEX_LEN: usize = 64;

/// Opaque transaction hash: `0x` followed by 64 lowercase hex characters.
///
/// Construct with [`TxHash::from_digest`] (ledger side) or parse an
/// externally supplied token with [`FromStr`], which rejects anything that
/// does not have the canonical shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TxHash(String);

impl TxHash {
    /// Build a hash token from a raw 32-byte digest.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(format!("0x{}", hex::encode(digest)))
    }

    /// Borrow the hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for TxHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when a string is not a well-formed [`TxHash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTxHash(pub String);

impl core::fmt::Display for InvalidTxHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "invalid transaction hash: {}", self.0)
    }
}

impl std::error::Error for InvalidTxHash {}

impl FromStr for TxHash {
    type Err = InvalidTxHash;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| InvalidTxHash(s.to_owned()))?;
        if digits.len() != TX_HASH_HEX_LEN || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidTxHash(s.to_owned()));
        }
        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }
}
