//! Canonical primitive types for the pool ledger.
//!
//! These types are the foundational building blocks for all ledger-critical
//! data structures. They are designed to be:
//! - Fixed-size (no dynamic allocation)
//! - Deterministically serializable
//! - Efficient to copy and compare

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TYPE ALIASES
// ============================================================================

/// Monetary amounts in minor currency units (e.g. 1 XOF).
///
/// Signed because the backing store column is a 64-bit integer; the ledger
/// enforces non-negative balances as a runtime invariant, every delta is
/// applied with checked arithmetic.
pub type Amount = i64;

/// Unix timestamp in whole seconds.
pub type Timestamp = i64;

// ============================================================================
// ROW IDENTIFIERS
// ============================================================================

macro_rules! row_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default,
        )]
        pub struct $name(pub i64);

        impl $name {
            /// Create from a raw store row id
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Get the raw store row id
            pub const fn raw(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

row_id!(
    /// Opaque member identity reference
    MemberId
);
row_id!(
    /// Per-member wallet row
    WalletId
);
row_id!(
    /// Wallet/pool money-movement record
    TxId
);
row_id!(
    /// Pool balance-change record
    PoolTxId
);
row_id!(
    /// FIFO admission-queue entry
    FifoEntryId
);
row_id!(
    /// Priority eligibility-list entry
    EligibilityEntryId
);
row_id!(
    /// Open repayment obligation
    ObligationId
);
row_id!(
    /// One payout decision record
    RotationEventId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_id_roundtrip() {
        let id = MemberId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(MemberId::from(42), id);
        assert_eq!(format!("{}", id), "42");
        assert_eq!(format!("{:?}", id), "MemberId(42)");
    }

    #[test]
    fn ids_are_ordered_by_raw_value() {
        assert!(FifoEntryId::new(1) < FifoEntryId::new(2));
    }
}
