//! Rotation Configuration
//!
//! Fixed amounts and store-contention bounds for the allocation scheme.

use lib_types::Amount;
use serde::{Deserialize, Serialize};

/// Configuration for the rotating-savings core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    // =========================================================================
    // Fixed Amounts
    // =========================================================================
    /// Lump sum disbursed per allocation, constant across the system
    pub payout_amount: Amount,
    /// Entry contribution credited to the pool on adhesion
    pub adhesion_amount: Amount,
    /// ISO 4217 currency code stamped on every wallet and movement record
    pub currency: String,

    // =========================================================================
    // Contention Bounds
    // =========================================================================
    /// How long a caller may wait for the exclusive ledger scope before the
    /// operation surfaces `Timeout`, in milliseconds
    pub acquire_timeout_ms: u64,
    /// SQLite busy handler bound, in milliseconds
    pub busy_timeout_ms: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            // Amounts match the production scheme: 10 000 XOF adhesion,
            // 100 000 XOF payout
            payout_amount: 100_000,
            adhesion_amount: 10_000,
            currency: "XOF".to_string(),

            acquire_timeout_ms: 5_000,
            busy_timeout_ms: 5_000,
        }
    }
}

impl RotationConfig {
    /// Config with short contention bounds for tests
    pub fn for_testing() -> Self {
        Self {
            acquire_timeout_ms: 1_000,
            busy_timeout_ms: 1_000,
            ..Self::default()
        }
    }
}
