//! Ledger Errors
//!
//! Wraps the pure rotation-core taxonomy with the storage-side failures.
//! Every variant is raised before any partial mutation commits; a failing
//! operation leaves the ledger exactly as it found it.

use lib_rotation::RotationError;
use lib_types::{MemberId, ParseStateError};
use thiserror::Error;

/// Error during a ledger operation
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A rotation-core rule rejected the operation
    #[error(transparent)]
    Core(#[from] RotationError),

    /// No member row for the given id
    #[error("member {0} not found")]
    MemberNotFound(MemberId),

    /// An upstream payment notification was replayed
    #[error("duplicate external reference: {0:?}")]
    DuplicateReference(String),

    /// Waiting for the exclusive ledger scope exceeded the configured bound
    #[error("ledger lock wait exceeded")]
    Timeout,

    /// A persisted state string no longer parses; the store was written
    /// outside the core
    #[error("corrupt state in store: {0}")]
    Corrupt(#[from] ParseStateError),

    /// Underlying store failure
    #[error("storage error: {0}")]
    Storage(sqlx::Error),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            // The single-writer pool queues concurrent operations; waiting
            // past the acquire bound surfaces as a contention timeout
            sqlx::Error::PoolTimedOut => LedgerError::Timeout,
            other => LedgerError::Storage(other),
        }
    }
}

impl LedgerError {
    /// The wrapped rotation-core error, if that is what this is
    pub fn as_core(&self) -> Option<&RotationError> {
        match self {
            LedgerError::Core(core) => Some(core),
            _ => None,
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
