//! Rotation Core Errors
//!
//! Every error is raised before any mutation commits; the ledger transaction
//! boundary turns each of these into a full rollback.

use lib_types::{Amount, MemberPhase};
use thiserror::Error;

use crate::state_machine::PhaseEvent;

/// Error during a rotation-core operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RotationError {
    /// The caller's precondition on the membership phase was stale or violated
    #[error("illegal state transition: {event} not allowed from phase {phase}")]
    InvalidStateTransition {
        phase: MemberPhase,
        event: PhaseEvent,
    },

    /// A debit would drive the pool or a wallet balance negative
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: Amount, need: Amount },

    /// Member already has an active FIFO entry
    #[error("member already has an active queue entry")]
    AlreadyQueued,

    /// Eligibility entry was consumed by an earlier allocation
    #[error("eligibility entry already processed")]
    AlreadyProcessed,

    /// FIFO entry was already dequeued
    #[error("queue entry is no longer active")]
    NotActive,

    /// Repayment applied to a member with no in-progress obligation
    #[error("no open repayment obligation for this member")]
    NoOpenObligation,

    /// Repayment applied outside the repayment phases
    #[error("member is not in a repayment phase (currently {phase})")]
    NotRepaying { phase: MemberPhase },

    /// Non-positive monetary input
    #[error("invalid amount: {amount} (must be positive)")]
    InvalidAmount { amount: Amount },

    /// Amount arithmetic left the i64 range
    #[error("amount arithmetic overflow")]
    Overflow,
}

/// Result type for rotation-core operations
pub type RotationResult<T> = Result<T, RotationError>;
