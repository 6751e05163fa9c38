//! Ledger state enums and their store wire strings.
//!
//! Every enum here round-trips through `Display`/`FromStr` using the exact
//! lowercase strings persisted in the store. Parsing an unknown string is a
//! data-corruption signal, surfaced as [`ParseStateError`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A persisted state string did not match any known variant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} value in store: {value:?}")]
pub struct ParseStateError {
    /// Which enum failed to parse
    pub kind: &'static str,
    /// The offending stored string
    pub value: String,
}

impl ParseStateError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// MEMBERSHIP PHASE
// ============================================================================

/// Membership lifecycle phase.
///
/// Legal edges only (enforced centrally by the state machine, never by
/// ad-hoc string comparison):
///
/// ```text
/// none → queued → awaiting_repayment → repaying ⟲ → repaid_eligible
///                        ↑__________________________________|
/// ```
///
/// There is no path back to `none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberPhase {
    /// Onboarded, has never contributed
    None,
    /// Contributed, waiting in the FIFO queue
    Queued,
    /// Received a payout, no repayment received yet
    AwaitingRepayment,
    /// Partially repaid an open obligation
    Repaying,
    /// Fully repaid, due a new payout ahead of the queue
    RepaidEligible,
}

impl fmt::Display for MemberPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemberPhase::None => "none",
            MemberPhase::Queued => "queued",
            MemberPhase::AwaitingRepayment => "awaiting_repayment",
            MemberPhase::Repaying => "repaying",
            MemberPhase::RepaidEligible => "repaid_eligible",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for MemberPhase {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(MemberPhase::None),
            "queued" => Ok(MemberPhase::Queued),
            "awaiting_repayment" => Ok(MemberPhase::AwaitingRepayment),
            "repaying" => Ok(MemberPhase::Repaying),
            "repaid_eligible" => Ok(MemberPhase::RepaidEligible),
            other => Err(ParseStateError::new("member phase", other)),
        }
    }
}

// ============================================================================
// MONEY MOVEMENT
// ============================================================================

/// Business kind of a wallet/member transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    /// Entry contribution into the pool
    Adhesion,
    /// Installment against an open obligation
    Repayment,
    /// Lump-sum payout to a beneficiary wallet
    Payout,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxKind::Adhesion => "adhesion",
            TxKind::Repayment => "repayment",
            TxKind::Payout => "payout",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TxKind {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adhesion" => Ok(TxKind::Adhesion),
            "repayment" => Ok(TxKind::Repayment),
            "payout" => Ok(TxKind::Payout),
            other => Err(ParseStateError::new("transaction kind", other)),
        }
    }
}

/// Direction of a money movement relative to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Flow into the pool or a wallet
    In,
    /// Flow out of the pool or a wallet
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Direction::In => "in",
                Direction::Out => "out",
            }
        )
    }
}

impl FromStr for Direction {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            other => Err(ParseStateError::new("direction", other)),
        }
    }
}

/// Settlement status of a transaction record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Awaiting confirmation from the upstream payment notifier
    Pending,
    /// Money movement confirmed
    Succeeded,
    /// Movement rejected upstream, amount never entered the ledger
    Failed,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxStatus::Pending => "pending",
            TxStatus::Succeeded => "succeeded",
            TxStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TxStatus {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TxStatus::Pending),
            "succeeded" => Ok(TxStatus::Succeeded),
            "failed" => Ok(TxStatus::Failed),
            other => Err(ParseStateError::new("transaction status", other)),
        }
    }
}

/// Kind of a pool balance change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolTxKind {
    /// Adhesion or repayment inflow
    Contribution,
    /// Rotation payout outflow
    Payout,
}

impl fmt::Display for PoolTxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PoolTxKind::Contribution => "contribution",
                PoolTxKind::Payout => "payout",
            }
        )
    }
}

impl FromStr for PoolTxKind {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contribution" => Ok(PoolTxKind::Contribution),
            "payout" => Ok(PoolTxKind::Payout),
            other => Err(ParseStateError::new("pool transaction kind", other)),
        }
    }
}

// ============================================================================
// ALLOCATION
// ============================================================================

/// Which list a rotation beneficiary was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutSource {
    /// Repaid-eligible priority list
    Priority,
    /// Admission-order FIFO queue
    Fifo,
}

impl fmt::Display for PayoutSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PayoutSource::Priority => "priority",
                PayoutSource::Fifo => "fifo",
            }
        )
    }
}

impl FromStr for PayoutSource {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "priority" => Ok(PayoutSource::Priority),
            "fifo" => Ok(PayoutSource::Fifo),
            other => Err(ParseStateError::new("payout source", other)),
        }
    }
}

/// Lifecycle status of a repayment obligation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationStatus {
    /// Installments still owed
    InProgress,
    /// Target reached, closed exactly once
    Completed,
}

impl fmt::Display for ObligationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ObligationStatus::InProgress => "in_progress",
                ObligationStatus::Completed => "completed",
            }
        )
    }
}

impl FromStr for ObligationStatus {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(ObligationStatus::InProgress),
            "completed" => Ok(ObligationStatus::Completed),
            other => Err(ParseStateError::new("obligation status", other)),
        }
    }
}
