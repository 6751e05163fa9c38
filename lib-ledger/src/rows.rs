//! Ledger Row Types
//!
//! `FromRow` views of the persisted tables. Enum-typed columns are stored as
//! their wire strings and decoded through the typed accessors; a decode
//! failure means the store was written outside the state machine and is
//! surfaced as corruption, never silently defaulted.

use lib_types::{
    Amount, Direction, EligibilityEntryId, FifoEntryId, MemberId, MemberPhase, ObligationId,
    ObligationStatus, ParseStateError, PayoutSource, PoolTxId, PoolTxKind, RotationEventId,
    Timestamp, TxId, TxKind, TxStatus, WalletId,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Member identity row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MemberRow {
    pub id: i64,
    pub created_at: Timestamp,
}

impl MemberRow {
    pub fn member_id(&self) -> MemberId {
        MemberId::new(self.id)
    }
}

/// Membership state row, one per member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MembershipStateRow {
    pub id: i64,
    pub member_id: i64,
    pub phase: String,
    pub last_changed_at: Timestamp,
}

impl MembershipStateRow {
    pub fn phase(&self) -> Result<MemberPhase, ParseStateError> {
        self.phase.parse()
    }
}

/// Wallet row, one per member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WalletRow {
    pub id: i64,
    pub member_id: i64,
    pub balance: Amount,
    pub currency: String,
}

impl WalletRow {
    pub fn wallet_id(&self) -> WalletId {
        WalletId::new(self.id)
    }
}

/// The singleton shared pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PoolRow {
    pub id: i64,
    pub balance: Amount,
    pub currency: String,
}

/// Immutable wallet/member money movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TransactionRow {
    pub id: i64,
    pub member_id: i64,
    pub wallet_id: Option<i64>,
    pub kind: String,
    pub amount: Amount,
    pub currency: String,
    pub direction: String,
    pub status: String,
    pub external_reference: Option<String>,
    pub metadata: Option<String>,
    pub created_at: Timestamp,
}

impl TransactionRow {
    pub fn tx_id(&self) -> TxId {
        TxId::new(self.id)
    }

    pub fn kind(&self) -> Result<TxKind, ParseStateError> {
        self.kind.parse()
    }

    pub fn direction(&self) -> Result<Direction, ParseStateError> {
        self.direction.parse()
    }

    pub fn status(&self) -> Result<TxStatus, ParseStateError> {
        self.status.parse()
    }
}

/// Immutable pool balance change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PoolTransactionRow {
    pub id: i64,
    pub kind: String,
    pub direction: String,
    pub amount: Amount,
    pub transaction_id: Option<i64>,
    pub rotation_event_id: Option<i64>,
    pub created_at: Timestamp,
}

impl PoolTransactionRow {
    pub fn pool_tx_id(&self) -> PoolTxId {
        PoolTxId::new(self.id)
    }

    pub fn kind(&self) -> Result<PoolTxKind, ParseStateError> {
        self.kind.parse()
    }

    pub fn direction(&self) -> Result<Direction, ParseStateError> {
        self.direction.parse()
    }
}

/// FIFO queue entry; soft-deactivated when consumed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FifoEntryRow {
    pub id: i64,
    pub member_id: i64,
    pub entered_at: Timestamp,
    pub active: bool,
}

impl FifoEntryRow {
    pub fn entry_id(&self) -> FifoEntryId {
        FifoEntryId::new(self.id)
    }

    pub fn member_id(&self) -> MemberId {
        MemberId::new(self.member_id)
    }
}

/// Priority eligibility entry; soft-marked processed when consumed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EligibilityEntryRow {
    pub id: i64,
    pub member_id: i64,
    pub became_eligible_at: Timestamp,
    pub processed: bool,
}

impl EligibilityEntryRow {
    pub fn entry_id(&self) -> EligibilityEntryId {
        EligibilityEntryId::new(self.id)
    }

    pub fn member_id(&self) -> MemberId {
        MemberId::new(self.member_id)
    }
}

/// Repayment obligation opened by a payout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ObligationRow {
    pub id: i64,
    pub member_id: i64,
    pub target_amount: Amount,
    pub amount_paid: Amount,
    pub status: String,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl ObligationRow {
    pub fn obligation_id(&self) -> ObligationId {
        ObligationId::new(self.id)
    }

    pub fn status(&self) -> Result<ObligationStatus, ParseStateError> {
        self.status.parse()
    }

    /// Amount still owed; zero once the target is reached (overpayment
    /// never goes negative here)
    pub fn outstanding(&self) -> Amount {
        (self.target_amount - self.amount_paid).max(0)
    }
}

/// Installment linking an obligation to the transaction that funded it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct InstallmentRow {
    pub id: i64,
    pub obligation_id: i64,
    pub transaction_id: i64,
    pub amount: Amount,
    pub paid_at: Timestamp,
}

/// One payout decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RotationEventRow {
    pub id: i64,
    pub member_id: i64,
    pub amount: Amount,
    pub source: String,
    pub eligibility_entry_id: Option<i64>,
    pub fifo_entry_id: Option<i64>,
    pub triggered_at: Timestamp,
}

impl RotationEventRow {
    pub fn event_id(&self) -> RotationEventId {
        RotationEventId::new(self.id)
    }

    pub fn member_id(&self) -> MemberId {
        MemberId::new(self.member_id)
    }

    pub fn source(&self) -> Result<PayoutSource, ParseStateError> {
        self.source.parse()
    }
}
