//! Reporting Projections
//!
//! Read-only queries for the reporting collaborator: counts, sums and
//! per-member overviews. No core logic, no mutation.

use serde::{Deserialize, Serialize};
use sqlx::Row;

use lib_types::{Amount, MemberId, MemberPhase};

use crate::errors::LedgerResult;
use crate::rows::{RotationEventRow, TransactionRow};
use crate::store::LedgerStore;

/// Aggregate ledger statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerStats {
    /// Onboarded members
    pub members: i64,
    /// Active FIFO entries
    pub queue_active: i64,
    /// Unprocessed eligibility entries
    pub eligible_unprocessed: i64,
    /// Executed rotations
    pub rotations: i64,
    /// Sum of all rotation payouts
    pub total_paid_out: Amount,
    /// Current pool balance
    pub pool_balance: Amount,
}

/// Per-member queue view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberQueueStatus {
    pub member_id: MemberId,
    pub phase: MemberPhase,
    /// 1-indexed position among active entries, when queued
    pub position: Option<i64>,
}

/// Wallet state with recent movements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletOverview {
    pub member_id: MemberId,
    pub balance: Amount,
    pub currency: String,
    /// Most recent transactions, newest first
    pub recent_transactions: Vec<TransactionRow>,
}

impl LedgerStore {
    /// Aggregate statistics across the ledger
    pub async fn stats(&self) -> LedgerResult<LedgerStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM members) AS members,
                (SELECT COUNT(*) FROM fifo_entries WHERE active = 1) AS queue_active,
                (SELECT COUNT(*) FROM eligibility_entries WHERE processed = 0) AS eligible_unprocessed,
                (SELECT COUNT(*) FROM rotation_events) AS rotations,
                (SELECT COALESCE(SUM(amount), 0) FROM rotation_events) AS total_paid_out,
                (SELECT balance FROM pool WHERE id = 1) AS pool_balance
            "#,
        )
        .fetch_one(self.db())
        .await?;

        Ok(LedgerStats {
            members: row.get("members"),
            queue_active: row.get("queue_active"),
            eligible_unprocessed: row.get("eligible_unprocessed"),
            rotations: row.get("rotations"),
            total_paid_out: row.get("total_paid_out"),
            pool_balance: row.get("pool_balance"),
        })
    }

    /// A member's phase and queue position in one view
    pub async fn member_queue_status(&self, member: MemberId) -> LedgerResult<MemberQueueStatus> {
        let phase = self.member_phase(member).await?;
        let position = self.queue_position(member).await?;
        Ok(MemberQueueStatus {
            member_id: member,
            phase,
            position,
        })
    }

    /// Wallet balance with the ten most recent transactions
    pub async fn wallet_overview(&self, member: MemberId) -> LedgerResult<WalletOverview> {
        let wallet = self.wallet(member).await?;

        let recent_transactions = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE member_id = ? ORDER BY created_at DESC, id DESC LIMIT 10",
        )
        .bind(member.raw())
        .fetch_all(self.db())
        .await?;

        Ok(WalletOverview {
            member_id: member,
            balance: wallet.balance,
            currency: wallet.currency,
            recent_transactions,
        })
    }

    /// A member's rotation history, newest first
    pub async fn rotations_for(&self, member: MemberId) -> LedgerResult<Vec<RotationEventRow>> {
        let rows = sqlx::query_as::<_, RotationEventRow>(
            "SELECT * FROM rotation_events WHERE member_id = ? ORDER BY triggered_at DESC, id DESC",
        )
        .bind(member.raw())
        .fetch_all(self.db())
        .await?;
        Ok(rows)
    }

    /// Sum of all succeeded inbound transaction amounts
    ///
    /// At any quiescent point this equals `pool.balance + Σ wallet.balance`:
    /// contributions and repayments enter the system, payouts only move
    /// pool → wallet. Exposed for reporting and used as a test invariant.
    pub async fn total_inflow(&self) -> LedgerResult<Amount> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount), 0) AS total FROM transactions WHERE direction = 'in' AND status = 'succeeded' AND kind IN ('adhesion', 'repayment')",
        )
        .fetch_one(self.db())
        .await?;
        Ok(row.get("total"))
    }

    /// Sum of all wallet balances
    pub async fn total_wallet_balance(&self) -> LedgerResult<Amount> {
        let row = sqlx::query("SELECT COALESCE(SUM(balance), 0) AS total FROM wallets")
            .fetch_one(self.db())
            .await?;
        Ok(row.get("total"))
    }
}
