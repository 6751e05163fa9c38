//! Repayment Tracker
//!
//! Applies repayment installments against the member's open obligation,
//! detects completion, and feeds the priority eligibility list. The whole
//! operation is one atomic transaction; the completion event is reported to
//! the notification seam only after commit.

use serde::{Deserialize, Serialize};
use tracing::info;

use lib_rotation::{
    apply_installment, transition, PhaseEvent, RotationError,
};
use lib_types::{
    Amount, Direction, MemberId, MemberPhase, ObligationId, ObligationStatus, PoolTxKind, TxId,
    TxKind, TxStatus,
};

use crate::errors::LedgerResult;
use crate::queue;
use crate::rows::ObligationRow;
use crate::store::{self, LedgerStore};
use crate::events::LedgerEvent;

/// Result of one applied installment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentReceipt {
    pub member_id: MemberId,
    /// The inbound repayment transaction
    pub transaction_id: TxId,
    /// The obligation the installment was applied to
    pub obligation_id: ObligationId,
    /// `amount_paid` after this installment
    pub amount_paid: Amount,
    /// Member phase after this installment
    pub phase: MemberPhase,
    /// True exactly when this installment completed the obligation
    pub completed: bool,
}

impl LedgerStore {
    /// Apply a repayment installment of `amount` for `member`
    ///
    /// Preconditions: `amount > 0`; phase ∈ {awaiting_repayment, repaying};
    /// an in-progress obligation exists. Atomically:
    /// 1. Records the inbound Transaction (`repayment`, `in`, `succeeded`)
    /// 2. Credits the pool, recording a PoolTransaction (`contribution`)
    /// 3. Records the RepaymentInstallment against the open obligation
    /// 4. Bumps `amount_paid`; on reaching the target, completes the
    ///    obligation, moves the phase to `repaid_eligible` and upserts the
    ///    eligibility entry; otherwise moves the phase to `repaying`
    ///
    /// Overpayment is absorbed and recorded as-is.
    pub async fn apply_repayment(
        &self,
        member: MemberId,
        amount: Amount,
        external_reference: Option<&str>,
    ) -> LedgerResult<RepaymentReceipt> {
        if amount <= 0 {
            return Err(RotationError::InvalidAmount { amount }.into());
        }

        let now = store::now();
        let currency = self.config().currency.clone();

        let mut tx = self.db().begin().await?;

        let phase = store::membership_phase(&mut *tx, member).await?;
        if !lib_rotation::state_machine::accepts_repayment(phase) {
            return Err(RotationError::NotRepaying { phase }.into());
        }

        let obligation = sqlx::query_as::<_, ObligationRow>(
            "SELECT * FROM repayment_obligations WHERE member_id = ? AND status = ? ORDER BY id LIMIT 1",
        )
        .bind(member.raw())
        .bind(ObligationStatus::InProgress.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RotationError::NoOpenObligation)?;

        store::ensure_reference_unused(&mut *tx, external_reference).await?;

        let outcome = apply_installment(obligation.target_amount, obligation.amount_paid, amount)?;

        let tx_id = store::record_transaction(
            &mut *tx,
            member,
            None,
            TxKind::Repayment,
            amount,
            &currency,
            Direction::In,
            TxStatus::Succeeded,
            external_reference,
            now,
        )
        .await?;

        store::credit_pool(&mut *tx, amount, PoolTxKind::Contribution, Some(tx_id), None, now)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO repayment_installments (obligation_id, transaction_id, amount, paid_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(obligation.id)
        .bind(tx_id.raw())
        .bind(amount)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let next_phase;
        if outcome.completed {
            sqlx::query(
                "UPDATE repayment_obligations SET amount_paid = ?, status = ?, completed_at = ? WHERE id = ?",
            )
            .bind(outcome.new_amount_paid)
            .bind(ObligationStatus::Completed.to_string())
            .bind(now)
            .bind(obligation.id)
            .execute(&mut *tx)
            .await?;

            next_phase = transition(phase, PhaseEvent::RepaymentCompleted)?;
            store::set_phase(&mut *tx, member, next_phase, now).await?;
            queue::mark_eligible(&mut *tx, member, now).await?;
        } else {
            sqlx::query("UPDATE repayment_obligations SET amount_paid = ? WHERE id = ?")
                .bind(outcome.new_amount_paid)
                .bind(obligation.id)
                .execute(&mut *tx)
                .await?;

            next_phase = transition(phase, PhaseEvent::PartialRepayment)?;
            store::set_phase(&mut *tx, member, next_phase, now).await?;
        }

        tx.commit().await?;

        info!(
            member = %member,
            %amount,
            paid = outcome.new_amount_paid,
            target = obligation.target_amount,
            completed = outcome.completed,
            "repayment installment applied"
        );

        if outcome.completed {
            self.emit(&LedgerEvent::RepaymentCompleted {
                member_id: member,
                obligation_id: obligation.obligation_id(),
                target_amount: obligation.target_amount,
                amount_paid: outcome.new_amount_paid,
                completed_at: now,
            });
        }

        Ok(RepaymentReceipt {
            member_id: member,
            transaction_id: tx_id,
            obligation_id: obligation.obligation_id(),
            amount_paid: outcome.new_amount_paid,
            phase: next_phase,
            completed: outcome.completed,
        })
    }

    /// The member's current in-progress obligation, if any
    pub async fn current_obligation(&self, member: MemberId) -> LedgerResult<Option<ObligationRow>> {
        let row = sqlx::query_as::<_, ObligationRow>(
            "SELECT * FROM repayment_obligations WHERE member_id = ? AND status = ? ORDER BY id LIMIT 1",
        )
        .bind(member.raw())
        .bind(ObligationStatus::InProgress.to_string())
        .fetch_optional(self.db())
        .await?;
        Ok(row)
    }
}
