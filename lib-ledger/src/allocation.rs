//! Allocation Engine
//!
//! One execution of the selection-and-payout algorithm. The nine steps —
//! fund check, selection, entry consumption, pool debit, wallet credit,
//! obligation opening, phase transition, rotation record, notification —
//! run inside a single transaction. Any failure rolls the whole thing back:
//! no partial payout, no orphaned obligation, no deactivated-but-unpaid
//! queue entry.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lib_rotation::{select_beneficiary, transition, PhaseEvent, Selection};
use lib_types::{
    Direction, EligibilityEntryId, FifoEntryId, MemberId, ObligationStatus, PayoutSource,
    PoolTxKind, RotationEventId, Timestamp, TxKind, TxStatus,
};

use crate::errors::LedgerResult;
use crate::events::LedgerEvent;
use crate::queue;
use crate::rows::RotationEventRow;
use crate::store::{self, LedgerStore};

/// Outcome of one allocation run
///
/// `NoneEligible` is the expected no-op — funds below the payout amount or
/// both waiting lists empty — distinguished from genuine failures so a
/// scheduler retries only on the latter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AllocationOutcome {
    /// Nothing to allocate; no rows changed
    NoneEligible,
    /// A payout was executed and recorded
    Executed(RotationEventRow),
}

impl AllocationOutcome {
    pub fn is_none_eligible(&self) -> bool {
        matches!(self, AllocationOutcome::NoneEligible)
    }

    /// The recorded rotation event, if one was executed
    pub fn rotation_event(&self) -> Option<&RotationEventRow> {
        match self {
            AllocationOutcome::Executed(event) => Some(event),
            AllocationOutcome::NoneEligible => None,
        }
    }
}

impl LedgerStore {
    /// Run one allocation if possible
    ///
    /// Selection is strict priority order: the oldest unprocessed
    /// eligibility entry wins over the whole FIFO queue; within each list,
    /// older entries win (ties by row id). Concurrent runs serialize on the
    /// ledger's exclusive scope — two triggers can never pay the same entry
    /// or double-debit the pool.
    pub async fn run_one_allocation(&self) -> LedgerResult<AllocationOutcome> {
        let now = store::now();
        let payout_amount = self.config().payout_amount;
        let currency = self.config().currency.clone();

        let mut tx = self.db().begin().await?;

        // Steps 1-3: exclusive scope, fund check, selection
        let pool_balance = store::pool_balance_in_tx(&mut *tx).await?;
        let eligible_head = queue::peek_oldest_unprocessed(&mut *tx).await?;
        let fifo_head = queue::peek_head(&mut *tx).await?;

        let selection =
            select_beneficiary(pool_balance, payout_amount, eligible_head, fifo_head);

        let (beneficiary, source, eligibility_ref, fifo_ref) = match selection {
            Selection::NoneEligible => {
                debug!(
                    %pool_balance,
                    %payout_amount,
                    "no allocation possible, nothing mutated"
                );
                return Ok(AllocationOutcome::NoneEligible);
            }
            Selection::Priority(candidate) => {
                queue::consume(&mut *tx, candidate.entry_id).await?;
                (
                    candidate.member_id,
                    PayoutSource::Priority,
                    Some(candidate.entry_id),
                    None,
                )
            }
            Selection::Fifo(candidate) => {
                queue::dequeue(&mut *tx, candidate.entry_id).await?;
                (
                    candidate.member_id,
                    PayoutSource::Fifo,
                    None,
                    Some(candidate.entry_id),
                )
            }
        };

        // Step 8 record comes early in the write order because the pool
        // movement links back to it
        let event_id = record_rotation_event(
            &mut *tx,
            beneficiary,
            payout_amount,
            source,
            eligibility_ref,
            fifo_ref,
            now,
        )
        .await?;

        // Step 4: debit the pool. The fund check above makes this
        // unconditional; a failure here is a broken serialization assumption
        // and rolls everything back.
        let pool_tx_id = store::debit_pool(
            &mut *tx,
            payout_amount,
            PoolTxKind::Payout,
            Some(event_id),
            now,
        )
        .await?;

        // Step 5: credit the beneficiary wallet and back-link the movement
        let wallet = store::credit_wallet(&mut *tx, beneficiary, payout_amount).await?;
        let tx_id = store::record_transaction(
            &mut *tx,
            beneficiary,
            Some(wallet.id),
            TxKind::Payout,
            payout_amount,
            &currency,
            Direction::In,
            TxStatus::Succeeded,
            None,
            now,
        )
        .await?;
        store::link_pool_transaction(&mut *tx, pool_tx_id, tx_id).await?;

        // Step 6: open the repayment obligation
        sqlx::query(
            r#"
            INSERT INTO repayment_obligations
                (member_id, target_amount, amount_paid, status, started_at)
            VALUES (?, ?, 0, ?, ?)
            "#,
        )
        .bind(beneficiary.raw())
        .bind(payout_amount)
        .bind(ObligationStatus::InProgress.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Step 7: advance the membership phase through the transition table
        let phase = store::membership_phase(&mut *tx, beneficiary).await?;
        let next_phase = transition(phase, PhaseEvent::PayoutGranted)?;
        store::set_phase(&mut *tx, beneficiary, next_phase, now).await?;

        tx.commit().await?;

        info!(
            member = %beneficiary,
            amount = %payout_amount,
            %source,
            event = %event_id,
            "rotation payout executed"
        );

        // Step 9: report to the notification collaborator, post-commit
        self.emit(&LedgerEvent::PayoutExecuted {
            member_id: beneficiary,
            amount: payout_amount,
            source,
            rotation_event_id: event_id,
            triggered_at: now,
        });

        Ok(AllocationOutcome::Executed(RotationEventRow {
            id: event_id.raw(),
            member_id: beneficiary.raw(),
            amount: payout_amount,
            source: source.to_string(),
            eligibility_entry_id: eligibility_ref.map(|id| id.raw()),
            fifo_entry_id: fifo_ref.map(|id| id.raw()),
            triggered_at: now,
        }))
    }
}

async fn record_rotation_event(
    conn: &mut sqlx::sqlite::SqliteConnection,
    member: MemberId,
    amount: lib_types::Amount,
    source: PayoutSource,
    eligibility_ref: Option<EligibilityEntryId>,
    fifo_ref: Option<FifoEntryId>,
    at: Timestamp,
) -> LedgerResult<RotationEventId> {
    let result = sqlx::query(
        r#"
        INSERT INTO rotation_events
            (member_id, amount, source, eligibility_entry_id, fifo_entry_id, triggered_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(member.raw())
    .bind(amount)
    .bind(source.to_string())
    .bind(eligibility_ref.map(|id| id.raw()))
    .bind(fifo_ref.map(|id| id.raw()))
    .bind(at)
    .execute(&mut *conn)
    .await?;

    Ok(RotationEventId::new(result.last_insert_rowid()))
}
