//! Adhesion Contribution
//!
//! Entry point of the rotation cycle: the member pays the fixed adhesion
//! amount into the shared pool and takes a place at the back of the FIFO
//! queue. One atomic transaction covers the money movement, the queue entry
//! and the phase change.

use serde::{Deserialize, Serialize};
use tracing::info;

use lib_rotation::{transition, PhaseEvent};
use lib_types::{Amount, Direction, FifoEntryId, MemberId, PoolTxKind, TxId, TxKind, TxStatus};

use crate::errors::LedgerResult;
use crate::store::{self, LedgerStore};
use crate::queue;

/// Result of a recorded adhesion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdhesionReceipt {
    pub member_id: MemberId,
    /// The inbound adhesion transaction
    pub transaction_id: TxId,
    /// The member's new queue entry
    pub fifo_entry_id: FifoEntryId,
    /// Pool balance after the contribution
    pub pool_balance: Amount,
    /// 1-indexed queue position at commit time
    pub position: i64,
}

impl LedgerStore {
    /// Record an adhesion contribution for `member`
    ///
    /// Requires phase `none`. Atomically:
    /// 1. Records the inbound Transaction (`adhesion`, `in`, `succeeded`)
    /// 2. Credits the pool, recording a PoolTransaction (`contribution`)
    /// 3. Inserts the active FIFO entry
    /// 4. Transitions the membership phase `none → queued`
    ///
    /// `external_reference`, when given, deduplicates replayed upstream
    /// payment notifications (`DuplicateReference`).
    pub async fn record_adhesion(
        &self,
        member: MemberId,
        external_reference: Option<&str>,
    ) -> LedgerResult<AdhesionReceipt> {
        let now = store::now();
        let amount = self.config().adhesion_amount;
        let currency = self.config().currency.clone();

        let mut tx = self.db().begin().await?;

        // Phase precondition first: only a fresh member may adhere
        let phase = store::membership_phase(&mut *tx, member).await?;
        let next_phase = transition(phase, PhaseEvent::AdhesionRecorded)?;

        store::ensure_reference_unused(&mut *tx, external_reference).await?;

        // Adhesion money goes to the shared pool, not the member wallet
        let tx_id = store::record_transaction(
            &mut *tx,
            member,
            None,
            TxKind::Adhesion,
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

        let fifo_entry_id = queue::enqueue(&mut *tx, member, now).await?;
        store::set_phase(&mut *tx, member, next_phase, now).await?;

        let pool_balance = store::pool_balance_in_tx(&mut *tx).await?;
        let position = queue::position(&mut *tx, member)
            .await?
            .unwrap_or(1);

        tx.commit().await?;

        info!(
            member = %member,
            %amount,
            position,
            "adhesion recorded, member queued"
        );

        Ok(AdhesionReceipt {
            member_id: member,
            transaction_id: tx_id,
            fifo_entry_id,
            pool_balance,
            position,
        })
    }
}
