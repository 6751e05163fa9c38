//! Notification Seam
//!
//! The core reports successful allocations and completed repayments to an
//! external notification collaborator. Delivery and format are out of scope;
//! this module only defines the payloads and the sink trait.
//!
//! Events are emitted strictly after the surrounding transaction commits: a
//! sink failure can never roll back ledger state, and a rollback can never
//! have produced an event.

use lib_types::{Amount, MemberId, ObligationId, PayoutSource, RotationEventId, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::info;

/// Payload reported to the notification collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A rotation payout was executed
    PayoutExecuted {
        member_id: MemberId,
        amount: Amount,
        source: PayoutSource,
        rotation_event_id: RotationEventId,
        triggered_at: Timestamp,
    },
    /// A repayment obligation reached its target
    RepaymentCompleted {
        member_id: MemberId,
        obligation_id: ObligationId,
        target_amount: Amount,
        amount_paid: Amount,
        completed_at: Timestamp,
    },
}

/// Receiver for post-commit ledger events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LedgerEvent);
}

/// Default sink: structured log lines only
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::PayoutExecuted {
                member_id,
                amount,
                source,
                ..
            } => {
                info!(member = %member_id, %amount, %source, "payout executed");
            }
            LedgerEvent::RepaymentCompleted {
                member_id,
                amount_paid,
                target_amount,
                ..
            } => {
                info!(
                    member = %member_id,
                    paid = %amount_paid,
                    target = %target_amount,
                    "repayment completed"
                );
            }
        }
    }
}

/// Capturing sink for integration tests and collaborator stubs
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LedgerEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn events(&self) -> Vec<LedgerEvent> {
        // A panicked holder poisons the guard but leaves the Vec intact
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &LedgerEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}
