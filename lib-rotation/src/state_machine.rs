//! Membership State Machine
//!
//! The single transition table for the membership lifecycle. Every phase
//! change in the system goes through [`transition`]; no caller compares or
//! writes phase strings directly.

use lib_types::MemberPhase;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{RotationError, RotationResult};

/// Lifecycle event driving a phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseEvent {
    /// Adhesion contribution recorded, member enters the FIFO queue
    AdhesionRecorded,
    /// The member's queue or eligibility entry was consumed by an allocation
    PayoutGranted,
    /// An installment arrived but the obligation is still open
    PartialRepayment,
    /// The obligation reached its target
    RepaymentCompleted,
}

impl fmt::Display for PhaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhaseEvent::AdhesionRecorded => "adhesion_recorded",
            PhaseEvent::PayoutGranted => "payout_granted",
            PhaseEvent::PartialRepayment => "partial_repayment",
            PhaseEvent::RepaymentCompleted => "repayment_completed",
        };
        write!(f, "{}", s)
    }
}

/// Compute the successor phase for `(current, event)`
///
/// # Legal edges
///
/// | current             | event               | next                |
/// |---------------------|---------------------|---------------------|
/// | none                | adhesion_recorded   | queued              |
/// | queued              | payout_granted      | awaiting_repayment  |
/// | repaid_eligible     | payout_granted      | awaiting_repayment  |
/// | awaiting_repayment  | partial_repayment   | repaying            |
/// | repaying            | partial_repayment   | repaying            |
/// | awaiting_repayment  | repayment_completed | repaid_eligible     |
/// | repaying            | repayment_completed | repaid_eligible     |
///
/// Every other pair fails with `InvalidStateTransition` and must leave all
/// persisted state untouched (the caller's transaction guarantees that).
pub fn transition(current: MemberPhase, event: PhaseEvent) -> RotationResult<MemberPhase> {
    use MemberPhase::*;
    use PhaseEvent::*;

    let next = match (current, event) {
        (None, AdhesionRecorded) => Queued,
        (Queued, PayoutGranted) => AwaitingRepayment,
        (RepaidEligible, PayoutGranted) => AwaitingRepayment,
        (AwaitingRepayment, PartialRepayment) => Repaying,
        (Repaying, PartialRepayment) => Repaying,
        (AwaitingRepayment, RepaymentCompleted) => RepaidEligible,
        (Repaying, RepaymentCompleted) => RepaidEligible,
        (phase, event) => return Err(RotationError::InvalidStateTransition { phase, event }),
    };
    Ok(next)
}

/// True when `phase` may receive a repayment installment
pub fn accepts_repayment(phase: MemberPhase) -> bool {
    matches!(
        phase,
        MemberPhase::AwaitingRepayment | MemberPhase::Repaying
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use MemberPhase::*;
    use PhaseEvent::*;

    const ALL_PHASES: [MemberPhase; 5] = [None, Queued, AwaitingRepayment, Repaying, RepaidEligible];
    const ALL_EVENTS: [PhaseEvent; 4] = [
        AdhesionRecorded,
        PayoutGranted,
        PartialRepayment,
        RepaymentCompleted,
    ];

    /// Walk the full legal lifecycle end to end
    #[test]
    fn legal_lifecycle_walk() {
        let mut phase = None;
        phase = transition(phase, AdhesionRecorded).unwrap();
        assert_eq!(phase, Queued);
        phase = transition(phase, PayoutGranted).unwrap();
        assert_eq!(phase, AwaitingRepayment);
        phase = transition(phase, PartialRepayment).unwrap();
        assert_eq!(phase, Repaying);
        phase = transition(phase, PartialRepayment).unwrap();
        assert_eq!(phase, Repaying);
        phase = transition(phase, RepaymentCompleted).unwrap();
        assert_eq!(phase, RepaidEligible);
        // A repaid-eligible member granted a new payout cycles back
        phase = transition(phase, PayoutGranted).unwrap();
        assert_eq!(phase, AwaitingRepayment);
    }

    /// Completion straight from awaiting_repayment (single full installment)
    #[test]
    fn completion_without_partial_phase() {
        assert_eq!(
            transition(AwaitingRepayment, RepaymentCompleted).unwrap(),
            RepaidEligible
        );
    }

    /// Invariant: exactly the seven table edges are legal, all other
    /// (phase, event) pairs are rejected
    #[test]
    fn invariant_illegal_pairs_rejected_exhaustively() {
        let legal: [(MemberPhase, PhaseEvent); 7] = [
            (None, AdhesionRecorded),
            (Queued, PayoutGranted),
            (RepaidEligible, PayoutGranted),
            (AwaitingRepayment, PartialRepayment),
            (Repaying, PartialRepayment),
            (AwaitingRepayment, RepaymentCompleted),
            (Repaying, RepaymentCompleted),
        ];

        for phase in ALL_PHASES {
            for event in ALL_EVENTS {
                let result = transition(phase, event);
                if legal.contains(&(phase, event)) {
                    assert!(result.is_ok(), "expected legal: {phase} + {event}");
                } else {
                    assert_eq!(
                        result,
                        Err(RotationError::InvalidStateTransition { phase, event }),
                        "expected illegal: {phase} + {event}"
                    );
                }
            }
        }
    }

    /// No path back to `none` exists from any phase
    #[test]
    fn invariant_none_is_unreachable() {
        for phase in ALL_PHASES {
            for event in ALL_EVENTS {
                if let Ok(next) = transition(phase, event) {
                    assert_ne!(next, None, "{phase} + {event} must not reach none");
                }
            }
        }
    }

    #[test]
    fn repayment_phases() {
        assert!(accepts_repayment(AwaitingRepayment));
        assert!(accepts_repayment(Repaying));
        assert!(!accepts_repayment(None));
        assert!(!accepts_repayment(Queued));
        assert!(!accepts_repayment(RepaidEligible));
    }
}
