//! Beneficiary Selection
//!
//! The selection step of the allocation algorithm: given the pool balance and
//! the heads of the two waiting lists, decide who (if anyone) is paid next.
//!
//! Strict priority order:
//! 1. Oldest unprocessed eligibility entry (repaid members jump the queue)
//! 2. Earliest active FIFO entry
//! 3. Nobody — a valid no-op, not an error

use lib_types::{Amount, EligibilityEntryId, FifoEntryId, MemberId, Timestamp};
use serde::{Deserialize, Serialize};

/// Head of the priority eligibility list, as read by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleCandidate {
    pub entry_id: EligibilityEntryId,
    pub member_id: MemberId,
    pub became_eligible_at: Timestamp,
}

/// Head of the FIFO queue, as read by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoCandidate {
    pub entry_id: FifoEntryId,
    pub member_id: MemberId,
    pub entered_at: Timestamp,
}

/// Outcome of the selection step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Pay the oldest repaid-eligible member, consuming their entry
    Priority(EligibleCandidate),
    /// Pay the FIFO head, deactivating their entry
    Fifo(FifoCandidate),
    /// Funds insufficient or both lists empty; nothing may be mutated
    NoneEligible,
}

impl Selection {
    pub fn is_none_eligible(&self) -> bool {
        matches!(self, Selection::NoneEligible)
    }

    /// The selected member, if any
    pub fn member_id(&self) -> Option<MemberId> {
        match self {
            Selection::Priority(c) => Some(c.member_id),
            Selection::Fifo(c) => Some(c.member_id),
            Selection::NoneEligible => None,
        }
    }
}

/// Decide the next beneficiary
///
/// # Rules
///
/// 1. **Funds first**: `pool_balance < payout_amount` means nobody is paid,
///    regardless of who is waiting
/// 2. **Priority over FIFO**: any unprocessed eligibility entry beats every
///    queued member, whatever their queue position
/// 3. The caller supplies the *oldest* candidate from each list; ordering
///    within each list is the store's responsibility
pub fn select_beneficiary(
    pool_balance: Amount,
    payout_amount: Amount,
    eligible_head: Option<EligibleCandidate>,
    fifo_head: Option<FifoCandidate>,
) -> Selection {
    if pool_balance < payout_amount {
        return Selection::NoneEligible;
    }

    if let Some(candidate) = eligible_head {
        return Selection::Priority(candidate);
    }

    if let Some(candidate) = fifo_head {
        return Selection::Fifo(candidate);
    }

    Selection::NoneEligible
}
