//! Rotating-savings core primitives.
//! Stable, protocol-neutral, behavior-free.
//!
//! Rule: no raw integers for ledger identifiers outside this crate. Ever.

pub mod primitives;
pub mod states;

pub use primitives::{
    Amount, EligibilityEntryId, FifoEntryId, MemberId, ObligationId, PoolTxId, RotationEventId,
    Timestamp, TxId, WalletId,
};
pub use states::{
    Direction, MemberPhase, ObligationStatus, ParseStateError, PayoutSource, PoolTxKind, TxKind,
    TxStatus,
};
