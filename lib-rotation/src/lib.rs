//! Rotation Core Logic
//!
//! Pure decision logic for the rotating-savings allocation scheme. No I/O:
//! every function here takes plain values and returns a typed result, so the
//! whole module is testable without a store.
//!
//! # Responsibilities
//!
//! 1. **Membership state machine**: the single transition table that decides
//!    which phase changes are legal
//! 2. **Beneficiary selection**: strict priority order — repaid-eligible list
//!    first, FIFO queue second
//! 3. **Repayment math**: installment application and completion detection
//!
//! The durable side (locking, transactions, row mutation) lives in
//! `lib-ledger`; it calls into this crate for every decision so that the
//! rules exist in exactly one place.
//!
//! # Usage
//!
//! ```ignore
//! use lib_rotation::{transition, PhaseEvent};
//! use lib_types::MemberPhase;
//!
//! let next = transition(MemberPhase::Queued, PhaseEvent::PayoutGranted)?;
//! assert_eq!(next, MemberPhase::AwaitingRepayment);
//! ```

pub mod config;
pub mod errors;
pub mod repayment;
pub mod selection;
pub mod state_machine;

pub use config::RotationConfig;
pub use errors::{RotationError, RotationResult};
pub use repayment::{apply_installment, InstallmentOutcome};
pub use selection::{select_beneficiary, EligibleCandidate, FifoCandidate, Selection};
pub use state_machine::{transition, PhaseEvent};
