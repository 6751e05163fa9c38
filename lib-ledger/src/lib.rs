//! Pool Ledger and Allocation Engine
//!
//! Durable core of the rotating-savings scheme: member wallets, the shared
//! pool, the FIFO admission queue, the priority eligibility list, repayment
//! tracking, and the transactional allocation protocol that ties them
//! together.
//!
//! # Guarantees
//!
//! - Every operation is one atomic transaction: it fully commits or leaves
//!   the ledger untouched
//! - Concurrent operations serialize through a single-writer store; nobody
//!   is ever double-paid, double-queued, or paid from thin air
//! - Balances never go negative; every balance change carries an immutable
//!   movement record
//! - History is append-only: consumed entries are soft-deactivated, never
//!   deleted
//!
//! # Usage
//!
//! ```ignore
//! use lib_ledger::LedgerStore;
//! use lib_rotation::RotationConfig;
//!
//! let ledger = LedgerStore::open("rms.db", RotationConfig::default()).await?;
//! let member = ledger.create_member().await?;
//! ledger.record_adhesion(member.member_id(), None).await?;
//! let outcome = ledger.run_one_allocation().await?;
//! ```

pub mod adhesion;
pub mod allocation;
pub mod errors;
pub mod events;
pub mod queries;
pub mod queue;
pub mod repayment;
pub mod rows;
pub mod schema;
pub mod store;

pub use adhesion::AdhesionReceipt;
pub use allocation::AllocationOutcome;
pub use errors::{LedgerError, LedgerResult};
pub use events::{EventSink, LedgerEvent, RecordingSink, TracingSink};
pub use queries::{LedgerStats, MemberQueueStatus, WalletOverview};
pub use repayment::RepaymentReceipt;
pub use rows::{
    EligibilityEntryRow, FifoEntryRow, InstallmentRow, MemberRow, MembershipStateRow,
    ObligationRow, PoolRow, PoolTransactionRow, RotationEventRow, TransactionRow, WalletRow,
};
pub use schema::LEDGER_SCHEMA;
pub use store::LedgerStore;
