//! Ledger Store
//!
//! Durable transactional storage for the rotating-savings core, backed by
//! SQLite via sqlx.
//!
//! # Concurrency model
//!
//! Pessimistic row locking is realized with a
//! single-writer connection pool: every mutating operation runs inside one
//! `sqlx::Transaction` on the pool's only connection, so two concurrent
//! operations queue on connection acquisition instead of interleaving.
//! Waiting past the configured bound surfaces [`LedgerError::Timeout`].
//! A transaction dropped on any error path rolls back, which is what gives
//! every operation its all-or-nothing guarantee.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use tracing::{debug, info};

use lib_rotation::RotationConfig;
use lib_types::{
    Amount, Direction, MemberId, MemberPhase, PoolTxId, PoolTxKind, RotationEventId, Timestamp,
    TxId, TxKind, TxStatus,
};

use crate::errors::{LedgerError, LedgerResult};
use crate::events::{EventSink, LedgerEvent, TracingSink};
use crate::rows::{MemberRow, PoolRow, WalletRow};
use crate::schema::LEDGER_SCHEMA;

/// Handle to the pool ledger
///
/// Cheap to clone; all clones share the same single-writer pool and event
/// sink.
#[derive(Clone)]
pub struct LedgerStore {
    pool: SqlitePool,
    config: RotationConfig,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LedgerStore {
    /// Open or create the ledger database at the given path
    ///
    /// Enables WAL mode and foreign keys, runs migrations, and seeds the
    /// singleton pool row if absent.
    pub async fn open(path: impl AsRef<Path>, config: RotationConfig) -> LedgerResult<Self> {
        let path = path.as_ref();
        let url = format!("sqlite:{}?mode=rwc", path.display());

        info!("opening ledger store at {}", path.display());

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(LedgerError::Storage)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .create_if_missing(true);

        Self::connect(options, config).await
    }

    /// Open an in-memory ledger (tests and simulations)
    pub async fn open_in_memory(config: RotationConfig) -> LedgerResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(LedgerError::Storage)?
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        Self::connect(options, config).await
    }

    async fn connect(options: SqliteConnectOptions, config: RotationConfig) -> LedgerResult<Self> {
        // One writable connection: operations on the pool row serialize by
        // construction, matching the pessimistic-lock contract. The in-memory
        // database also lives and dies with this connection, so it is pinned.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            config,
            sink: Arc::new(TracingSink),
        };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Replace the notification sink (builder-style)
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Raw handle to the backing database, for external read-only
    /// projections and fixtures.
    pub fn db(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn emit(&self, event: &LedgerEvent) {
        self.sink.emit(event);
    }

    /// Close the underlying connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn run_migrations(&self) -> LedgerResult<()> {
        debug!("running ledger migrations");
        sqlx::raw_sql(LEDGER_SCHEMA).execute(&self.pool).await?;

        // Seed the singleton pool row
        sqlx::query("INSERT OR IGNORE INTO pool (id, balance, currency) VALUES (1, 0, ?)")
            .bind(&self.config.currency)
            .execute(&self.pool)
            .await?;

        debug!("ledger migrations completed");
        Ok(())
    }

    // ========================================================================
    // Onboarding
    // ========================================================================

    /// Create a member with their wallet and membership state, atomically
    ///
    /// The member starts in phase `none` with a zero wallet balance. This is
    /// the entry point the onboarding collaborator calls once an identity is
    /// admitted.
    pub async fn create_member(&self) -> LedgerResult<MemberRow> {
        let now = now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("INSERT INTO members (created_at) VALUES (?)")
            .bind(now)
            .execute(&mut *tx)
            .await?;
        let member_id = result.last_insert_rowid();

        sqlx::query(
            "INSERT INTO membership_states (member_id, phase, last_changed_at) VALUES (?, ?, ?)",
        )
        .bind(member_id)
        .bind(MemberPhase::None.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO wallets (member_id, balance, currency) VALUES (?, 0, ?)")
            .bind(member_id)
            .bind(&self.config.currency)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(member = member_id, "member onboarded");
        Ok(MemberRow {
            id: member_id,
            created_at: now,
        })
    }

    // ========================================================================
    // Read-only lookups
    // ========================================================================

    /// Current pool snapshot
    pub async fn pool_row(&self) -> LedgerResult<PoolRow> {
        let row = sqlx::query_as::<_, PoolRow>("SELECT * FROM pool WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Current pool balance
    pub async fn pool_balance(&self) -> LedgerResult<Amount> {
        Ok(self.pool_row().await?.balance)
    }

    /// A member's wallet
    pub async fn wallet(&self, member: MemberId) -> LedgerResult<WalletRow> {
        sqlx::query_as::<_, WalletRow>("SELECT * FROM wallets WHERE member_id = ?")
            .bind(member.raw())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::MemberNotFound(member))
    }

    /// A member's current phase
    pub async fn member_phase(&self, member: MemberId) -> LedgerResult<MemberPhase> {
        let mut conn = self.pool.acquire().await?;
        membership_phase(&mut *conn, member).await
    }
}

/// Current unix timestamp in whole seconds
pub(crate) fn now() -> Timestamp {
    chrono::Utc::now().timestamp()
}

// ============================================================================
// Transaction-scope helpers
// ============================================================================
//
// Every helper below requires the caller to already be inside the exclusive
// transaction scope; none of them commits.

/// Fetch the member's phase, decoded through the state enum
pub(crate) async fn membership_phase(
    conn: &mut SqliteConnection,
    member: MemberId,
) -> LedgerResult<MemberPhase> {
    let phase: Option<(String,)> =
        sqlx::query_as("SELECT phase FROM membership_states WHERE member_id = ?")
            .bind(member.raw())
            .fetch_optional(&mut *conn)
            .await?;

    match phase {
        Some((raw,)) => Ok(raw.parse()?),
        None => Err(LedgerError::MemberNotFound(member)),
    }
}

/// Persist an already-validated phase change
pub(crate) async fn set_phase(
    conn: &mut SqliteConnection,
    member: MemberId,
    phase: MemberPhase,
    at: Timestamp,
) -> LedgerResult<()> {
    sqlx::query("UPDATE membership_states SET phase = ?, last_changed_at = ? WHERE member_id = ?")
        .bind(phase.to_string())
        .bind(at)
        .bind(member.raw())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Pool balance inside the exclusive scope
pub(crate) async fn pool_balance_in_tx(conn: &mut SqliteConnection) -> LedgerResult<Amount> {
    let (balance,): (Amount,) = sqlx::query_as("SELECT balance FROM pool WHERE id = 1")
        .fetch_one(&mut *conn)
        .await?;
    Ok(balance)
}

/// Credit the pool by `amount`, recording a PoolTransaction
pub(crate) async fn credit_pool(
    conn: &mut SqliteConnection,
    amount: Amount,
    kind: PoolTxKind,
    origin_tx: Option<TxId>,
    origin_rotation: Option<RotationEventId>,
    at: Timestamp,
) -> LedgerResult<PoolTxId> {
    sqlx::query("UPDATE pool SET balance = balance + ? WHERE id = 1")
        .bind(amount)
        .execute(&mut *conn)
        .await?;

    record_pool_transaction(conn, kind, Direction::In, amount, origin_tx, origin_rotation, at).await
}

/// Debit the pool by `amount`, recording a PoolTransaction
///
/// Fails with `InsufficientFunds` before touching the row if the debit would
/// drive the balance negative.
pub(crate) async fn debit_pool(
    conn: &mut SqliteConnection,
    amount: Amount,
    kind: PoolTxKind,
    origin_rotation: Option<RotationEventId>,
    at: Timestamp,
) -> LedgerResult<PoolTxId> {
    let balance = pool_balance_in_tx(conn).await?;
    if balance < amount {
        return Err(lib_rotation::RotationError::InsufficientFunds {
            have: balance,
            need: amount,
        }
        .into());
    }

    sqlx::query("UPDATE pool SET balance = balance - ? WHERE id = 1")
        .bind(amount)
        .execute(&mut *conn)
        .await?;

    record_pool_transaction(conn, kind, Direction::Out, amount, None, origin_rotation, at).await
}

async fn record_pool_transaction(
    conn: &mut SqliteConnection,
    kind: PoolTxKind,
    direction: Direction,
    amount: Amount,
    origin_tx: Option<TxId>,
    origin_rotation: Option<RotationEventId>,
    at: Timestamp,
) -> LedgerResult<PoolTxId> {
    let result = sqlx::query(
        r#"
        INSERT INTO pool_transactions
            (kind, direction, amount, transaction_id, rotation_event_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(kind.to_string())
    .bind(direction.to_string())
    .bind(amount)
    .bind(origin_tx.map(|id| id.raw()))
    .bind(origin_rotation.map(|id| id.raw()))
    .bind(at)
    .execute(&mut *conn)
    .await?;

    Ok(PoolTxId::new(result.last_insert_rowid()))
}

/// Link the wallet-side transaction back onto a pool movement
pub(crate) async fn link_pool_transaction(
    conn: &mut SqliteConnection,
    pool_tx: PoolTxId,
    tx: TxId,
) -> LedgerResult<()> {
    sqlx::query("UPDATE pool_transactions SET transaction_id = ? WHERE id = ?")
        .bind(tx.raw())
        .bind(pool_tx.raw())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Credit a member wallet by `amount`
pub(crate) async fn credit_wallet(
    conn: &mut SqliteConnection,
    member: MemberId,
    amount: Amount,
) -> LedgerResult<WalletRow> {
    let wallet = sqlx::query_as::<_, WalletRow>("SELECT * FROM wallets WHERE member_id = ?")
        .bind(member.raw())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(LedgerError::MemberNotFound(member))?;

    let new_balance = wallet
        .balance
        .checked_add(amount)
        .ok_or(lib_rotation::RotationError::Overflow)?;

    sqlx::query("UPDATE wallets SET balance = ? WHERE id = ?")
        .bind(new_balance)
        .bind(wallet.id)
        .execute(&mut *conn)
        .await?;

    Ok(WalletRow {
        balance: new_balance,
        ..wallet
    })
}

/// Record an immutable member transaction
#[allow(clippy::too_many_arguments)]
pub(crate) async fn record_transaction(
    conn: &mut SqliteConnection,
    member: MemberId,
    wallet_id: Option<i64>,
    kind: TxKind,
    amount: Amount,
    currency: &str,
    direction: Direction,
    status: TxStatus,
    external_reference: Option<&str>,
    at: Timestamp,
) -> LedgerResult<TxId> {
    let result = sqlx::query(
        r#"
        INSERT INTO transactions
            (member_id, wallet_id, kind, amount, currency, direction, status,
             external_reference, metadata, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, ?)
        "#,
    )
    .bind(member.raw())
    .bind(wallet_id)
    .bind(kind.to_string())
    .bind(amount)
    .bind(currency)
    .bind(direction.to_string())
    .bind(status.to_string())
    .bind(external_reference)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    Ok(TxId::new(result.last_insert_rowid()))
}

/// Reject a replayed upstream payment reference before any mutation
pub(crate) async fn ensure_reference_unused(
    conn: &mut SqliteConnection,
    external_reference: Option<&str>,
) -> LedgerResult<()> {
    let Some(reference) = external_reference else {
        return Ok(());
    };

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM transactions WHERE external_reference = ?")
            .bind(reference)
            .fetch_optional(&mut *conn)
            .await?;

    if existing.is_some() {
        return Err(LedgerError::DuplicateReference(reference.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open() -> LedgerStore {
        LedgerStore::open_in_memory(RotationConfig::for_testing())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn migrations_seed_the_singleton_pool() {
        let store = open().await;
        let pool = store.pool_row().await.unwrap();
        assert_eq!(pool.id, 1);
        assert_eq!(pool.balance, 0);
        assert_eq!(pool.currency, "XOF");

        // Re-running is a no-op, not a reset
        store.run_migrations().await.unwrap();
        assert_eq!(store.pool_row().await.unwrap().balance, 0);
    }

    #[tokio::test]
    async fn create_member_is_atomic_and_complete() {
        let store = open().await;
        let member = store.create_member().await.unwrap();

        assert_eq!(
            store.member_phase(member.member_id()).await.unwrap(),
            MemberPhase::None
        );
        let wallet = store.wallet(member.member_id()).await.unwrap();
        assert_eq!(wallet.balance, 0);
        assert_eq!(wallet.currency, "XOF");
    }

    #[tokio::test]
    async fn unknown_member_lookups_fail_typed() {
        let store = open().await;
        let missing = MemberId::new(99);

        assert!(matches!(
            store.member_phase(missing).await,
            Err(LedgerError::MemberNotFound(_))
        ));
        assert!(matches!(
            store.wallet(missing).await,
            Err(LedgerError::MemberNotFound(_))
        ));
    }

    #[tokio::test]
    async fn wallet_credit_uses_checked_arithmetic() {
        let store = open().await;
        let member = store.create_member().await.unwrap();

        sqlx::query("UPDATE wallets SET balance = ? WHERE member_id = ?")
            .bind(Amount::MAX)
            .bind(member.id)
            .execute(&store.pool)
            .await
            .unwrap();

        let mut tx = store.pool.begin().await.unwrap();
        let err = credit_wallet(&mut *tx, member.member_id(), 1)
            .await
            .unwrap_err();
        assert_eq!(
            err.as_core(),
            Some(&lib_rotation::RotationError::Overflow)
        );
    }

    #[tokio::test]
    async fn debit_refuses_to_overdraw_the_pool() {
        let store = open().await;
        let mut tx = store.pool.begin().await.unwrap();

        credit_pool(&mut *tx, 40_000, PoolTxKind::Contribution, None, None, 7).await.unwrap();
        let err = debit_pool(&mut *tx, 50_000, PoolTxKind::Payout, None, 7)
            .await
            .unwrap_err();
        assert_eq!(
            err.as_core(),
            Some(&lib_rotation::RotationError::InsufficientFunds {
                have: 40_000,
                need: 50_000
            })
        );
    }
}
