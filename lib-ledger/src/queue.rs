//! FIFO Queue and Priority Eligibility List
//!
//! Both lists are append-only: consumption soft-deactivates (queue) or
//! soft-marks processed (eligibility), keeping full history. Idempotency
//! guards turn a second consumption into a typed error instead of a silent
//! double payout.
//!
//! Queue position is count-based — the number of active entries admitted no
//! later than the member's own — which stays correct under concurrent
//! insert/removal without renumbering on every mutation, at the cost of an
//! O(n) query.

use sqlx::sqlite::SqliteConnection;

use lib_rotation::{EligibleCandidate, FifoCandidate, RotationError};
use lib_types::{EligibilityEntryId, FifoEntryId, MemberId, Timestamp};

use crate::errors::LedgerResult;
use crate::store::LedgerStore;

// ============================================================================
// FIFO queue
// ============================================================================

/// Insert an active queue entry for `member`
///
/// Fails with `AlreadyQueued` if the member already has an active entry.
pub(crate) async fn enqueue(
    conn: &mut SqliteConnection,
    member: MemberId,
    entered_at: Timestamp,
) -> LedgerResult<FifoEntryId> {
    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM fifo_entries WHERE member_id = ? AND active = 1")
            .bind(member.raw())
            .fetch_optional(&mut *conn)
            .await?;
    if existing.is_some() {
        return Err(RotationError::AlreadyQueued.into());
    }

    let result = sqlx::query(
        "INSERT INTO fifo_entries (member_id, entered_at, active) VALUES (?, ?, 1)",
    )
    .bind(member.raw())
    .bind(entered_at)
    .execute(&mut *conn)
    .await?;

    Ok(FifoEntryId::new(result.last_insert_rowid()))
}

/// Oldest active entry (entered_at asc, id asc), or none
pub(crate) async fn peek_head(conn: &mut SqliteConnection) -> LedgerResult<Option<FifoCandidate>> {
    let row: Option<(i64, i64, Timestamp)> = sqlx::query_as(
        r#"
        SELECT id, member_id, entered_at FROM fifo_entries
        WHERE active = 1
        ORDER BY entered_at ASC, id ASC
        LIMIT 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|(id, member_id, entered_at)| FifoCandidate {
        entry_id: FifoEntryId::new(id),
        member_id: MemberId::new(member_id),
        entered_at,
    }))
}

/// Deactivate a queue entry
///
/// Idempotency guard: a second dequeue of the same entry fails `NotActive`.
pub(crate) async fn dequeue(
    conn: &mut SqliteConnection,
    entry: FifoEntryId,
) -> LedgerResult<()> {
    let result = sqlx::query("UPDATE fifo_entries SET active = 0 WHERE id = ? AND active = 1")
        .bind(entry.raw())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RotationError::NotActive.into());
    }
    Ok(())
}

/// 1-indexed position of the member's active entry, or none
pub(crate) async fn position(
    conn: &mut SqliteConnection,
    member: MemberId,
) -> LedgerResult<Option<i64>> {
    let entry: Option<(i64, Timestamp)> =
        sqlx::query_as("SELECT id, entered_at FROM fifo_entries WHERE member_id = ? AND active = 1")
            .bind(member.raw())
            .fetch_optional(&mut *conn)
            .await?;

    let Some((id, entered_at)) = entry else {
        return Ok(None);
    };

    // Count everyone admitted strictly earlier, plus earlier row ids within
    // the same second (the FIFO tie-break)
    let (ahead_or_self,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM fifo_entries
        WHERE active = 1
          AND (entered_at < ? OR (entered_at = ? AND id <= ?))
        "#,
    )
    .bind(entered_at)
    .bind(entered_at)
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Some(ahead_or_self))
}

// ============================================================================
// Priority eligibility list
// ============================================================================

/// Upsert the member's eligibility entry
///
/// One row per member, ever: a still-unprocessed row gets its timestamp
/// refreshed, a previously consumed row is re-armed. Never duplicates.
pub(crate) async fn mark_eligible(
    conn: &mut SqliteConnection,
    member: MemberId,
    at: Timestamp,
) -> LedgerResult<EligibilityEntryId> {
    sqlx::query(
        r#"
        INSERT INTO eligibility_entries (member_id, became_eligible_at, processed)
        VALUES (?, ?, 0)
        ON CONFLICT(member_id) DO UPDATE SET
            became_eligible_at = excluded.became_eligible_at,
            processed = 0
        "#,
    )
    .bind(member.raw())
    .bind(at)
    .execute(&mut *conn)
    .await?;

    let (id,): (i64,) = sqlx::query_as("SELECT id FROM eligibility_entries WHERE member_id = ?")
        .bind(member.raw())
        .fetch_one(&mut *conn)
        .await?;

    Ok(EligibilityEntryId::new(id))
}

/// Oldest unprocessed entry (became_eligible_at asc, id asc), or none
pub(crate) async fn peek_oldest_unprocessed(
    conn: &mut SqliteConnection,
) -> LedgerResult<Option<EligibleCandidate>> {
    let row: Option<(i64, i64, Timestamp)> = sqlx::query_as(
        r#"
        SELECT id, member_id, became_eligible_at FROM eligibility_entries
        WHERE processed = 0
        ORDER BY became_eligible_at ASC, id ASC
        LIMIT 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|(id, member_id, became_eligible_at)| EligibleCandidate {
        entry_id: EligibilityEntryId::new(id),
        member_id: MemberId::new(member_id),
        became_eligible_at,
    }))
}

/// Mark an eligibility entry processed
///
/// Idempotency guard: a second consume fails `AlreadyProcessed`.
pub(crate) async fn consume(
    conn: &mut SqliteConnection,
    entry: EligibilityEntryId,
) -> LedgerResult<()> {
    let result =
        sqlx::query("UPDATE eligibility_entries SET processed = 1 WHERE id = ? AND processed = 0")
            .bind(entry.raw())
            .execute(&mut *conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(RotationError::AlreadyProcessed.into());
    }
    Ok(())
}

// ============================================================================
// Store-level API
// ============================================================================

impl LedgerStore {
    /// Insert an active FIFO entry for `member` at `entered_at`
    ///
    /// Queue-level operation; the adhesion flow calls this as part of its
    /// larger transaction and additionally moves the membership phase.
    pub async fn enqueue(&self, member: MemberId, entered_at: Timestamp) -> LedgerResult<FifoEntryId> {
        let mut tx = self.db().begin().await?;
        let id = enqueue(&mut *tx, member, entered_at).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Head of the FIFO queue, or none
    pub async fn peek_head(&self) -> LedgerResult<Option<FifoCandidate>> {
        let mut conn = self.db().acquire().await?;
        peek_head(&mut *conn).await
    }

    /// Deactivate a FIFO entry; second call fails `NotActive`
    pub async fn dequeue(&self, entry: FifoEntryId) -> LedgerResult<()> {
        let mut tx = self.db().begin().await?;
        dequeue(&mut *tx, entry).await?;
        tx.commit().await?;
        Ok(())
    }

    /// 1-indexed queue position of the member's active entry
    pub async fn queue_position(&self, member: MemberId) -> LedgerResult<Option<i64>> {
        let mut conn = self.db().acquire().await?;
        position(&mut *conn, member).await
    }

    /// Upsert the member onto the priority eligibility list
    pub async fn mark_eligible(
        &self,
        member: MemberId,
        at: Timestamp,
    ) -> LedgerResult<EligibilityEntryId> {
        let mut tx = self.db().begin().await?;
        let id = mark_eligible(&mut *tx, member, at).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Oldest unprocessed eligibility entry, or none
    pub async fn peek_oldest_unprocessed(&self) -> LedgerResult<Option<EligibleCandidate>> {
        let mut conn = self.db().acquire().await?;
        peek_oldest_unprocessed(&mut *conn).await
    }

    /// Mark an eligibility entry processed; second call fails `AlreadyProcessed`
    pub async fn consume(&self, entry: EligibilityEntryId) -> LedgerResult<()> {
        let mut tx = self.db().begin().await?;
        consume(&mut *tx, entry).await?;
        tx.commit().await?;
        Ok(())
    }
}
