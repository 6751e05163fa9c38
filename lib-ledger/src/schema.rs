//! Embedded Ledger Schema
//!
//! Relational layout mirroring the core entities. History is append-only:
//! queue and eligibility entries are soft-deactivated, never deleted, so the
//! full allocation history stays auditable.
//!
//! Table creation order matters because foreign keys are enforced.

/// Migration V1: full ledger schema
pub const LEDGER_SCHEMA: &str = r#"
-- Member identity references (opaque; real identity lives upstream)
CREATE TABLE IF NOT EXISTS members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at INTEGER NOT NULL
);

-- One membership state per member, advanced only via the transition table
CREATE TABLE IF NOT EXISTS membership_states (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id INTEGER NOT NULL UNIQUE REFERENCES members(id),
    phase TEXT NOT NULL,
    last_changed_at INTEGER NOT NULL
);

-- One wallet per member; balance never negative
CREATE TABLE IF NOT EXISTS wallets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id INTEGER NOT NULL UNIQUE REFERENCES members(id),
    balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
    currency TEXT NOT NULL
);

-- Singleton shared pool
CREATE TABLE IF NOT EXISTS pool (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
    currency TEXT NOT NULL
);

-- Immutable money-movement records on behalf of a member
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id INTEGER NOT NULL REFERENCES members(id),
    wallet_id INTEGER REFERENCES wallets(id),
    kind TEXT NOT NULL,
    amount INTEGER NOT NULL,
    currency TEXT NOT NULL,
    direction TEXT NOT NULL,
    status TEXT NOT NULL,
    external_reference TEXT,
    metadata TEXT,
    created_at INTEGER NOT NULL
);

-- Idempotent dedup against the upstream payment notifier
CREATE UNIQUE INDEX IF NOT EXISTS idx_transactions_external_reference
    ON transactions(external_reference)
    WHERE external_reference IS NOT NULL;

CREATE INDEX IF NOT EXISTS idx_transactions_member
    ON transactions(member_id, created_at);

-- FIFO admission queue; order is (entered_at, id) over active rows
CREATE TABLE IF NOT EXISTS fifo_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id INTEGER NOT NULL REFERENCES members(id),
    entered_at INTEGER NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_fifo_active_order
    ON fifo_entries(active, entered_at, id);

-- Priority eligibility list; one row per member, refreshed on re-eligibility
CREATE TABLE IF NOT EXISTS eligibility_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id INTEGER NOT NULL UNIQUE REFERENCES members(id),
    became_eligible_at INTEGER NOT NULL,
    processed INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_eligibility_unprocessed
    ON eligibility_entries(processed, became_eligible_at, id);

-- Repayment debt opened by each payout
CREATE TABLE IF NOT EXISTS repayment_obligations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id INTEGER NOT NULL REFERENCES members(id),
    target_amount INTEGER NOT NULL,
    amount_paid INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL,
    started_at INTEGER NOT NULL,
    completed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_obligations_member_status
    ON repayment_obligations(member_id, status);

-- Immutable link between an obligation and the transaction funding it
CREATE TABLE IF NOT EXISTS repayment_installments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    obligation_id INTEGER NOT NULL REFERENCES repayment_obligations(id),
    transaction_id INTEGER NOT NULL REFERENCES transactions(id),
    amount INTEGER NOT NULL,
    paid_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_installments_obligation
    ON repayment_installments(obligation_id);

-- One payout decision; exactly one source entry reference is set
CREATE TABLE IF NOT EXISTS rotation_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id INTEGER NOT NULL REFERENCES members(id),
    amount INTEGER NOT NULL,
    source TEXT NOT NULL,
    eligibility_entry_id INTEGER REFERENCES eligibility_entries(id),
    fifo_entry_id INTEGER REFERENCES fifo_entries(id),
    triggered_at INTEGER NOT NULL,
    CHECK (
        (source = 'priority'
            AND eligibility_entry_id IS NOT NULL
            AND fifo_entry_id IS NULL)
        OR
        (source = 'fifo'
            AND fifo_entry_id IS NOT NULL
            AND eligibility_entry_id IS NULL)
    )
);

-- Immutable pool balance-change records; at most one origin link set
CREATE TABLE IF NOT EXISTS pool_transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    direction TEXT NOT NULL,
    amount INTEGER NOT NULL,
    transaction_id INTEGER REFERENCES transactions(id),
    rotation_event_id INTEGER REFERENCES rotation_events(id),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pool_transactions_created
    ON pool_transactions(created_at);
"#;
