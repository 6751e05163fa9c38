//! Shared harness for ledger integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use lib_ledger::{LedgerStore, RecordingSink};
use lib_rotation::RotationConfig;
use lib_types::{Amount, MemberId};
use tracing_subscriber::EnvFilter;

/// Route operation logs to the test output, once per binary
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory ledger with the production amounts and a capturing sink
pub async fn test_ledger() -> (LedgerStore, Arc<RecordingSink>) {
    init_tracing();
    let sink = Arc::new(RecordingSink::new());
    let ledger = LedgerStore::open_in_memory(RotationConfig::for_testing())
        .await
        .unwrap()
        .with_sink(sink.clone());
    (ledger, sink)
}

/// Onboard a member and return their id
pub async fn onboard(ledger: &LedgerStore) -> MemberId {
    ledger.create_member().await.unwrap().member_id()
}

/// Onboard a member and run their adhesion, returning their id
pub async fn onboard_and_adhere(ledger: &LedgerStore) -> MemberId {
    let member = onboard(ledger).await;
    ledger.record_adhesion(member, None).await.unwrap();
    member
}

/// Force the pool balance to an exact value, bypassing the operations.
/// Fixture setup only; accounting tests build balances through real
/// operations instead.
pub async fn set_pool_balance(ledger: &LedgerStore, balance: Amount) {
    sqlx::query("UPDATE pool SET balance = ? WHERE id = 1")
        .bind(balance)
        .execute(ledger.db())
        .await
        .unwrap();
}
