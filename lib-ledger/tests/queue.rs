//! Queue and eligibility-list behavior against a real in-memory store.

mod common;

use common::{onboard, onboard_and_adhere, test_ledger};
use lib_ledger::LedgerError;
use lib_rotation::RotationError;
use lib_types::{MemberId, MemberPhase};

#[tokio::test]
async fn adhesion_assigns_back_of_queue_positions() {
    let (ledger, _sink) = test_ledger().await;

    let first = onboard(&ledger).await;
    let second = onboard(&ledger).await;
    let third = onboard(&ledger).await;

    let r1 = ledger.record_adhesion(first, None).await.unwrap();
    let r2 = ledger.record_adhesion(second, None).await.unwrap();
    let r3 = ledger.record_adhesion(third, None).await.unwrap();
    assert_eq!((r1.position, r2.position, r3.position), (1, 2, 3));

    assert_eq!(ledger.queue_position(first).await.unwrap(), Some(1));
    assert_eq!(ledger.queue_position(second).await.unwrap(), Some(2));
    assert_eq!(ledger.queue_position(third).await.unwrap(), Some(3));

    let head = ledger.peek_head().await.unwrap().unwrap();
    assert_eq!(head.member_id, first);
}

#[tokio::test]
async fn a_member_adheres_once() {
    let (ledger, _sink) = test_ledger().await;
    let member = onboard_and_adhere(&ledger).await;

    let err = ledger.record_adhesion(member, None).await.unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(&RotationError::InvalidStateTransition {
            phase: MemberPhase::Queued,
            ..
        })
    ));

    // Rejected atomically: no second charge, no second entry
    assert_eq!(ledger.pool_balance().await.unwrap(), 10_000);
    assert_eq!(ledger.queue_position(member).await.unwrap(), Some(1));
}

#[tokio::test]
async fn adhesion_for_an_unknown_member_is_rejected() {
    let (ledger, _sink) = test_ledger().await;

    let err = ledger
        .record_adhesion(MemberId::new(4242), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::MemberNotFound(_)));
    assert_eq!(ledger.pool_balance().await.unwrap(), 0);
}

#[tokio::test]
async fn one_active_queue_entry_per_member() {
    let (ledger, _sink) = test_ledger().await;
    let member = onboard(&ledger).await;

    ledger.enqueue(member, 100).await.unwrap();
    let err = ledger.enqueue(member, 200).await.unwrap_err();
    assert_eq!(err.as_core(), Some(&RotationError::AlreadyQueued));
}

#[tokio::test]
async fn dequeue_is_guarded_against_replays() {
    let (ledger, _sink) = test_ledger().await;
    let member = onboard(&ledger).await;

    let entry = ledger.enqueue(member, 100).await.unwrap();
    ledger.dequeue(entry).await.unwrap();

    let err = ledger.dequeue(entry).await.unwrap_err();
    assert_eq!(err.as_core(), Some(&RotationError::NotActive));
}

#[tokio::test]
async fn position_skips_deactivated_entries() {
    let (ledger, _sink) = test_ledger().await;

    let first = onboard(&ledger).await;
    let second = onboard(&ledger).await;
    let third = onboard(&ledger).await;
    let head_entry = ledger.enqueue(first, 100).await.unwrap();
    ledger.enqueue(second, 200).await.unwrap();
    ledger.enqueue(third, 300).await.unwrap();

    ledger.dequeue(head_entry).await.unwrap();

    // Everyone behind the consumed head moves up; history keeps the row
    assert_eq!(ledger.queue_position(first).await.unwrap(), None);
    assert_eq!(ledger.queue_position(second).await.unwrap(), Some(1));
    assert_eq!(ledger.queue_position(third).await.unwrap(), Some(2));

    let head = ledger.peek_head().await.unwrap().unwrap();
    assert_eq!(head.member_id, second);
}

#[tokio::test]
async fn eligibility_consume_is_guarded_against_replays() {
    let (ledger, _sink) = test_ledger().await;
    let member = onboard(&ledger).await;

    let entry = ledger.mark_eligible(member, 100).await.unwrap();
    ledger.consume(entry).await.unwrap();

    let err = ledger.consume(entry).await.unwrap_err();
    assert_eq!(err.as_core(), Some(&RotationError::AlreadyProcessed));
}

#[tokio::test]
async fn repeat_eligibility_rearms_the_same_row() {
    let (ledger, _sink) = test_ledger().await;
    let member = onboard(&ledger).await;

    let entry = ledger.mark_eligible(member, 100).await.unwrap();
    ledger.consume(entry).await.unwrap();
    assert!(ledger.peek_oldest_unprocessed().await.unwrap().is_none());

    // A later completed repayment re-arms the member's single row
    let rearmed = ledger.mark_eligible(member, 500).await.unwrap();
    assert_eq!(rearmed, entry);

    let candidate = ledger.peek_oldest_unprocessed().await.unwrap().unwrap();
    assert_eq!(candidate.member_id, member);
    assert_eq!(candidate.became_eligible_at, 500);
}

#[tokio::test]
async fn oldest_eligibility_entry_wins() {
    let (ledger, _sink) = test_ledger().await;

    let late = onboard(&ledger).await;
    let early = onboard(&ledger).await;
    ledger.mark_eligible(late, 900).await.unwrap();
    ledger.mark_eligible(early, 100).await.unwrap();

    let candidate = ledger.peek_oldest_unprocessed().await.unwrap().unwrap();
    assert_eq!(candidate.member_id, early);
}
