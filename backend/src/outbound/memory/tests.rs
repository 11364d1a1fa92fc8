//! Tests for the in-memory store.

use std::sync::Arc;

use chrono::Utc;
use futures_util::StreamExt;
use futures_util::future::join_all;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::ChangeSource;
use crate::domain::test_support::{sample_hospital, sample_request};
use crate::domain::{HospitalStatus, TableFilter};

#[fixture]
fn store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new(ChangeHub::default()))
}

fn units(count: u32) -> UnitCount {
    UnitCount::parse("units", i64::from(count)).expect("positive count")
}

fn o_negative_at(hospital_id: HospitalId) -> InventoryKey {
    InventoryKey::new(hospital_id, BloodType::ONegative)
}

#[rstest]
#[tokio::test]
async fn increment_upserts_one_record_per_key(store: Arc<InMemoryStore>) {
    let key = o_negative_at(HospitalId::random());

    let created = store.increment(&key, units(4), Utc::now()).await.expect("insert");
    let updated = store.increment(&key, units(6), Utc::now()).await.expect("update");

    assert_eq!(created.id, updated.id);
    assert_eq!(updated.units, 10);
    assert_eq!(
        store
            .list_for_hospital(&key.hospital_id)
            .await
            .expect("list")
            .len(),
        1
    );
}

#[rstest]
#[tokio::test]
async fn refused_withdrawals_leave_the_ledger_untouched(store: Arc<InMemoryStore>) {
    let key = o_negative_at(HospitalId::random());
    let before = store.increment(&key, units(3), Utc::now()).await.expect("seed");

    let outcome = store
        .decrement_if_available(&key, units(5), Utc::now())
        .await
        .expect("decrement");

    assert_eq!(outcome, DecrementOutcome::Insufficient { available: 3 });
    assert_eq!(store.find(&key).await.expect("find"), Some(before));
}

#[rstest]
#[tokio::test]
async fn withdrawing_from_a_missing_record_reports_zero(store: Arc<InMemoryStore>) {
    let outcome = store
        .decrement_if_available(&o_negative_at(HospitalId::random()), units(1), Utc::now())
        .await
        .expect("decrement");

    assert_eq!(outcome, DecrementOutcome::Insufficient { available: 0 });
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_overdraw(store: Arc<InMemoryStore>) {
    let key = o_negative_at(HospitalId::random());
    store.increment(&key, units(10), Utc::now()).await.expect("seed");

    let attempts = (0..25).map(|_| {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .decrement_if_available(&key, units(1), Utc::now())
                .await
                .expect("decrement")
        })
    });
    let outcomes = join_all(attempts).await;

    let applied = outcomes
        .into_iter()
        .map(|outcome| outcome.expect("task joins"))
        .filter(|outcome| matches!(outcome, DecrementOutcome::Applied(_)))
        .count();
    assert_eq!(applied, 10);
    assert_eq!(store.find(&key).await.expect("find").map(|r| r.units), Some(0));
}

#[rstest]
#[tokio::test]
async fn transitions_compare_and_set_on_status(store: Arc<InMemoryStore>) {
    let request = sample_request(BloodType::APositive);
    store.insert(&request).await.expect("insert");

    let first = store
        .transition(&request.id, RequestStatus::Pending, RequestStatus::Approved, Utc::now())
        .await
        .expect("first transition");
    let second = store
        .transition(&request.id, RequestStatus::Pending, RequestStatus::Rejected, Utc::now())
        .await
        .expect("second transition");

    assert!(matches!(first, TransitionOutcome::Applied(ref r) if r.status == RequestStatus::Approved));
    assert_eq!(
        second,
        TransitionOutcome::Conflict {
            current: RequestStatus::Approved
        }
    );
}

#[rstest]
#[tokio::test]
async fn transitions_on_unknown_ids_report_not_found(store: Arc<InMemoryStore>) {
    let outcome = store
        .transition(
            &RequestId::random(),
            RequestStatus::Pending,
            RequestStatus::Approved,
            Utc::now(),
        )
        .await
        .expect("transition");

    assert_eq!(outcome, TransitionOutcome::NotFound);
}

#[rstest]
#[tokio::test]
async fn duplicate_request_ids_are_refused(store: Arc<InMemoryStore>) {
    let request = sample_request(BloodType::BNegative);
    store.insert(&request).await.expect("first insert");

    let err = store.insert(&request).await.expect_err("duplicate");

    assert!(matches!(err, BloodRequestRepositoryError::Duplicate { .. }));
}

#[rstest]
#[tokio::test]
async fn mutations_publish_events_in_commit_order(store: Arc<InMemoryStore>) {
    let mut changes = store
        .hub()
        .connect(&TableFilter::table(Table::BloodRequests))
        .await
        .expect("connect");
    let request = sample_request(BloodType::ONegative);

    store.insert(&request).await.expect("insert");
    store
        .transition(&request.id, RequestStatus::Pending, RequestStatus::Approved, Utc::now())
        .await
        .expect("approve");

    let inserted = changes.next().await.expect("insert event").expect("ok");
    let updated = changes.next().await.expect("update event").expect("ok");
    assert_eq!(inserted.operation, ChangeOperation::Insert);
    assert_eq!(inserted.record["status"], "pending");
    assert_eq!(updated.operation, ChangeOperation::Update);
    assert_eq!(updated.record["status"], "approved");
}

#[rstest]
#[tokio::test]
async fn list_filters_and_orders_oldest_first(store: Arc<InMemoryStore>) {
    let mut older = sample_request(BloodType::ONegative);
    older.created_at -= chrono::TimeDelta::hours(1);
    let newer = sample_request(BloodType::ONegative);
    let mut approved = sample_request(BloodType::ONegative);
    approved.status = RequestStatus::Approved;
    for request in [&newer, &approved, &older] {
        store.insert(request).await.expect("insert");
    }

    let pending = store
        .list(&RequestFilter::all().with_status(RequestStatus::Pending))
        .await
        .expect("list");

    assert_eq!(
        pending.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![older.id, newer.id]
    );
}

#[rstest]
#[tokio::test]
async fn hospital_owners_become_known_identities(store: Arc<InMemoryStore>) {
    let hospital = sample_hospital(HospitalStatus::Active);
    let owner = hospital.user_id;

    assert!(!store.is_known(&owner).await.expect("lookup"));
    store.insert_hospital(hospital);

    assert!(store.is_known(&owner).await.expect("lookup"));
}

#[rstest]
#[tokio::test]
async fn totals_cover_every_blood_type(store: Arc<InMemoryStore>) {
    store
        .increment(&o_negative_at(HospitalId::random()), units(2), Utc::now())
        .await
        .expect("first hospital");
    store
        .increment(&o_negative_at(HospitalId::random()), units(5), Utc::now())
        .await
        .expect("second hospital");

    let totals = store.totals_by_blood_type().await.expect("totals");

    assert_eq!(totals.len(), 8);
    let o_negative = totals
        .iter()
        .find(|total| total.blood_type == BloodType::ONegative)
        .expect("O- total");
    assert_eq!(o_negative.units, 7);
}
