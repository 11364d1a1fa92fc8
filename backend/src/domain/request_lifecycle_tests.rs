//! Tests for the request lifecycle service.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockBloodRequestRepository, MockIdentityDirectory};
use crate::domain::test_support::{SteppingClock, fixture_timestamp, sample_request};
use crate::domain::{BloodType, ErrorCode, Role};

type Service = RequestLifecycleService<MockBloodRequestRepository, MockIdentityDirectory>;

fn make_service(repo: MockBloodRequestRepository, known: bool) -> Service {
    let mut identities = MockIdentityDirectory::new();
    identities.expect_is_known().returning(move |_| Ok(known));
    RequestLifecycleService::new(
        Arc::new(repo),
        Arc::new(identities),
        Arc::new(SteppingClock::default()),
    )
}

#[fixture]
fn submission() -> BloodRequestSubmission {
    BloodRequestSubmission {
        patient_name: "Marge".to_owned(),
        blood_group: "A-".to_owned(),
        units: 3,
        urgency: "high".to_owned(),
        hospital: "Springfield General".to_owned(),
        location: "Springfield".to_owned(),
        contact_name: "Dr. Hibbert".to_owned(),
        contact_phone: "555-0199".to_owned(),
        notes: Some("O.R. 2".to_owned()),
    }
}

fn admin() -> Session {
    Session::new(UserId::random(), Role::Admin)
}

#[rstest]
#[tokio::test]
async fn submit_stores_a_pending_request(submission: BloodRequestSubmission) {
    let mut repo = MockBloodRequestRepository::new();
    repo.expect_insert()
        .withf(|request| request.status == RequestStatus::Pending && request.units == 3)
        .times(1)
        .return_once(|_| Ok(()));
    let service = make_service(repo, true);
    let session = Session::new(UserId::random(), Role::Recipient);

    let request = service
        .submit(&session, submission)
        .await
        .expect("submission accepted");

    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.blood_group, BloodType::ANegative);
    assert_eq!(request.created_by, *session.user_id());
    assert_eq!(request.created_at, fixture_timestamp());
    assert_eq!(request.created_at, request.updated_at);
}

#[rstest]
#[tokio::test]
async fn submit_rejects_zero_units_without_storing(mut submission: BloodRequestSubmission) {
    submission.units = 0;
    let mut repo = MockBloodRequestRepository::new();
    repo.expect_insert().never();
    let service = make_service(repo, true);

    let err = service
        .submit(&admin(), submission)
        .await
        .expect_err("zero units rejected");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.violated_fields(), vec!["units".to_owned()]);
}

#[rstest]
#[tokio::test]
async fn unknown_creators_are_reported_with_other_fields(mut submission: BloodRequestSubmission) {
    submission.urgency = "whenever".to_owned();
    let mut repo = MockBloodRequestRepository::new();
    repo.expect_insert().never();
    let service = make_service(repo, false);

    let err = service
        .submit(&admin(), submission)
        .await
        .expect_err("unknown creator");

    assert_eq!(
        err.violated_fields(),
        vec!["urgency".to_owned(), "createdBy".to_owned()]
    );
}

#[rstest]
#[case(RequestTransition::Approve, RequestStatus::Approved)]
#[case(RequestTransition::Reject, RequestStatus::Rejected)]
#[case(RequestTransition::Fulfil, RequestStatus::Fulfilled)]
#[tokio::test]
async fn transitions_pass_source_and_target_to_the_store(
    #[case] transition: RequestTransition,
    #[case] target: RequestStatus,
) {
    let mut stored = sample_request(BloodType::OPositive);
    stored.status = target;
    let id = stored.id;
    let mut repo = MockBloodRequestRepository::new();
    repo.expect_transition()
        .withf(move |candidate, from, to, _| {
            *candidate == id && *from == transition.source() && *to == target
        })
        .times(1)
        .return_once(move |_, _, _, _| Ok(TransitionOutcome::Applied(stored)));
    let service = make_service(repo, true);

    let result = match transition {
        RequestTransition::Approve => service.approve(&admin(), &id).await,
        RequestTransition::Reject => service.reject(&admin(), &id).await,
        RequestTransition::Fulfil => service.fulfil(&admin(), &id).await,
    }
    .expect("transition applied");

    assert_eq!(result.status, target);
}

#[tokio::test]
async fn conflicts_report_the_current_status() {
    let mut repo = MockBloodRequestRepository::new();
    repo.expect_transition().times(1).return_once(|_, _, _, _| {
        Ok(TransitionOutcome::Conflict {
            current: RequestStatus::Approved,
        })
    });
    let service = make_service(repo, true);

    let err = service
        .reject(&admin(), &RequestId::random())
        .await
        .expect_err("already approved");

    assert_eq!(err.code(), ErrorCode::InvalidTransition);
    let details = err.details().expect("details present");
    assert_eq!(details["currentStatus"], "approved");
    assert_eq!(details["requiredStatus"], "pending");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let mut repo = MockBloodRequestRepository::new();
    repo.expect_transition()
        .return_once(|_, _, _, _| Ok(TransitionOutcome::NotFound));
    let service = make_service(repo, true);

    let err = service
        .approve(&admin(), &RequestId::random())
        .await
        .expect_err("missing request");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(Role::Donor)]
#[case(Role::Recipient)]
#[tokio::test]
async fn non_operators_cannot_transition(#[case] role: Role) {
    let mut repo = MockBloodRequestRepository::new();
    repo.expect_transition().never();
    let service = make_service(repo, true);

    let err = service
        .approve(&Session::new(UserId::random(), role), &RequestId::random())
        .await
        .expect_err("forbidden");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn list_passes_the_status_filter() {
    let mut repo = MockBloodRequestRepository::new();
    repo.expect_list()
        .withf(|filter| filter.status == Some(RequestStatus::Pending) && filter.created_by.is_none())
        .times(1)
        .return_once(|_| Ok(vec![sample_request(BloodType::BPositive)]));
    let service = make_service(repo, true);

    let listed = service
        .list(Some(RequestStatus::Pending))
        .await
        .expect("list succeeds");

    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn get_maps_missing_requests_to_not_found() {
    let mut repo = MockBloodRequestRepository::new();
    repo.expect_find_by_id().return_once(|_| Ok(None));
    let service = make_service(repo, true);

    let err = service
        .get(&RequestId::random())
        .await
        .expect_err("missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
}
