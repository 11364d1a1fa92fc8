//! Coarse availability signal per blood type.
//!
//! The signal is derived from request pressure, i.e. the share of requests
//! for a blood type that are still `pending`. It is a heuristic and not a
//! stock count: a type with plenty of units but a backlog of unapproved
//! requests still reads as `low`. Real units on hand are reported
//! separately by the inventory ledger.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ports::{
    AvailabilityQuery, BloodRequestRepository, BloodRequestRepositoryError, BloodTypeAvailability,
    RequestFilter,
};
use crate::domain::{BloodRequest, BloodType, Error, RequestStatus};

/// Coarse supply signal for one blood type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// At most 30% of requests are pending.
    High,
    /// Between 30% and 70% of requests are pending.
    Medium,
    /// More than 70% of requests are pending.
    Low,
}

impl Availability {
    /// Wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Classify a pending/total ratio.
    ///
    /// More than 70% pending reads `low`, more than 30% reads `medium`,
    /// anything else (including no requests at all) reads `high`. The
    /// comparison is done on integers so the thresholds are exact.
    ///
    /// # Examples
    /// ```
    /// use bloodlink::domain::Availability;
    ///
    /// assert_eq!(Availability::from_counts(0, 0), Availability::High);
    /// assert_eq!(Availability::from_counts(3, 10), Availability::High);
    /// assert_eq!(Availability::from_counts(4, 10), Availability::Medium);
    /// assert_eq!(Availability::from_counts(8, 10), Availability::Low);
    /// ```
    #[must_use]
    pub fn from_counts(pending: u64, total: u64) -> Self {
        if total == 0 {
            return Self::High;
        }
        let scaled_pending = u128::from(pending) * 10;
        let wide_total = u128::from(total);
        if scaled_pending > wide_total * 7 {
            Self::Low
        } else if scaled_pending > wide_total * 3 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the signal for `blood_type` from a set of requests.
///
/// Requests for other blood types are ignored.
#[must_use]
pub fn estimate(blood_type: BloodType, requests: &[BloodRequest]) -> BloodTypeAvailability {
    let (pending, total) = requests
        .iter()
        .filter(|request| request.blood_group == blood_type)
        .fold((0_u64, 0_u64), |(pending, total), request| {
            (
                pending + u64::from(request.status == RequestStatus::Pending),
                total + 1,
            )
        });
    BloodTypeAvailability {
        blood_type,
        availability: Availability::from_counts(pending, total),
        pending,
        total,
    }
}

/// Availability service implementing [`AvailabilityQuery`].
#[derive(Clone)]
pub struct AvailabilityService<R> {
    requests: Arc<R>,
}

impl<R> AvailabilityService<R> {
    pub fn new(requests: Arc<R>) -> Self {
        Self { requests }
    }
}

impl<R> AvailabilityService<R>
where
    R: BloodRequestRepository,
{
    fn map_request_error(error: BloodRequestRepositoryError) -> Error {
        match error {
            BloodRequestRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("request store unavailable: {message}"))
            }
            BloodRequestRepositoryError::Query { message }
            | BloodRequestRepositoryError::Duplicate { id: message } => {
                Error::internal(format!("request store error: {message}"))
            }
        }
    }
}

#[async_trait]
impl<R> AvailabilityQuery for AvailabilityService<R>
where
    R: BloodRequestRepository,
{
    async fn availability(&self, blood_type: BloodType) -> Result<BloodTypeAvailability, Error> {
        let requests = self
            .requests
            .list(&RequestFilter::all().with_blood_groups([blood_type]))
            .await
            .map_err(Self::map_request_error)?;
        let signal = estimate(blood_type, &requests);
        debug!(
            blood_type = %blood_type,
            pending = signal.pending,
            total = signal.total,
            availability = %signal.availability,
            "availability estimated"
        );
        Ok(signal)
    }

    async fn overview(&self) -> Result<Vec<BloodTypeAvailability>, Error> {
        let requests = self
            .requests
            .list(&RequestFilter::all())
            .await
            .map_err(Self::map_request_error)?;
        Ok(BloodType::ALL
            .into_iter()
            .map(|blood_type| estimate(blood_type, &requests))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockBloodRequestRepository;
    use crate::domain::test_support::sample_request;
    use rstest::rstest;

    fn requests(blood_type: BloodType, pending: usize, total: usize) -> Vec<BloodRequest> {
        (0..total)
            .map(|index| {
                let mut request = sample_request(blood_type);
                if index >= pending {
                    request.status = RequestStatus::Approved;
                }
                request
            })
            .collect()
    }

    #[rstest]
    #[case(0, 0, Availability::High)]
    #[case(8, 10, Availability::Low)]
    #[case(7, 10, Availability::Medium)]
    #[case(5, 10, Availability::Medium)]
    #[case(3, 10, Availability::High)]
    #[case(0, 4, Availability::High)]
    #[case(4, 4, Availability::Low)]
    #[case(u64::MAX, u64::MAX, Availability::Low)]
    #[case(u64::MAX >> 1, u64::MAX, Availability::Medium)]
    fn thresholds(#[case] pending: u64, #[case] total: u64, #[case] expected: Availability) {
        assert_eq!(Availability::from_counts(pending, total), expected);
    }

    #[rstest]
    fn estimate_ignores_other_blood_types() {
        let mut all = requests(BloodType::APositive, 5, 5);
        all.extend(requests(BloodType::ONegative, 0, 2));

        let signal = estimate(BloodType::ONegative, &all);

        assert_eq!(signal.pending, 0);
        assert_eq!(signal.total, 2);
        assert_eq!(signal.availability, Availability::High);
    }

    #[tokio::test]
    async fn overview_covers_every_blood_type() {
        let mut repo = MockBloodRequestRepository::new();
        repo.expect_list()
            .times(1)
            .return_once(|_| Ok(requests(BloodType::BNegative, 8, 10)));
        let service = AvailabilityService::new(Arc::new(repo));

        let overview = service.overview().await.expect("overview");

        assert_eq!(overview.len(), 8);
        let b_negative = overview
            .iter()
            .find(|entry| entry.blood_type == BloodType::BNegative)
            .expect("B- present");
        assert_eq!(b_negative.availability, Availability::Low);
        assert!(
            overview
                .iter()
                .filter(|entry| entry.blood_type != BloodType::BNegative)
                .all(|entry| entry.availability == Availability::High)
        );
    }

    #[tokio::test]
    async fn availability_filters_by_blood_type() {
        let mut repo = MockBloodRequestRepository::new();
        repo.expect_list()
            .withf(|filter| filter.blood_groups == Some(vec![BloodType::AbPositive]))
            .times(1)
            .return_once(|_| Ok(requests(BloodType::AbPositive, 1, 2)));
        let service = AvailabilityService::new(Arc::new(repo));

        let signal = service
            .availability(BloodType::AbPositive)
            .await
            .expect("signal");

        assert_eq!(signal.availability, Availability::Medium);
    }

    #[tokio::test]
    async fn connection_failures_surface_as_unavailable() {
        let mut repo = MockBloodRequestRepository::new();
        repo.expect_list()
            .return_once(|_| Err(BloodRequestRepositoryError::connection("refused")));
        let service = AvailabilityService::new(Arc::new(repo));

        let err = service.overview().await.expect_err("store down");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
