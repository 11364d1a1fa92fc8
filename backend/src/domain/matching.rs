//! Donor-to-request matching.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{
    BloodRequestRepository, BloodRequestRepositoryError, DonorRepository, DonorRepositoryError,
    MatchQuery, MatchResult, RequestFilter,
};
use crate::domain::{
    BloodRequest, BloodType, CompatibilityMatrix, DonorId, Error, FieldViolation, Location,
    RequestStatus,
};

/// Most urgent first, then oldest first, then by id.
fn match_order(left: &BloodRequest, right: &BloodRequest) -> Ordering {
    right
        .urgency
        .cmp(&left.urgency)
        .then_with(|| left.created_at.cmp(&right.created_at))
        .then_with(|| left.id.cmp(&right.id))
}

/// Select the open requests a donor can serve and split them by locality.
///
/// Requests that are not `pending`, or whose blood group the donor cannot
/// give to, are dropped.
pub fn partition_matches(
    donor_type: BloodType,
    donor_location: &Location,
    requests: impl IntoIterator<Item = BloodRequest>,
) -> MatchResult {
    let compatible = CompatibilityMatrix::can_donate_to(donor_type);
    let (mut local, mut other): (Vec<_>, Vec<_>) = requests
        .into_iter()
        .filter(|request| request.is_open() && compatible.contains(&request.blood_group))
        .partition(|request| request.location.is_same_place(donor_location));
    local.sort_by(match_order);
    other.sort_by(match_order);
    MatchResult { local, other }
}

/// Donor-to-request matching over open requests.
#[derive(Clone)]
pub struct MatchService<R, D> {
    requests: Arc<R>,
    donors: Arc<D>,
}

impl<R, D> MatchService<R, D> {
    pub fn new(requests: Arc<R>, donors: Arc<D>) -> Self {
        Self { requests, donors }
    }
}

impl<R, D> MatchService<R, D>
where
    R: BloodRequestRepository,
    D: DonorRepository,
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

    fn map_donor_error(error: DonorRepositoryError) -> Error {
        match error {
            DonorRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("donor store unavailable: {message}"))
            }
            DonorRepositoryError::Query { message } => {
                Error::internal(format!("donor store error: {message}"))
            }
        }
    }
}

#[async_trait]
impl<R, D> MatchQuery for MatchService<R, D>
where
    R: BloodRequestRepository,
    D: DonorRepository,
{
    async fn find_matches(
        &self,
        donor_type: BloodType,
        donor_location: &Location,
    ) -> Result<MatchResult, Error> {
        let filter = RequestFilter::all()
            .with_status(RequestStatus::Pending)
            .with_blood_groups(CompatibilityMatrix::can_donate_to(donor_type));
        let open = self
            .requests
            .list(&filter)
            .await
            .map_err(Self::map_request_error)?;
        let result = partition_matches(donor_type, donor_location, open);
        debug!(
            donor_type = %donor_type,
            location = %donor_location,
            local = result.local.len(),
            other = result.other.len(),
            "matches computed"
        );
        Ok(result)
    }

    async fn matches_for_donor(&self, donor_id: &DonorId) -> Result<MatchResult, Error> {
        let donor = self
            .donors
            .find_by_id(donor_id)
            .await
            .map_err(Self::map_donor_error)?
            .ok_or_else(|| Error::not_found(format!("donor {donor_id} not found")))?;
        if !donor.active {
            return Err(Error::validation(vec![FieldViolation::new(
                "donorId",
                "donor_inactive",
                "donor is not active",
            )]));
        }
        self.find_matches(donor.blood_type, &donor.location).await
    }
}
