//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod availability_query;
mod blood_request_command;
mod blood_request_query;
mod blood_request_repository;
mod change_source;
mod donor_repository;
mod hospital_repository;
mod identity_directory;
mod inventory_command;
mod inventory_query;
mod inventory_repository;
mod match_query;

#[cfg(test)]
pub use availability_query::MockAvailabilityQuery;
pub use availability_query::{AvailabilityQuery, BloodTypeAvailability};
#[cfg(test)]
pub use blood_request_command::MockBloodRequestCommand;
pub use blood_request_command::BloodRequestCommand;
#[cfg(test)]
pub use blood_request_query::MockBloodRequestQuery;
pub use blood_request_query::BloodRequestQuery;
#[cfg(test)]
pub use blood_request_repository::MockBloodRequestRepository;
pub use blood_request_repository::{
    BloodRequestRepository, BloodRequestRepositoryError, RequestFilter, TransitionOutcome,
};
pub use change_source::{ChangeSource, ChangeSourceError, ChangeStream};
#[cfg(test)]
pub use donor_repository::MockDonorRepository;
pub use donor_repository::{DonorRepository, DonorRepositoryError};
#[cfg(test)]
pub use hospital_repository::MockHospitalRepository;
pub use hospital_repository::{HospitalRepository, HospitalRepositoryError};
#[cfg(test)]
pub use identity_directory::MockIdentityDirectory;
pub use identity_directory::{
    AuthenticatedIdentityDirectory, IdentityDirectory, IdentityDirectoryError,
};
#[cfg(test)]
pub use inventory_command::MockInventoryCommand;
pub use inventory_command::{InventoryAdjustment, InventoryCommand};
#[cfg(test)]
pub use inventory_query::MockInventoryQuery;
pub use inventory_query::InventoryQuery;
#[cfg(test)]
pub use inventory_repository::MockInventoryRepository;
pub use inventory_repository::{DecrementOutcome, InventoryRepository, InventoryRepositoryError};
#[cfg(test)]
pub use match_query::MockMatchQuery;
pub use match_query::{MatchQuery, MatchResult};
