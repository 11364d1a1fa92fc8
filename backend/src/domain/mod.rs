//! Domain entities, services, and ports.
//!
//! Purpose: model blood-type compatibility, the per-hospital unit ledger,
//! the blood request lifecycle, donor matching, and change propagation
//! without reference to any transport or storage technology.
//!
//! Public surface:
//! - Entities: [`BloodType`], [`Donor`], [`Hospital`], [`InventoryRecord`],
//!   [`BloodRequest`], [`ChangeEvent`].
//! - Services: [`InventoryLedgerService`], [`RequestLifecycleService`],
//!   [`MatchService`], [`AvailabilityService`], [`ChangeFeed`].
//! - Ports: see [`ports`].

pub mod availability;
pub mod blood_request;
pub mod blood_type;
pub mod change_event;
pub mod change_feed;
pub mod compatibility;
pub mod donor;
pub mod error;
pub mod hospital;
pub mod ids;
pub mod inventory;
pub mod inventory_service;
pub mod location;
pub mod matching;
pub mod ports;
pub mod request_lifecycle;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::availability::{Availability, AvailabilityService};
pub use self::blood_request::{
    BloodRequest, BloodRequestSubmission, RequestDetails, RequestStatus, RequestTransition,
    Urgency,
};
pub use self::blood_type::{AboGroup, BloodType, ParseBloodTypeError};
pub use self::change_event::{ChangeEvent, ChangeOperation, ColumnFilter, Table, TableFilter};
pub use self::change_feed::{
    CallbackHandle, ChangeFeed, ChangeFeedConfig, FeedNotice, LiveQuery, LiveSnapshot,
    RefreshTrigger, Subscription,
};
pub use self::compatibility::CompatibilityMatrix;
pub use self::donor::Donor;
pub use self::error::{Error, ErrorCode, FieldViolation};
pub use self::hospital::{Hospital, HospitalStatus};
pub use self::ids::{DonorId, HospitalId, IdValidationError, InventoryRecordId, RequestId, UserId};
pub use self::inventory::{InventoryKey, InventoryRecord, InventoryTotal, UnitCount};
pub use self::inventory_service::InventoryLedgerService;
pub use self::location::Location;
pub use self::matching::MatchService;
pub use self::request_lifecycle::RequestLifecycleService;
pub use self::session::{Role, Session};
