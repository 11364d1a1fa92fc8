//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories translate between Diesel rows and domain entities and hold
//! no business rules. Row structs (`models`) and table definitions
//! (`schema`) stay private to this module. Ledger and request writes are
//! published to the [`ChangeHub`](crate::outbound::change_hub::ChangeHub)
//! they were built with.
//!
//! ```ignore
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/bloodlink")).await?;
//! let inventory = DieselInventoryRepository::new(pool.clone(), hub.clone());
//! ```

mod diesel_blood_request_repository;
mod diesel_donor_repository;
mod diesel_hospital_repository;
mod diesel_inventory_repository;
mod error_mapping;
mod models;
mod pool;
mod schema;

pub use diesel_blood_request_repository::DieselBloodRequestRepository;
pub use diesel_donor_repository::DieselDonorRepository;
pub use diesel_hospital_repository::DieselHospitalRepository;
pub use diesel_inventory_repository::DieselInventoryRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
