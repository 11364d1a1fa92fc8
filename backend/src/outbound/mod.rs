//! Outbound adapters implementing domain ports.
//!
//! - **memory**: a single-process store backing every repository port
//! - **persistence**: PostgreSQL repositories using Diesel
//! - **change_hub**: the in-process [`ChangeSource`](crate::domain::ports::ChangeSource)
//!   both stores publish to
//!
//! Adapters translate between domain types and storage representations and
//! hold no business rules.

pub mod change_hub;
pub mod change_records;
pub mod memory;
pub mod persistence;
