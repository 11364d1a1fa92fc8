//! Bloodlink coordination backend.
//!
//! The crate is a hexagonal modular monolith:
//! - `domain`: blood-type compatibility, the inventory ledger, the request
//!   lifecycle, donor matching, and the change feed, plus the ports they
//!   depend on.
//! - `inbound`: HTTP and WebSocket adapters that invoke the domain.
//! - `outbound`: storage adapters (in-memory and PostgreSQL) and the change
//!   hub that announces committed mutations.
//! - `middleware`: request ids and request completion logging.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

pub use settings::AppSettings;
