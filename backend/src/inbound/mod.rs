//! Inbound adapters that translate external requests into port calls.
//!
//! [`http`] serves the request, inventory, match and availability endpoints;
//! [`ws`] streams committed changes and live match lists.

pub mod http;
pub mod ws;
