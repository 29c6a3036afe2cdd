//! History module for Pulseboard.
//!
//! Owns the durable, append-only ledger of probe runs.

mod models;
mod store;

pub use models::*;
pub use store::*;
