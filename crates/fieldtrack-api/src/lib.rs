//! Shared vocabulary for fieldtrack
//!
//! This crate defines the types every other crate agrees on:
//! - Location input (fixes, geofences)
//! - Travel states and user decisions
//! - Domain events (the append-only wire/storage contract)
//! - Session totals derived from the event log

mod events;
mod types;

pub use events::*;
pub use types::*;
