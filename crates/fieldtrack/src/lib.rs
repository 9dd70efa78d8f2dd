//! fieldtrack - travel-day classification from GPS fixes
//!
//! Library half of the `fieldtrack` binary:
//! - NDJSON input parsing
//! - Deterministic replay of recorded input against a tracking session
//! - Event log lookups for the read-only commands

pub mod input;
pub mod query;
pub mod replay;

pub use input::*;
pub use query::*;
pub use replay::*;
