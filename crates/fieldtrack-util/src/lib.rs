//! Shared utilities for fieldtrack
//!
//! This crate provides:
//! - ID types (EventId, SessionId)
//! - Time utilities (injectable clocks, mock time, duration helpers)
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
