//! Core classification engine for fieldtrack
//!
//! This crate is the heart of fieldtrack, containing:
//! - Geospatial primitives (haversine distance, geofence containment)
//! - Motion classifier (moving / dwelling over a rolling fix history)
//! - Travel state machine
//!   (IdleAtHome -> Departing -> EnRouteToCustomer -> ... -> Done -> IdleAtHome)
//! - Session timer aggregation over the domain event log
//! - Tracking session wiring the machine to an event store

mod engine;
mod geo;
mod machine;
mod motion;
mod timers;

pub use engine::*;
pub use geo::*;
pub use machine::*;
pub use motion::*;
pub use timers::*;
