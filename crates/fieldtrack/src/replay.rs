//! Deterministic replay of recorded input
//!
//! The session clock follows the input: every record that carries a
//! timestamp moves the [`ManualClock`] forward to it before being handled.
//! Decisions without an `at` are handled at the time of the preceding record.

use chrono::{DateTime, Local};
use fieldtrack_api::{DomainEvent, SessionTotals, TrackerInput, TravelState};
use fieldtrack_core::TrackingSession;
use fieldtrack_util::{Clock, ManualClock, SessionId};
use serde::Serialize;
use tracing::debug;

/// Outcome of one replay run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub session_id: SessionId,
    /// Events emitted during this run, in order
    pub events: Vec<DomainEvent>,
    pub final_state: TravelState,
    pub totals: SessionTotals,
    pub inputs_handled: usize,
}

/// Feed `inputs` through `session`, driving `clock` from their timestamps.
///
/// Totals cover the whole session log (including events from before the
/// run when the session was resumed) and are measured at `now`, or at the
/// last input time when `now` is not given.
pub fn replay(
    session: &mut TrackingSession,
    clock: &ManualClock,
    inputs: impl IntoIterator<Item = TrackerInput>,
    now: Option<DateTime<Local>>,
) -> ReplayReport {
    let mut events = Vec::new();
    let mut inputs_handled = 0;

    for input in inputs {
        // Never run the clock backwards; late fixes are dropped by the machine
        if let Some(ts) = input.timestamp()
            && ts > clock.now()
        {
            clock.set(ts);
        }

        if let Some(event) = session.handle(input) {
            debug!(kind = %event.kind, at = %event.timestamp, "Replay emitted event");
            events.push(event);
        }
        inputs_handled += 1;
    }

    let now = now.unwrap_or_else(|| clock.now());

    ReplayReport {
        session_id: session.session_id().clone(),
        events,
        final_state: session.state(),
        totals: session.totals(now),
        inputs_handled,
    }
}
