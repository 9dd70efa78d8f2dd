//! Store trait definitions

use chrono::{DateTime, Local};
use fieldtrack_api::{DomainEvent, Fix, TravelState};
use fieldtrack_util::SessionId;
use serde::{Deserialize, Serialize};

use crate::StoreResult;

/// Main store trait
pub trait EventStore: Send + Sync {
    // Event log

    /// Append an event to a session's log. Events are never modified afterwards.
    fn append_event(&self, session_id: &SessionId, event: &DomainEvent) -> StoreResult<()>;

    /// Load a session's events in timestamp order (insertion order breaks ties)
    fn load_events(&self, session_id: &SessionId) -> StoreResult<Vec<DomainEvent>>;

    /// List sessions that have at least one event, oldest first
    fn list_sessions(&self) -> StoreResult<Vec<SessionSummary>>;

    // State snapshot

    /// Load the last saved snapshot for a session
    fn load_snapshot(&self, session_id: &SessionId) -> StoreResult<Option<SessionSnapshot>>;

    /// Save (replace) the snapshot for a session
    fn save_snapshot(&self, snapshot: &SessionSnapshot) -> StoreResult<()>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}

/// Snapshot of a tracking session for resumption.
///
/// Covers what the event log alone cannot express, e.g. `done`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub state: TravelState,
    pub last_fix: Option<Fix>,
    pub saved_at: DateTime<Local>,
}

/// One row of the session listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub first_event_at: DateTime<Local>,
    pub last_event_at: DateTime<Local>,
    pub event_count: usize,
}
