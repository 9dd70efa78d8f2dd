//! Read-only lookups against the event store

use fieldtrack_api::DomainEvent;
use fieldtrack_store::EventStore;
use fieldtrack_util::{Result, SessionId, TrackError};

/// Load a session's event log. A session with no events does not exist.
pub fn load_session_events(
    store: &dyn EventStore,
    session_id: &SessionId,
) -> Result<Vec<DomainEvent>> {
    let events = store
        .load_events(session_id)
        .map_err(|e| TrackError::store(e.to_string()))?;

    if events.is_empty() {
        return Err(TrackError::SessionNotFound(session_id.clone()));
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use fieldtrack_api::{EventKind, Fix};
    use fieldtrack_store::SqliteStore;

    #[test]
    fn unknown_session_is_not_found() {
        let store = SqliteStore::in_memory().unwrap();
        let err = load_session_events(&store, &SessionId::new("nobody")).unwrap_err();
        assert!(matches!(err, TrackError::SessionNotFound(ref id) if id.as_str() == "nobody"));
    }

    #[test]
    fn known_session_returns_its_log() {
        let store = SqliteStore::in_memory().unwrap();
        let id = SessionId::new("day");
        let ts = Local.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let event = DomainEvent::new(EventKind::HomeLeave, ts, Fix::new(52.53, 13.405, ts));
        store.append_event(&id, &event).unwrap();

        assert_eq!(load_session_events(&store, &id).unwrap(), vec![event]);
    }
}
