//! Tracking session: one user's day wired to the event store

use chrono::{DateTime, Local};
use fieldtrack_api::{
    DomainEvent, EventKind, Fix, SessionTotals, TrackerInput, TravelState, UserDecision,
};
use fieldtrack_config::{ClassifierConfig, TrackerConfig};
use fieldtrack_store::{EventStore, SessionSnapshot, StoreResult};
use fieldtrack_util::{signed_duration, Clock, SessionId};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{compute_timers, TravelStateMachine};

/// Owns the state machine for one session and persists what it emits.
///
/// Store failures are logged and never interrupt classification. Events the
/// store rejected are retried, in order, on every later input. No snapshot is
/// written while any are outstanding, so a restart never resumes into a
/// state the persisted log cannot account for.
pub struct TrackingSession {
    session_id: SessionId,
    machine: TravelStateMachine,
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    events: Vec<DomainEvent>,
    unpersisted: VecDeque<DomainEvent>,
    stale_fix_after: Duration,
}

impl TrackingSession {
    /// Start a fresh session at `idle_at_home`
    pub fn new(
        session_id: SessionId,
        config: &TrackerConfig,
        store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            session_id = %session_id,
            home = %config.classifier.home.name,
            "Tracking session started"
        );

        Self {
            session_id,
            machine: TravelStateMachine::new(config.classifier.clone(), clock.clone()),
            store,
            clock,
            events: Vec::new(),
            unpersisted: VecDeque::new(),
            stale_fix_after: config.stale_fix_after,
        }
    }

    /// Reload a session from the store.
    ///
    /// State comes from the saved snapshot when it is at least as new as the
    /// last event, otherwise it is implied by the last event. A session with
    /// no history starts fresh.
    pub fn resume(
        session_id: SessionId,
        config: &TrackerConfig,
        store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
    ) -> StoreResult<Self> {
        let events = store.load_events(&session_id)?;
        let snapshot = store.load_snapshot(&session_id)?;
        let last_event = events.last();

        let snapshot = snapshot.filter(|s| last_event.is_none_or(|e| s.saved_at >= e.timestamp));

        let (state, last_fix) = match (snapshot, last_event) {
            (Some(snapshot), _) => (snapshot.state, snapshot.last_fix),
            (None, Some(event)) => (state_after(event.kind), Some(event.fix.clone())),
            (None, None) => (TravelState::default(), None),
        };

        info!(
            session_id = %session_id,
            state = %state,
            event_count = events.len(),
            "Tracking session resumed"
        );

        Ok(Self {
            session_id,
            machine: TravelStateMachine::resume(
                config.classifier.clone(),
                clock.clone(),
                state,
                last_fix,
            ),
            store,
            clock,
            events,
            unpersisted: VecDeque::new(),
            stale_fix_after: config.stale_fix_after,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn state(&self) -> TravelState {
        self.machine.state()
    }

    /// Decisions the user should currently be offered
    pub fn pending_prompt(&self) -> Option<&'static [UserDecision]> {
        self.machine.state().pending_prompt()
    }

    pub fn last_fix(&self) -> Option<&Fix> {
        self.machine.last_fix()
    }

    /// Every event of this session so far, oldest first
    pub fn events(&self) -> &[DomainEvent] {
        &self.events
    }

    /// Events emitted but not yet accepted by the store
    pub fn unpersisted_count(&self) -> usize {
        self.unpersisted.len()
    }

    /// Feed one input through the machine, persisting any emitted event
    pub fn handle(&mut self, input: TrackerInput) -> Option<DomainEvent> {
        let flushed = self.flush_unpersisted();

        let before = self.machine.state();
        let event = self.machine.handle(input);

        if let Some(event) = &event {
            self.events.push(event.clone());
            self.unpersisted.push_back(event.clone());
            self.flush_unpersisted();
        }

        if (flushed || self.machine.state() != before) && self.unpersisted.is_empty() {
            self.save_snapshot();
        }

        event
    }

    /// Append queued events oldest first, stopping at the first failure.
    /// Returns true when at least one was written.
    fn flush_unpersisted(&mut self) -> bool {
        let mut written = false;

        while let Some(event) = self.unpersisted.front() {
            if let Err(e) = self.store.append_event(&self.session_id, event) {
                warn!(
                    error = %e,
                    session_id = %self.session_id,
                    kind = %event.kind,
                    pending = self.unpersisted.len(),
                    "Failed to persist event, will retry"
                );
                return written;
            }
            self.unpersisted.pop_front();
            written = true;
        }

        written
    }

    fn save_snapshot(&self) {
        let snapshot = SessionSnapshot {
            session_id: self.session_id.clone(),
            state: self.machine.state(),
            last_fix: self.machine.last_fix().cloned(),
            saved_at: self.clock.now(),
        };

        if let Err(e) = self.store.save_snapshot(&snapshot) {
            warn!(error = %e, session_id = %self.session_id, "Failed to save snapshot");
        }
    }

    /// Replay this session's events into totals as of `now`
    pub fn totals(&self, now: DateTime<Local>) -> SessionTotals {
        compute_timers(&self.events, now)
    }

    /// Totals as of the session clock
    pub fn current_totals(&self) -> SessionTotals {
        self.totals(self.clock.now())
    }

    /// Apply a settings change without touching the current state
    pub fn update_config(&mut self, config: ClassifierConfig) {
        self.machine.update_config(config);
    }

    /// True when no fix has arrived for longer than the configured limit,
    /// or none has arrived at all
    pub fn is_fix_stale(&self, now: DateTime<Local>) -> bool {
        match self.machine.last_fix() {
            Some(fix) => {
                let silent = now.signed_duration_since(fix.timestamp);
                let stale = silent > signed_duration(self.stale_fix_after);
                if stale {
                    debug!(silent_secs = silent.num_seconds(), "Fix is stale");
                }
                stale
            }
            None => true,
        }
    }
}

/// The state a session must be in right after emitting `kind`
pub fn state_after(kind: EventKind) -> TravelState {
    match kind {
        EventKind::HomeLeave => TravelState::Departing,
        EventKind::WorkSelected => TravelState::EnRouteToCustomer,
        EventKind::PrivateSelected => TravelState::IdleAtHome,
        EventKind::ArrivalCandidate => TravelState::StationaryCheck,
        EventKind::AtCustomerStart => TravelState::AtCustomer,
        EventKind::AtCustomerEnd => TravelState::LeavingCustomer,
        EventKind::WorkDone => TravelState::EnRouteHome,
        EventKind::HomeArrivalConfirmed => TravelState::StationaryHomeCheck,
    }
}
