//! Travel state machine

use fieldtrack_api::{
    DomainEvent, EventKind, Fix, TrackerInput, TravelState, UserDecision,
};
use fieldtrack_config::ClassifierConfig;
use fieldtrack_util::Clock;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{is_within_geofence, MotionClassifier};

/// The one canonical travel-day state machine.
///
/// Consumes location updates and user decisions one at a time and emits a
/// [`DomainEvent`] for every meaningful transition. No input can fail: input
/// that does not apply to the current state is ignored.
pub struct TravelStateMachine {
    state: TravelState,
    classifier: MotionClassifier,
    clock: Arc<dyn Clock>,
    last_fix: Option<Fix>,
}

impl TravelStateMachine {
    pub fn new(config: ClassifierConfig, clock: Arc<dyn Clock>) -> Self {
        Self::resume(config, clock, TravelState::default(), None)
    }

    /// Start from a previously reached state, e.g. after a restart.
    /// Rolling history always starts empty.
    pub fn resume(
        config: ClassifierConfig,
        clock: Arc<dyn Clock>,
        state: TravelState,
        last_fix: Option<Fix>,
    ) -> Self {
        Self {
            state,
            classifier: MotionClassifier::new(config),
            clock,
            last_fix,
        }
    }

    pub fn state(&self) -> TravelState {
        self.state
    }

    pub fn last_fix(&self) -> Option<&Fix> {
        self.last_fix.as_ref()
    }

    pub fn config(&self) -> &ClassifierConfig {
        self.classifier.config()
    }

    pub fn classifier(&self) -> &MotionClassifier {
        &self.classifier
    }

    /// Apply new thresholds or a new home geofence. The current state is
    /// kept; only future classification changes.
    pub fn update_config(&mut self, config: ClassifierConfig) {
        info!(state = %self.state, "Classifier configuration updated");
        self.classifier.set_config(config);
    }

    pub fn handle(&mut self, input: TrackerInput) -> Option<DomainEvent> {
        match input {
            TrackerInput::LocationUpdate { fix } => self.on_location(fix),
            TrackerInput::Decision { decision, note, .. } => self.on_decision(decision, note),
        }
    }

    pub fn on_location(&mut self, fix: Fix) -> Option<DomainEvent> {
        // Transitions clear the classifier's history, so ordering is judged
        // against the last fix seen as well as the newest one held.
        if let Some(last) = &self.last_fix
            && fix.timestamp <= last.timestamp
        {
            debug!(
                fix_time = %fix.timestamp,
                last_time = %last.timestamp,
                "Ignoring out-of-order fix"
            );
            return None;
        }

        if !self.classifier.observe(fix.clone()) {
            return None;
        }
        self.last_fix = Some(fix.clone());

        let now = self.clock.now();
        let inside_home = is_within_geofence(fix.coordinate(), &self.config().home);

        match self.state {
            TravelState::IdleAtHome => {
                if !inside_home && self.classifier.is_moving(&fix) {
                    return self.transition(
                        TravelState::Departing,
                        Some(EventKind::HomeLeave),
                        fix,
                        None,
                    );
                }
            }
            TravelState::EnRouteToCustomer => {
                if !inside_home && self.classifier.is_stationary(now) {
                    return self.transition(
                        TravelState::StationaryCheck,
                        Some(EventKind::ArrivalCandidate),
                        fix,
                        None,
                    );
                }
            }
            TravelState::StationaryCheck => {
                if self.classifier.is_moving(&fix) {
                    return self.transition(TravelState::EnRouteToCustomer, None, fix, None);
                }
            }
            TravelState::AtCustomer => {
                if self.classifier.is_moving(&fix) {
                    return self.transition(
                        TravelState::LeavingCustomer,
                        Some(EventKind::AtCustomerEnd),
                        fix,
                        None,
                    );
                }
            }
            TravelState::EnRouteHome => {
                if inside_home && self.classifier.is_stationary(now) {
                    return self.transition(
                        TravelState::StationaryHomeCheck,
                        Some(EventKind::HomeArrivalConfirmed),
                        fix,
                        None,
                    );
                }
            }
            TravelState::StationaryHomeCheck => {
                if !inside_home || self.classifier.is_moving(&fix) {
                    return self.transition(TravelState::EnRouteHome, None, fix, None);
                }
            }
            TravelState::Done => {
                if inside_home {
                    return self.transition(TravelState::IdleAtHome, None, fix, None);
                }
            }
            // Waiting on the user
            TravelState::Departing | TravelState::LeavingCustomer => {}
        }

        None
    }

    pub fn on_decision(
        &mut self,
        decision: UserDecision,
        note: Option<String>,
    ) -> Option<DomainEvent> {
        let Some(fix) = self.last_fix.clone() else {
            debug!(%decision, "Ignoring decision before any fix");
            return None;
        };

        let (to, kind) = match (self.state, decision) {
            (TravelState::Departing, UserDecision::SelectWork) => {
                (TravelState::EnRouteToCustomer, Some(EventKind::WorkSelected))
            }
            (TravelState::Departing, UserDecision::SelectPrivate) => {
                (TravelState::IdleAtHome, Some(EventKind::PrivateSelected))
            }
            (TravelState::StationaryCheck, UserDecision::ConfirmAtCustomer) => {
                (TravelState::AtCustomer, Some(EventKind::AtCustomerStart))
            }
            (TravelState::StationaryCheck, UserDecision::DenyAtCustomer) => {
                (TravelState::EnRouteToCustomer, None)
            }
            (TravelState::LeavingCustomer, UserDecision::ConfirmWorkDone) => {
                (TravelState::EnRouteHome, Some(EventKind::WorkDone))
            }
            (TravelState::LeavingCustomer, UserDecision::DenyWorkDone) => {
                (TravelState::AtCustomer, None)
            }
            (TravelState::StationaryHomeCheck, UserDecision::ConfirmHomeArrival) => {
                (TravelState::Done, None)
            }
            (state, decision) => {
                debug!(%state, %decision, "Decision does not apply, ignoring");
                return None;
            }
        };

        self.transition(to, kind, fix, note)
    }

    fn transition(
        &mut self,
        to: TravelState,
        kind: Option<EventKind>,
        fix: Fix,
        note: Option<String>,
    ) -> Option<DomainEvent> {
        let from = self.state;
        self.state = to;

        self.classifier.reset_dwell();
        if matches!(to, TravelState::EnRouteToCustomer | TravelState::EnRouteHome) {
            self.classifier.clear();
        }

        let event = kind.map(|kind| DomainEvent::new(kind, self.clock.now(), fix).with_note(note));

        info!(
            from = %from,
            to = %to,
            event = ?event.as_ref().map(|e| e.kind),
            "Travel state changed"
        );

        event
    }
}
