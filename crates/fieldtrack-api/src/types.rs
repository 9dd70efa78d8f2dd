//! Shared types for fieldtrack

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A single location reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// Ground speed in m/s, if the provider reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Horizontal accuracy in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Local>,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Local>) -> Self {
        Self {
            latitude,
            longitude,
            speed: None,
            accuracy: None,
            timestamp,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A named circular region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub name: String,
    pub center: Coordinate,
    pub radius_meters: f64,
}

impl Geofence {
    pub fn new(name: impl Into<String>, center: Coordinate, radius_meters: f64) -> Self {
        Self {
            name: name.into(),
            center,
            radius_meters,
        }
    }
}

/// Where the worker is in the day's cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelState {
    #[default]
    IdleAtHome,
    Departing,
    EnRouteToCustomer,
    StationaryCheck,
    AtCustomer,
    LeavingCustomer,
    EnRouteHome,
    StationaryHomeCheck,
    Done,
}

impl TravelState {
    pub const ALL: [TravelState; 9] = [
        TravelState::IdleAtHome,
        TravelState::Departing,
        TravelState::EnRouteToCustomer,
        TravelState::StationaryCheck,
        TravelState::AtCustomer,
        TravelState::LeavingCustomer,
        TravelState::EnRouteHome,
        TravelState::StationaryHomeCheck,
        TravelState::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelState::IdleAtHome => "idle_at_home",
            TravelState::Departing => "departing",
            TravelState::EnRouteToCustomer => "en_route_to_customer",
            TravelState::StationaryCheck => "stationary_check",
            TravelState::AtCustomer => "at_customer",
            TravelState::LeavingCustomer => "leaving_customer",
            TravelState::EnRouteHome => "en_route_home",
            TravelState::StationaryHomeCheck => "stationary_home_check",
            TravelState::Done => "done",
        }
    }

    /// The question the UI should put to the user in this state, if any
    pub fn pending_prompt(&self) -> Option<&'static [UserDecision]> {
        match self {
            TravelState::Departing => {
                Some(&[UserDecision::SelectWork, UserDecision::SelectPrivate])
            }
            TravelState::StationaryCheck => Some(&[
                UserDecision::ConfirmAtCustomer,
                UserDecision::DenyAtCustomer,
            ]),
            TravelState::LeavingCustomer => Some(&[
                UserDecision::ConfirmWorkDone,
                UserDecision::DenyWorkDone,
            ]),
            TravelState::StationaryHomeCheck => Some(&[UserDecision::ConfirmHomeArrival]),
            TravelState::IdleAtHome
            | TravelState::EnRouteToCustomer
            | TravelState::AtCustomer
            | TravelState::EnRouteHome
            | TravelState::Done => None,
        }
    }
}

impl fmt::Display for TravelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete decisions the user makes in response to prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserDecision {
    SelectWork,
    SelectPrivate,
    ConfirmAtCustomer,
    DenyAtCustomer,
    ConfirmWorkDone,
    DenyWorkDone,
    ConfirmHomeArrival,
}

impl UserDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserDecision::SelectWork => "SELECT_WORK",
            UserDecision::SelectPrivate => "SELECT_PRIVATE",
            UserDecision::ConfirmAtCustomer => "CONFIRM_AT_CUSTOMER",
            UserDecision::DenyAtCustomer => "DENY_AT_CUSTOMER",
            UserDecision::ConfirmWorkDone => "CONFIRM_WORK_DONE",
            UserDecision::DenyWorkDone => "DENY_WORK_DONE",
            UserDecision::ConfirmHomeArrival => "CONFIRM_HOME_ARRIVAL",
        }
    }
}

impl fmt::Display for UserDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input to the travel state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerInput {
    /// A new location reading
    LocationUpdate { fix: Fix },

    /// A user tap on a prompt
    Decision {
        decision: UserDecision,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        /// When the decision was made. Replays use this to drive the clock.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at: Option<DateTime<Local>>,
    },
}

impl TrackerInput {
    /// The time this input is associated with, if it carries one
    pub fn timestamp(&self) -> Option<DateTime<Local>> {
        match self {
            TrackerInput::LocationUpdate { fix } => Some(fix.timestamp),
            TrackerInput::Decision { at, .. } => *at,
        }
    }
}

/// Billable phase of a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Travel,
    Work,
    Return,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Travel => "travel",
            Phase::Work => "work",
            Phase::Return => "return",
        })
    }
}

/// The phase still open when totals were computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivePhase {
    pub phase: Phase,
    pub started_at: DateTime<Local>,
    pub elapsed_minutes: u64,
}

/// Whole-minute totals derived from an event log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    pub travel_minutes: u64,
    pub work_minutes: u64,
    pub return_minutes: u64,
    /// Open phase, never folded into the closed totals above
    pub live: Option<LivePhase>,
}

impl SessionTotals {
    /// Closed minutes for one phase
    pub fn closed_minutes(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Travel => self.travel_minutes,
            Phase::Work => self.work_minutes,
            Phase::Return => self.return_minutes,
        }
    }

    pub fn total_closed_minutes(&self) -> u64 {
        self.travel_minutes + self.work_minutes + self.return_minutes
    }

    /// Closed minutes plus the elapsed part of the live phase
    pub fn total_minutes_including_live(&self) -> u64 {
        self.total_closed_minutes() + self.live.as_ref().map_or(0, |l| l.elapsed_minutes)
    }

    /// Closed minutes for `phase` plus live elapsed if `phase` is the open one
    pub fn minutes_including_live(&self, phase: Phase) -> u64 {
        let live = self
            .live
            .as_ref()
            .filter(|l| l.phase == phase)
            .map_or(0, |l| l.elapsed_minutes);
        self.closed_minutes(phase) + live
    }
}
