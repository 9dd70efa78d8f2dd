//! Domain events: the permanent record of a day's travel

use chrono::{DateTime, Local};
use fieldtrack_util::EventId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::Fix;

/// Kinds of domain events. The string forms are a storage contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    HomeLeave,
    WorkSelected,
    PrivateSelected,
    ArrivalCandidate,
    AtCustomerStart,
    AtCustomerEnd,
    WorkDone,
    HomeArrivalConfirmed,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::HomeLeave,
        EventKind::WorkSelected,
        EventKind::PrivateSelected,
        EventKind::ArrivalCandidate,
        EventKind::AtCustomerStart,
        EventKind::AtCustomerEnd,
        EventKind::WorkDone,
        EventKind::HomeArrivalConfirmed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::HomeLeave => "HOME_LEAVE",
            EventKind::WorkSelected => "WORK_SELECTED",
            EventKind::PrivateSelected => "PRIVATE_SELECTED",
            EventKind::ArrivalCandidate => "ARRIVAL_CANDIDATE",
            EventKind::AtCustomerStart => "AT_CUSTOMER_START",
            EventKind::AtCustomerEnd => "AT_CUSTOMER_END",
            EventKind::WorkDone => "WORK_DONE",
            EventKind::HomeArrivalConfirmed => "HOME_ARRIVAL_CONFIRMED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown event kind: {0}")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// Immutable record of one meaningful transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: EventId,
    pub timestamp: DateTime<Local>,
    pub kind: EventKind,
    /// Fix that triggered the transition, or the last known one for user decisions
    pub fix: Fix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DomainEvent {
    pub fn new(kind: EventKind, timestamp: DateTime<Local>, fix: Fix) -> Self {
        Self {
            id: EventId::new(),
            timestamp,
            kind,
            fix,
            note: None,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}
