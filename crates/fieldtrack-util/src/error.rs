//! Error types for fieldtrack

use thiserror::Error;

use crate::SessionId;

/// Umbrella error type for fieldtrack operations
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Input error: {0}")]
    InputError(String),

    #[error("Store error: {0}")]
    StoreError(String),
}

impl TrackError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::InputError(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, TrackError>;
