//! Configuration validation

use crate::policy::{
    DEFAULT_DWELL_SECONDS, DEFAULT_SAMPLING_INTERVAL_SECONDS, MAX_CLASSIFIER_SECONDS,
};
use crate::schema::{RawClassifier, RawConfig, RawHome};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Home {field} {value} is outside [{min}, {max}]")]
    CoordinateOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Home radius must be positive, got {0}")]
    InvalidRadius(f64),

    #[error("Classifier '{field}' must be a finite non-negative number, got {value}")]
    InvalidThreshold { field: &'static str, value: f64 },

    #[error("Classifier '{field}' must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("Classifier '{field}' must be at most {max} seconds, got {value}")]
    DurationTooLong {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("dwell_seconds ({dwell}) must exceed sampling_interval_seconds ({sampling}) or dwelling can never be detected")]
    DwellNotAboveSampling { dwell: u64, sampling: u64 },

    #[error("Tracker 'stale_fix_seconds' must be greater than zero")]
    ZeroStaleFix,
}

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_home(&config.home));
    errors.extend(validate_classifier(&config.classifier));

    if config.tracker.stale_fix_seconds == Some(0) {
        errors.push(ValidationError::ZeroStaleFix);
    }

    errors
}

fn validate_home(home: &RawHome) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !(-90.0..=90.0).contains(&home.latitude) {
        errors.push(ValidationError::CoordinateOutOfRange {
            field: "latitude",
            value: home.latitude,
            min: -90.0,
            max: 90.0,
        });
    }

    if !(-180.0..=180.0).contains(&home.longitude) {
        errors.push(ValidationError::CoordinateOutOfRange {
            field: "longitude",
            value: home.longitude,
            min: -180.0,
            max: 180.0,
        });
    }

    if !(home.radius_meters.is_finite() && home.radius_meters > 0.0) {
        errors.push(ValidationError::InvalidRadius(home.radius_meters));
    }

    errors
}

fn validate_classifier(raw: &RawClassifier) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let thresholds = [
        ("stationary_distance_meters", raw.stationary_distance_meters),
        ("moving_speed_mps", raw.moving_speed_mps),
        ("moving_distance_meters", raw.moving_distance_meters),
    ];
    for (field, value) in thresholds {
        if let Some(value) = value
            && !is_non_negative(value)
        {
            errors.push(ValidationError::InvalidThreshold { field, value });
        }
    }

    if raw.moving_window_seconds == Some(0) {
        errors.push(ValidationError::ZeroDuration {
            field: "moving_window_seconds",
        });
    }

    let durations = [
        ("dwell_seconds", raw.dwell_seconds),
        ("moving_window_seconds", raw.moving_window_seconds),
        ("sampling_interval_seconds", raw.sampling_interval_seconds),
    ];
    for (field, value) in durations {
        if let Some(value) = value
            && value > MAX_CLASSIFIER_SECONDS
        {
            errors.push(ValidationError::DurationTooLong {
                field,
                value,
                max: MAX_CLASSIFIER_SECONDS,
            });
        }
    }

    let sampling = raw
        .sampling_interval_seconds
        .unwrap_or(DEFAULT_SAMPLING_INTERVAL_SECONDS);
    if sampling == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "sampling_interval_seconds",
        });
    }

    let dwell = raw.dwell_seconds.unwrap_or(DEFAULT_DWELL_SECONDS);
    if dwell <= sampling {
        errors.push(ValidationError::DwellNotAboveSampling { dwell, sampling });
    }

    errors
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
