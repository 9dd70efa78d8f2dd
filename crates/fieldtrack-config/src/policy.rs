//! Validated configuration structures

use crate::schema::{RawClassifier, RawConfig, RawHome, RawTrackerSettings};
use fieldtrack_api::{Coordinate, Geofence};
use fieldtrack_util::default_data_dir;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STATIONARY_DISTANCE_METERS: f64 = 50.0;
pub const DEFAULT_DWELL_SECONDS: u64 = 300;
pub const DEFAULT_MOVING_SPEED_MPS: f64 = 2.0;
pub const DEFAULT_MOVING_DISTANCE_METERS: f64 = 100.0;
pub const DEFAULT_MOVING_WINDOW_SECONDS: u64 = 60;
pub const DEFAULT_SAMPLING_INTERVAL_SECONDS: u64 = 10;
pub const DEFAULT_STALE_FIX_SECONDS: u64 = 600;

/// Longest accepted classifier duration; history never spans more than a day
pub const MAX_CLASSIFIER_SECONDS: u64 = 86_400;

/// Never keep fewer fixes than the stationary check inspects
const MIN_HISTORY_LEN: usize = 5;

/// Thresholds and home geofence driving one classification run.
///
/// Immutable once handed to the classifier; a settings change replaces the
/// whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub stationary_distance_meters: f64,
    pub dwell_time: Duration,
    pub moving_speed_mps: f64,
    pub moving_distance_meters: f64,
    pub moving_window: Duration,
    pub sampling_interval: Duration,
    pub home: Geofence,
}

impl ClassifierConfig {
    /// Default thresholds around the given home geofence
    pub fn new(home: Geofence) -> Self {
        Self {
            stationary_distance_meters: DEFAULT_STATIONARY_DISTANCE_METERS,
            dwell_time: Duration::from_secs(DEFAULT_DWELL_SECONDS),
            moving_speed_mps: DEFAULT_MOVING_SPEED_MPS,
            moving_distance_meters: DEFAULT_MOVING_DISTANCE_METERS,
            moving_window: Duration::from_secs(DEFAULT_MOVING_WINDOW_SECONDS),
            sampling_interval: Duration::from_secs(DEFAULT_SAMPLING_INTERVAL_SECONDS),
            home,
        }
    }

    /// How far back the rolling history must reach
    pub fn retention_window(&self) -> Duration {
        self.dwell_time.max(self.moving_window) + self.sampling_interval
    }

    /// Upper bound on rolling history length at the expected sampling rate
    pub fn max_history_len(&self) -> usize {
        let sampling_ms = self.sampling_interval.as_millis().max(1);
        let slots = self.retention_window().as_millis().div_ceil(sampling_ms) as usize + 1;
        slots.max(MIN_HISTORY_LEN)
    }

    fn from_raw(home: RawHome, raw: RawClassifier) -> Self {
        let center = Coordinate::new(home.latitude, home.longitude);
        let name = home.label.unwrap_or_else(|| "Home".to_string());

        Self {
            stationary_distance_meters: raw
                .stationary_distance_meters
                .unwrap_or(DEFAULT_STATIONARY_DISTANCE_METERS),
            dwell_time: Duration::from_secs(raw.dwell_seconds.unwrap_or(DEFAULT_DWELL_SECONDS)),
            moving_speed_mps: raw.moving_speed_mps.unwrap_or(DEFAULT_MOVING_SPEED_MPS),
            moving_distance_meters: raw
                .moving_distance_meters
                .unwrap_or(DEFAULT_MOVING_DISTANCE_METERS),
            moving_window: Duration::from_secs(
                raw.moving_window_seconds
                    .unwrap_or(DEFAULT_MOVING_WINDOW_SECONDS),
            ),
            sampling_interval: Duration::from_secs(
                raw.sampling_interval_seconds
                    .unwrap_or(DEFAULT_SAMPLING_INTERVAL_SECONDS),
            ),
            home: Geofence::new(name, center, home.radius_meters),
        }
    }
}

/// Validated configuration ready for use by the tracker
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub classifier: ClassifierConfig,

    /// No fix for this long is reported as a liveness problem
    pub stale_fix_after: Duration,

    /// Where the event store lives
    pub data_dir: PathBuf,
}

impl TrackerConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let RawTrackerSettings {
            stale_fix_seconds,
            data_dir,
        } = raw.tracker;

        Self {
            classifier: ClassifierConfig::from_raw(raw.home, raw.classifier),
            stale_fix_after: Duration::from_secs(
                stale_fix_seconds.unwrap_or(DEFAULT_STALE_FIX_SECONDS),
            ),
            data_dir: data_dir.unwrap_or_else(default_data_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> Geofence {
        Geofence::new("Home", Coordinate::new(52.52, 13.405), 100.0)
    }

    #[test]
    fn test_retention_covers_dwell() {
        let config = ClassifierConfig::new(home());
        // max(300s, 60s) + 10s
        assert_eq!(config.retention_window(), Duration::from_secs(310));
        // ceil(310 / 10) + 1
        assert_eq!(config.max_history_len(), 32);
    }

    #[test]
    fn test_history_len_never_below_stationary_window() {
        let mut config = ClassifierConfig::new(home());
        config.dwell_time = Duration::from_secs(2);
        config.moving_window = Duration::from_secs(1);
        config.sampling_interval = Duration::from_secs(60);

        assert_eq!(config.max_history_len(), MIN_HISTORY_LEN);
    }

    #[test]
    fn test_from_raw_applies_defaults() {
        let raw = RawConfig {
            config_version: 1,
            home: RawHome {
                latitude: 52.52,
                longitude: 13.405,
                radius_meters: 75.0,
                label: None,
            },
            classifier: RawClassifier {
                dwell_seconds: Some(240),
                ..Default::default()
            },
            tracker: RawTrackerSettings {
                stale_fix_seconds: None,
                data_dir: Some(PathBuf::from("/tmp/ft")),
            },
        };

        let config = TrackerConfig::from_raw(raw);
        assert_eq!(config.classifier.home.name, "Home");
        assert_eq!(config.classifier.home.radius_meters, 75.0);
        assert_eq!(config.classifier.dwell_time, Duration::from_secs(240));
        assert_eq!(
            config.classifier.moving_speed_mps,
            DEFAULT_MOVING_SPEED_MPS
        );
        assert_eq!(
            config.stale_fix_after,
            Duration::from_secs(DEFAULT_STALE_FIX_SECONDS)
        );
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ft"));
    }
}
