//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Home geofence
    pub home: RawHome,

    /// Classifier thresholds
    #[serde(default)]
    pub classifier: RawClassifier,

    /// Runtime settings
    #[serde(default)]
    pub tracker: RawTrackerSettings,
}

/// Home geofence definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawHome {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,

    /// Display label (default: "Home")
    pub label: Option<String>,
}

/// Classifier thresholds. Every field falls back to a default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawClassifier {
    /// Maximum spread of recent fixes still counted as "not moving"
    pub stationary_distance_meters: Option<f64>,

    /// How long the spread must stay tight before dwelling counts
    pub dwell_seconds: Option<u64>,

    /// Reported speed at or above which a fix counts as moving
    pub moving_speed_mps: Option<f64>,

    /// Displacement within the moving window that counts as moving
    pub moving_distance_meters: Option<f64>,

    pub moving_window_seconds: Option<u64>,

    /// Expected interval between fixes from the location provider
    pub sampling_interval_seconds: Option<u64>,
}

/// Runtime settings for the tracker binary
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTrackerSettings {
    /// Warn when no fix has arrived for this long
    pub stale_fix_seconds: Option<u64>,

    /// Data directory for the event store
    pub data_dir: Option<PathBuf>,
}
