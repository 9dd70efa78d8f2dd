//! Motion classification over a rolling window of fixes

use chrono::{DateTime, Local};
use fieldtrack_api::Fix;
use fieldtrack_config::ClassifierConfig;
use fieldtrack_util::signed_duration;
use std::collections::VecDeque;
use tracing::debug;

use crate::distance_meters;

/// Minimum history before dwelling can be judged at all
const MIN_STATIONARY_FIXES: usize = 3;

/// How many of the newest fixes the stationary check inspects
const STATIONARY_SAMPLE: usize = 5;

/// Answers "is moving?" and "is dwelling?" from recent fixes.
///
/// Owns its history exclusively. Insufficient data always yields `false`
/// for both predicates.
#[derive(Debug, Clone)]
pub struct MotionClassifier {
    config: ClassifierConfig,
    history: VecDeque<Fix>,
    dwell_start: Option<DateTime<Local>>,
}

impl MotionClassifier {
    /// History grows on demand; eviction keeps it within
    /// [`ClassifierConfig::max_history_len`].
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            history: VecDeque::new(),
            dwell_start: None,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Swap in new thresholds. History and dwell timing are kept; only
    /// future judgements use the new values.
    pub fn set_config(&mut self, config: ClassifierConfig) {
        self.config = config;
        self.evict();
    }

    /// Record a fix.
    ///
    /// Returns `false` (and records nothing) when the fix is not newer than
    /// the latest one already held: out-of-order and duplicate-timestamp
    /// fixes are dropped.
    pub fn observe(&mut self, fix: Fix) -> bool {
        if let Some(newest) = self.history.back()
            && fix.timestamp <= newest.timestamp
        {
            debug!(
                fix_time = %fix.timestamp,
                newest_time = %newest.timestamp,
                "Dropping fix that is not newer than history"
            );
            return false;
        }

        self.history.push_back(fix);
        self.evict();
        true
    }

    fn evict(&mut self) {
        if let Some(newest) = self.history.back() {
            let retention = signed_duration(self.config.retention_window());
            if let Some(cutoff) = newest.timestamp.checked_sub_signed(retention) {
                while self
                    .history
                    .front()
                    .is_some_and(|oldest| oldest.timestamp < cutoff)
                {
                    self.history.pop_front();
                }
            }
        }

        let max_len = self.config.max_history_len();
        while self.history.len() > max_len {
            self.history.pop_front();
        }
    }

    /// Is the worker moving as of `fix`?
    ///
    /// A reported speed at or above the threshold decides immediately.
    /// Otherwise displacement from the oldest fix inside the moving window is
    /// used, which catches movement on devices that report no speed or a
    /// zero-quantized one.
    pub fn is_moving(&self, fix: &Fix) -> bool {
        if fix
            .speed
            .is_some_and(|speed| speed >= self.config.moving_speed_mps)
        {
            return true;
        }

        let window = signed_duration(self.config.moving_window);
        let Some(window_start) = fix.timestamp.checked_sub_signed(window) else {
            return false;
        };

        let mut in_window = self
            .history
            .iter()
            .filter(|f| f.timestamp >= window_start && f.timestamp <= fix.timestamp);

        let Some(oldest) = in_window.next() else {
            return false;
        };
        if in_window.next().is_none() {
            return false;
        }

        distance_meters(oldest.coordinate(), fix.coordinate()) >= self.config.moving_distance_meters
    }

    /// Has the worker been dwelling long enough to count as arrived?
    ///
    /// The newest few fixes must show no movement-grade speed and a spread
    /// below the stationary threshold. The first time that holds, the dwell
    /// clock is anchored at the oldest inspected fix and `false` is returned;
    /// afterwards `true` once `now` is at least the dwell time past the anchor.
    /// Any movement clears the anchor.
    pub fn is_stationary(&mut self, now: DateTime<Local>) -> bool {
        if self.history.len() < MIN_STATIONARY_FIXES {
            return false;
        }

        let skip = self.history.len().saturating_sub(STATIONARY_SAMPLE);
        let recent: Vec<&Fix> = self.history.iter().skip(skip).collect();

        if recent
            .iter()
            .any(|f| f.speed.is_some_and(|s| s >= self.config.moving_speed_mps))
        {
            self.reset_dwell();
            return false;
        }

        let first = recent[0];
        let spread = recent[1..]
            .iter()
            .map(|f| distance_meters(first.coordinate(), f.coordinate()))
            .fold(0.0, f64::max);

        if spread >= self.config.stationary_distance_meters {
            debug!(spread_m = spread, "Spread too wide for dwelling");
            self.reset_dwell();
            return false;
        }

        let Some(dwell_start) = self.dwell_start else {
            debug!(anchor = %first.timestamp, spread_m = spread, "Dwell timer started");
            self.dwell_start = Some(first.timestamp);
            return false;
        };

        now.signed_duration_since(dwell_start) >= signed_duration(self.config.dwell_time)
    }

    /// Forget any pending dwell timing
    pub fn reset_dwell(&mut self) {
        self.dwell_start = None;
    }

    /// Drop all history and dwell timing
    pub fn clear(&mut self) {
        self.history.clear();
        self.dwell_start = None;
    }

    pub fn dwell_start(&self) -> Option<DateTime<Local>> {
        self.dwell_start
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn newest(&self) -> Option<&Fix> {
        self.history.back()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Local, TimeZone};
    use fieldtrack_api::{Coordinate, Fix, Geofence};
    use fieldtrack_config::ClassifierConfig;
    use std::time::Duration;

    use crate::EARTH_RADIUS_METERS;

    pub const HOME_LAT: f64 = 52.52;
    pub const HOME_LON: f64 = 13.405;

    pub fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 2, h, m, s).unwrap()
    }

    /// Latitude `meters` north of home
    pub fn north(meters: f64) -> f64 {
        HOME_LAT + (meters / EARTH_RADIUS_METERS).to_degrees()
    }

    pub fn fix_north(meters: f64, ts: DateTime<Local>) -> Fix {
        Fix::new(north(meters), HOME_LON, ts)
    }

    pub fn test_config() -> ClassifierConfig {
        let home = Geofence::new("Home", Coordinate::new(HOME_LAT, HOME_LON), 100.0);
        let mut config = ClassifierConfig::new(home);
        config.stationary_distance_meters = 50.0;
        config.dwell_time = Duration::from_secs(300);
        config.moving_speed_mps = 2.0;
        config.moving_distance_meters = 100.0;
        config.moving_window = Duration::from_secs(60);
        config.sampling_interval = Duration::from_secs(10);
        config
    }
}
