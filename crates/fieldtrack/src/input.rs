//! NDJSON tracker input
//!
//! One [`TrackerInput`] per line:
//!
//! ```text
//! {"type":"location_update","fix":{"latitude":52.55,"longitude":13.4,"speed":14.2,"timestamp":"2025-06-02T07:45:00+02:00"}}
//! {"type":"decision","decision":"SELECT_WORK","note":"job 1182","at":"2025-06-02T07:45:20+02:00"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use fieldtrack_api::TrackerInput;
use fieldtrack_util::{Result, TrackError};
use std::io::BufRead;

/// Parse one line. `Ok(None)` for blank and comment lines.
pub fn parse_input_line(line: &str) -> Result<Option<TrackerInput>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| TrackError::input(e.to_string()))
}

/// Read every input from `reader`, failing on the first malformed line
pub fn read_inputs(reader: impl BufRead) -> Result<Vec<TrackerInput>> {
    let mut inputs = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| TrackError::input(format!("line {}: {}", index + 1, e)))?;
        match parse_input_line(&line) {
            Ok(Some(input)) => inputs.push(input),
            Ok(None) => {}
            Err(TrackError::InputError(msg)) => {
                return Err(TrackError::input(format!("line {}: {}", index + 1, msg)));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(inputs)
}
