//! Integration tests for fieldtrack
//!
//! These tests drive whole days through config, store, tracking session and
//! replay the way the binary does.

use chrono::{DateTime, Local, TimeZone};
use fieldtrack::{read_inputs, replay};
use fieldtrack_api::{EventKind, Fix, Phase, TrackerInput, TravelState, UserDecision};
use fieldtrack_config::{parse_config, TrackerConfig};
use fieldtrack_core::{compute_timers, TrackingSession};
use fieldtrack_store::{EventStore, SqliteStore};
use fieldtrack_util::{ManualClock, SessionId};
use std::io::Write;
use std::sync::Arc;

const HOME_LAT: f64 = 52.52;
const HOME_LON: f64 = 13.405;

/// Kilometres per degree of latitude on the haversine sphere
const KM_PER_DEGREE: f64 = 111.194_926_644_558_73;

const CONFIG: &str = r#"
config_version = 1

[home]
latitude = 52.52
longitude = 13.405
radius_meters = 100.0
label = "Home"

[tracker]
data_dir = "/tmp/fieldtrack-integration"
"#;

fn config() -> TrackerConfig {
    parse_config(CONFIG).unwrap()
}

fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 6, 2, h, m, s).unwrap()
}

fn fix(km_north: f64, speed: f64, ts: DateTime<Local>) -> TrackerInput {
    TrackerInput::LocationUpdate {
        fix: Fix::new(HOME_LAT + km_north / KM_PER_DEGREE, HOME_LON, ts).with_speed(speed),
    }
}

fn decide(decision: UserDecision, ts: DateTime<Local>) -> TrackerInput {
    TrackerInput::Decision {
        decision,
        note: None,
        at: Some(ts),
    }
}

/// Home until 08:00, drive 20 km north, work from 08:31 to 12:30, home at 13:05
fn morning() -> Vec<TrackerInput> {
    let mut inputs = vec![
        fix(0.0, 0.0, at(7, 50, 0)),
        fix(1.0, 14.0, at(8, 0, 0)),
        decide(UserDecision::SelectWork, at(8, 0, 20)),
        fix(5.0, 15.0, at(8, 10, 0)),
        fix(10.0, 15.0, at(8, 20, 0)),
    ];
    for m in 25..=30 {
        inputs.push(fix(20.0, 0.0, at(8, m, 0)));
    }
    inputs.push(decide(UserDecision::ConfirmAtCustomer, at(8, 31, 0)));
    inputs.push(fix(20.0, 0.0, at(10, 0, 0)));
    inputs
}

fn afternoon() -> Vec<TrackerInput> {
    let mut inputs = vec![
        fix(20.0, 0.0, at(12, 0, 0)),
        fix(19.0, 13.0, at(12, 30, 0)),
        decide(UserDecision::ConfirmWorkDone, at(12, 31, 0)),
        fix(10.0, 15.0, at(12, 45, 0)),
    ];
    for m in 0..=5 {
        inputs.push(fix(0.03, 0.0, at(13, m, 0)));
    }
    inputs.push(decide(UserDecision::ConfirmHomeArrival, at(13, 6, 0)));
    inputs.push(fix(0.02, 0.0, at(13, 10, 0)));
    inputs
}

fn full_day() -> Vec<TrackerInput> {
    let mut inputs = morning();
    inputs.extend(afternoon());
    inputs
}

fn new_session(
    store: Arc<SqliteStore>,
    id: &str,
    start: DateTime<Local>,
) -> (TrackingSession, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    let session = TrackingSession::resume(SessionId::new(id), &config(), store, clock.clone())
        .unwrap();
    (session, clock)
}

#[test]
fn test_full_day_replay() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (mut session, clock) = new_session(store.clone(), "day", at(7, 50, 0));

    let report = replay(&mut session, &clock, full_day(), None);

    let kinds: Vec<EventKind> = report.events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::HomeLeave,
            EventKind::WorkSelected,
            EventKind::ArrivalCandidate,
            EventKind::AtCustomerStart,
            EventKind::AtCustomerEnd,
            EventKind::WorkDone,
            EventKind::HomeArrivalConfirmed,
        ]
    );

    let times: Vec<DateTime<Local>> = report.events.iter().map(|e| e.timestamp).collect();
    assert_eq!(
        times,
        vec![
            at(8, 0, 0),
            at(8, 0, 20),
            at(8, 30, 0),
            at(8, 31, 0),
            at(12, 30, 0),
            at(12, 31, 0),
            at(13, 5, 0),
        ]
    );

    // Done resets to idle on the 13:10 fix at home
    assert_eq!(report.final_state, TravelState::IdleAtHome);

    // 08:00:20 -> 08:31 travel, 08:31 -> 12:30 work,
    // 12:30 -> 12:31 and 12:31 -> 13:05 return
    assert_eq!(report.totals.travel_minutes, 30);
    assert_eq!(report.totals.work_minutes, 239);
    assert_eq!(report.totals.return_minutes, 35);
    assert!(report.totals.live.is_none());
    assert_eq!(report.inputs_handled, full_day().len());

    // The persisted log is the same log
    let persisted = store.load_events(&SessionId::new("day")).unwrap();
    assert_eq!(persisted, report.events);
    assert_eq!(compute_timers(&persisted, at(18, 0, 0)), report.totals);
}

#[test]
fn test_work_done_leaves_live_return_phase() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (mut session, clock) = new_session(store, "day", at(7, 50, 0));

    let mut inputs = morning();
    inputs.extend(afternoon().into_iter().take(3));

    let report = replay(&mut session, &clock, inputs, Some(at(12, 51, 0)));
    assert_eq!(report.final_state, TravelState::EnRouteHome);
    assert_eq!(report.totals.travel_minutes, 30);
    assert_eq!(report.totals.work_minutes, 239);
    assert_eq!(report.totals.return_minutes, 1);

    let live = report.totals.live.unwrap();
    assert_eq!(live.phase, Phase::Return);
    assert_eq!(live.started_at, at(12, 31, 0));
    assert_eq!(live.elapsed_minutes, 20);
}

#[test]
fn test_resume_after_restart_matches_uninterrupted_day() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("fieldtrack.db");

    {
        let store = Arc::new(SqliteStore::open(&db_path).unwrap());
        let (mut session, clock) = new_session(store, "day", at(7, 50, 0));
        let report = replay(&mut session, &clock, morning(), None);
        assert_eq!(report.final_state, TravelState::AtCustomer);
    }

    let store = Arc::new(SqliteStore::open(&db_path).unwrap());
    let (mut session, clock) = new_session(store, "day", at(12, 0, 0));
    assert_eq!(session.state(), TravelState::AtCustomer);
    assert_eq!(session.events().len(), 4);

    let report = replay(&mut session, &clock, afternoon(), None);
    assert_eq!(report.events.len(), 3);
    assert_eq!(report.final_state, TravelState::IdleAtHome);
    assert_eq!(report.totals.travel_minutes, 30);
    assert_eq!(report.totals.work_minutes, 239);
    assert_eq!(report.totals.return_minutes, 35);
}

#[test]
fn test_private_trip_records_no_work() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (mut session, clock) = new_session(store, "saturday", at(9, 0, 0));

    let inputs = vec![
        fix(0.0, 0.0, at(9, 0, 0)),
        fix(2.0, 12.0, at(9, 30, 0)),
        decide(UserDecision::SelectPrivate, at(9, 32, 0)),
    ];
    let report = replay(&mut session, &clock, inputs, None);

    let kinds: Vec<EventKind> = report.events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::HomeLeave, EventKind::PrivateSelected]);
    assert_eq!(report.final_state, TravelState::IdleAtHome);
    assert_eq!(report.totals.travel_minutes, 2);
    assert_eq!(report.totals.work_minutes, 0);
    assert!(report.totals.live.is_none());
}

#[test]
fn test_longer_dwell_threshold_from_config() {
    let toml = CONFIG.replace("[tracker]", "[classifier]\ndwell_seconds = 600\n\n[tracker]");
    let config = parse_config(&toml).unwrap();
    assert_eq!(config.classifier.dwell_time.as_secs(), 600);

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let clock = Arc::new(ManualClock::new(at(7, 50, 0)));
    let mut session =
        TrackingSession::new(SessionId::new("slow"), &config, store, clock.clone());

    let report = replay(&mut session, &clock, morning(), None);

    // Six minutes parked is not an arrival any more
    assert_eq!(report.final_state, TravelState::EnRouteToCustomer);
    assert!(report.events.iter().all(|e| e.kind != EventKind::ArrivalCandidate));
}

#[test]
fn test_out_of_order_and_duplicate_fixes_are_ignored() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (mut session, clock) = new_session(store, "noisy", at(7, 50, 0));

    let mut inputs = full_day();
    // A late fix far from home and a duplicate of the departure fix
    inputs.insert(3, fix(30.0, 20.0, at(7, 55, 0)));
    inputs.insert(4, fix(1.0, 14.0, at(8, 0, 0)));

    let noisy = replay(&mut session, &clock, inputs, None);

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (mut session, clock) = new_session(store, "clean", at(7, 50, 0));
    let clean = replay(&mut session, &clock, full_day(), None);

    assert_eq!(noisy.final_state, clean.final_state);
    assert_eq!(noisy.totals, clean.totals);
    assert_eq!(noisy.events.len(), clean.events.len());
}

#[test]
fn test_ndjson_file_replay() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# recorded 2025-06-02").unwrap();
    for input in full_day() {
        writeln!(file, "{}", serde_json::to_string(&input).unwrap()).unwrap();
    }
    writeln!(file).unwrap();

    let reader = std::io::BufReader::new(std::fs::File::open(file.path()).unwrap());
    let inputs = read_inputs(reader).unwrap();
    assert_eq!(inputs, full_day());

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (mut session, clock) = new_session(store.clone(), "from-file", at(7, 50, 0));
    let report = replay(&mut session, &clock, inputs, None);
    assert_eq!(report.events.len(), 7);

    let sessions = store.list_sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id.as_str(), "from-file");
    assert_eq!(sessions[0].event_count, 7);
    assert_eq!(sessions[0].first_event_at, at(8, 0, 0));
}

#[test]
fn test_totals_recompute_from_store_is_stable() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (mut session, clock) = new_session(store.clone(), "day", at(7, 50, 0));
    replay(&mut session, &clock, morning(), None);

    let events = store.load_events(&SessionId::new("day")).unwrap();
    let now = at(11, 0, 0);
    let first = compute_timers(&events, now);
    let second = compute_timers(&events, now);
    assert_eq!(first, second);
    assert_eq!(first.minutes_including_live(Phase::Work), 149);
}

#[test]
fn test_shipped_example_config_and_demo_day() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let config = fieldtrack_config::load_config(root.join("config.example.toml")).unwrap();
    assert_eq!(config.classifier.home.name, "Home");

    let reader =
        std::io::BufReader::new(std::fs::File::open(root.join("demos/workday.ndjson")).unwrap());
    let inputs = read_inputs(reader).unwrap();

    let start = inputs.iter().find_map(|i| i.timestamp()).unwrap();
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let clock = Arc::new(ManualClock::new(start));
    let mut session =
        TrackingSession::new(SessionId::new("demo"), &config, store, clock.clone());

    let report = replay(&mut session, &clock, inputs, None);
    assert_eq!(report.events.len(), 7);
    assert_eq!(
        report.events[1].note.as_deref(),
        Some("boiler service, Pankow")
    );
    assert_eq!(report.totals.travel_minutes, 30);
    assert_eq!(report.totals.work_minutes, 239);
    assert_eq!(report.totals.return_minutes, 35);
}
