//! Session timer aggregation
//!
//! Totals are always recomputed by replaying the whole event log. There is no
//! incremental state to drift out of sync with the log.

use chrono::{DateTime, Local};
use fieldtrack_api::{DomainEvent, EventKind, LivePhase, Phase, SessionTotals};
use fieldtrack_util::whole_minutes_between;

/// Replay `events` into travel/work/return totals.
///
/// Events are scanned in timestamp order (ties keep log order). A phase left
/// open after the last event is reported as `live`, measured against `now`,
/// and never added to the closed totals.
pub fn compute_timers(events: &[DomainEvent], now: DateTime<Local>) -> SessionTotals {
    let mut ordered: Vec<&DomainEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.timestamp);

    let mut totals = SessionTotals::default();
    let mut open: Option<(Phase, DateTime<Local>)> = None;

    for event in ordered {
        let next = match event.kind {
            EventKind::HomeLeave | EventKind::WorkSelected => Some(Phase::Travel),
            EventKind::AtCustomerStart => Some(Phase::Work),
            EventKind::AtCustomerEnd | EventKind::WorkDone => Some(Phase::Return),
            EventKind::HomeArrivalConfirmed | EventKind::PrivateSelected => None,
            // Only a prompt, not a phase boundary
            EventKind::ArrivalCandidate => continue,
        };

        if let Some((phase, started_at)) = open.take() {
            close_phase(&mut totals, phase, started_at, event.timestamp);
        }
        open = next.map(|phase| (phase, event.timestamp));
    }

    totals.live = open.map(|(phase, started_at)| LivePhase {
        phase,
        started_at,
        elapsed_minutes: whole_minutes_between(started_at, now),
    });

    totals
}

fn close_phase(
    totals: &mut SessionTotals,
    phase: Phase,
    started_at: DateTime<Local>,
    ended_at: DateTime<Local>,
) {
    let minutes = whole_minutes_between(started_at, ended_at);
    match phase {
        Phase::Travel => totals.travel_minutes += minutes,
        Phase::Work => totals.work_minutes += minutes,
        Phase::Return => totals.return_minutes += minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fieldtrack_api::Fix;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
    }

    fn at_s(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 2, h, m, s).unwrap()
    }

    fn event(kind: EventKind, ts: DateTime<Local>) -> DomainEvent {
        DomainEvent::new(kind, ts, Fix::new(52.52, 13.405, ts))
    }

    fn full_day() -> Vec<DomainEvent> {
        vec![
            event(EventKind::HomeLeave, at(10, 0)),
            event(EventKind::AtCustomerStart, at(10, 30)),
            event(EventKind::WorkDone, at(14, 0)),
            event(EventKind::HomeArrivalConfirmed, at(14, 45)),
        ]
    }

    #[test]
    fn full_day_totals() {
        let totals = compute_timers(&full_day(), at(18, 0));
        assert_eq!(totals.travel_minutes, 30);
        assert_eq!(totals.work_minutes, 210);
        assert_eq!(totals.return_minutes, 45);
        assert!(totals.live.is_none());
    }

    #[test]
    fn open_return_phase_is_live() {
        let mut events = full_day();
        events.truncate(3);

        let totals = compute_timers(&events, at(14, 20));
        assert_eq!(totals.travel_minutes, 30);
        assert_eq!(totals.work_minutes, 210);
        assert_eq!(totals.return_minutes, 0);
        assert_eq!(
            totals.live,
            Some(LivePhase {
                phase: Phase::Return,
                started_at: at(14, 0),
                elapsed_minutes: 20,
            })
        );
    }

    #[test]
    fn empty_log_has_no_totals() {
        assert_eq!(compute_timers(&[], at(12, 0)), SessionTotals::default());
    }

    #[test]
    fn recompute_is_idempotent() {
        let events = full_day();
        let first = compute_timers(&events, at(15, 0));
        let second = compute_timers(&events, at(15, 0));
        assert_eq!(first, second);
    }

    #[test]
    fn unsorted_log_is_replayed_in_time_order() {
        let mut events = full_day();
        events.reverse();
        assert_eq!(
            compute_timers(&events, at(18, 0)),
            compute_timers(&full_day(), at(18, 0))
        );
    }

    #[test]
    fn minutes_are_truncated_not_rounded() {
        let events = vec![
            event(EventKind::HomeLeave, at_s(10, 0, 0)),
            event(EventKind::AtCustomerStart, at_s(10, 29, 59)),
            event(EventKind::AtCustomerEnd, at_s(10, 31, 58)),
        ];
        let totals = compute_timers(&events, at_s(10, 32, 57));
        assert_eq!(totals.travel_minutes, 29);
        assert_eq!(totals.work_minutes, 1);
        assert_eq!(totals.live.map(|l| l.elapsed_minutes), Some(0));
    }

    #[test]
    fn arrival_candidate_is_not_a_boundary() {
        let mut events = full_day();
        events.insert(1, event(EventKind::ArrivalCandidate, at(10, 25)));
        assert_eq!(
            compute_timers(&events, at(18, 0)),
            compute_timers(&full_day(), at(18, 0))
        );
    }

    #[test]
    fn private_selected_closes_travel() {
        let events = vec![
            event(EventKind::HomeLeave, at(9, 0)),
            event(EventKind::PrivateSelected, at(9, 10)),
        ];
        let totals = compute_timers(&events, at(12, 0));
        assert_eq!(totals.travel_minutes, 10);
        assert!(totals.live.is_none());
    }

    #[test]
    fn work_selected_restarts_travel() {
        let events = vec![
            event(EventKind::HomeLeave, at(9, 0)),
            event(EventKind::WorkSelected, at(9, 2)),
            event(EventKind::AtCustomerStart, at(9, 40)),
        ];
        let totals = compute_timers(&events, at(10, 0));
        // 2 + 38, split across the two travel spans
        assert_eq!(totals.travel_minutes, 40);
        assert_eq!(
            totals.live.as_ref().map(|l| (l.phase, l.elapsed_minutes)),
            Some((Phase::Work, 20))
        );
    }

    #[test]
    fn leaving_customer_then_work_done_counts_both_as_return() {
        let events = vec![
            event(EventKind::HomeLeave, at(8, 0)),
            event(EventKind::AtCustomerStart, at(8, 30)),
            event(EventKind::AtCustomerEnd, at(12, 0)),
            event(EventKind::WorkDone, at(12, 5)),
            event(EventKind::HomeArrivalConfirmed, at(12, 50)),
        ];
        let totals = compute_timers(&events, at(13, 0));
        assert_eq!(totals.travel_minutes, 30);
        assert_eq!(totals.work_minutes, 210);
        assert_eq!(totals.return_minutes, 50);
    }

    #[test]
    fn closed_plus_live_spans_the_log() {
        let events = vec![
            event(EventKind::HomeLeave, at_s(7, 0, 0)),
            event(EventKind::WorkSelected, at_s(7, 1, 30)),
            event(EventKind::AtCustomerStart, at_s(7, 45, 10)),
            event(EventKind::AtCustomerEnd, at_s(11, 2, 40)),
        ];
        let now = at_s(11, 30, 20);
        let totals = compute_timers(&events, now);

        let phases = 4u64;
        let span = whole_minutes_between(at_s(7, 0, 0), now);
        let counted = totals.total_minutes_including_live();
        // Each phase loses under a minute to truncation
        assert!(counted <= span);
        assert!(span - counted < phases);
    }

    #[test]
    fn decision_before_any_phase_opens_nothing() {
        let events = vec![event(EventKind::HomeArrivalConfirmed, at(9, 0))];
        let totals = compute_timers(&events, at(10, 0));
        assert_eq!(totals, SessionTotals::default());
    }
}
