//! Per-bucket time accounting.
//!
//! Each interval between adjacent events is charged to the bucket of the
//! earlier event's status class. A ticket that is not finished gets one more
//! interval, from its last event to `now`. Totals stay unrounded until the
//! [`Durations`] record is built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hours::WorkingHours;
use crate::model::event::Event;
use crate::model::status::{StatusClass, StatusVocabulary};

/// Derived duration metrics for one ticket, in whole hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub blocked_hours: i64,
    pub development_hours: i64,
    pub review_hours: i64,
    pub qa_hours: i64,
    /// Time spent in statuses outside the four buckets above. It is never
    /// folded into any of them.
    pub untracked_hours: i64,
    pub total_cycle_time_hours: Option<i64>,
    pub current_block_duration_hours: Option<i64>,
}

impl Durations {
    /// Sum of the four tracked buckets.
    #[must_use]
    pub const fn tracked_hours(&self) -> i64 {
        self.blocked_hours + self.development_hours + self.review_hours + self.qa_hours
    }
}

/// Everything the calculator reads about one ticket.
#[derive(Debug, Clone, Copy)]
pub struct DurationInput<'a> {
    pub events: &'a [Event],
    pub is_terminal: bool,
    pub currently_blocked: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub block_started_at: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
struct BucketTotals {
    blocked: f64,
    development: f64,
    review: f64,
    qa: f64,
    untracked: f64,
}

impl BucketTotals {
    fn charge(self, class: StatusClass, hours: f64) -> Self {
        match class {
            StatusClass::Blocked => Self {
                blocked: self.blocked + hours,
                ..self
            },
            StatusClass::Development => Self {
                development: self.development + hours,
                ..self
            },
            StatusClass::Review => Self {
                review: self.review + hours,
                ..self
            },
            StatusClass::Qa => Self {
                qa: self.qa + hours,
                ..self
            },
            StatusClass::Unblocked | StatusClass::Terminal | StatusClass::Other => Self {
                untracked: self.untracked + hours,
                ..self
            },
        }
    }
}

/// Fold a ticket's events into its duration record.
#[must_use]
pub fn compute_durations(
    input: &DurationInput<'_>,
    vocab: &StatusVocabulary,
    hours: &dyn WorkingHours,
) -> Durations {
    let events = input.events;
    let tail = events
        .last()
        .filter(|_| !input.is_terminal)
        .map(|last| (last, input.now));

    let totals = events
        .windows(2)
        .map(|pair| (&pair[0], pair[1].timestamp))
        .chain(tail)
        .fold(BucketTotals::default(), |acc, (event, until)| {
            acc.charge(
                vocab.classify(&event.status),
                elapsed(hours, event.timestamp, until),
            )
        });

    let total_cycle_time_hours = input
        .created_at
        .zip(input.resolved_at)
        .map(|(created, resolved)| round_hours(elapsed(hours, created, resolved)));

    let current_block_duration_hours = input
        .block_started_at
        .filter(|_| input.currently_blocked)
        .map(|since| round_hours(elapsed(hours, since, input.now)));

    Durations {
        blocked_hours: round_hours(totals.blocked),
        development_hours: round_hours(totals.development),
        review_hours: round_hours(totals.review),
        qa_hours: round_hours(totals.qa),
        untracked_hours: round_hours(totals.untracked),
        total_cycle_time_hours,
        current_block_duration_hours,
    }
}

/// Elapsed hours, clamped to a finite non-negative value.
pub(crate) fn elapsed(hours: &dyn WorkingHours, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let value = hours.elapsed_hours(from, to);
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Nearest whole hour, halves away from zero.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn round_hours(hours: f64) -> i64 {
    hours.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hours::{BusinessHours, WallClock};
    use crate::model::event::EventOrigin;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    fn ev(status: &str, at: DateTime<Utc>) -> Event {
        Event {
            status: status.into(),
            timestamp: at,
            user: "ram".into(),
            blocked_by: None,
            note: None,
            reason: None,
            origin: EventOrigin::Observed,
        }
    }

    fn input(events: &[Event], now: DateTime<Utc>) -> DurationInput<'_> {
        DurationInput {
            events,
            is_terminal: false,
            currently_blocked: false,
            created_at: None,
            resolved_at: None,
            block_started_at: None,
            now,
        }
    }

    /// Negative or NaN answers from a strategy must never leak out.
    struct Broken;

    impl WorkingHours for Broken {
        fn elapsed_hours(&self, from: DateTime<Utc>, _to: DateTime<Utc>) -> f64 {
            if from.timestamp() % 2 == 0 { f64::NAN } else { -5.0 }
        }

        fn policy_name(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn empty_sequence_is_all_zero() {
        let now = utc(2024, 1, 10, 0);
        let out = compute_durations(&input(&[], now), &StatusVocabulary::default(), &WallClock);
        assert_eq!(out, Durations::default());
    }

    #[test]
    fn scenario_with_block_in_the_middle() {
        let events = [
            ev("In Progress", utc(2024, 1, 1, 9)),
            ev("Blocked", utc(2024, 1, 2, 9)),
            ev("In Progress", utc(2024, 1, 3, 9)),
            ev("Done", utc(2024, 1, 4, 9)),
        ];
        let out = compute_durations(
            &DurationInput {
                is_terminal: true,
                created_at: Some(utc(2024, 1, 1, 9)),
                resolved_at: Some(utc(2024, 1, 4, 9)),
                ..input(&events, utc(2024, 3, 1, 0))
            },
            &StatusVocabulary::default(),
            &WallClock,
        );
        assert_eq!(out.blocked_hours, 24);
        assert_eq!(out.development_hours, 48);
        assert_eq!(out.total_cycle_time_hours, Some(72));
        assert_eq!(out.current_block_duration_hours, None);
        assert_eq!(out.untracked_hours, 0);
    }

    #[test]
    fn open_ticket_accrues_until_now() {
        let events = [ev("In Review", utc(2024, 1, 1, 0))];
        let out = compute_durations(
            &input(&events, utc(2024, 1, 1, 10)),
            &StatusVocabulary::default(),
            &WallClock,
        );
        assert_eq!(out.review_hours, 10);
    }

    #[test]
    fn terminal_ticket_stops_at_last_event() {
        let events = [ev("QA", utc(2024, 1, 1, 0)), ev("Done", utc(2024, 1, 1, 5))];
        let out = compute_durations(
            &DurationInput {
                is_terminal: true,
                ..input(&events, utc(2024, 6, 1, 0))
            },
            &StatusVocabulary::default(),
            &WallClock,
        );
        assert_eq!(out.qa_hours, 5);
        assert_eq!(out.untracked_hours, 0);
    }

    #[test]
    fn untracked_statuses_never_reach_tracked_buckets() {
        let events = [
            ev("Backlog", utc(2024, 1, 1, 0)),
            ev("In Progress", utc(2024, 1, 1, 7)),
            ev("Deprioritized", utc(2024, 1, 1, 10)),
            ev("Done", utc(2024, 1, 1, 14)),
        ];
        let out = compute_durations(
            &DurationInput {
                is_terminal: true,
                ..input(&events, utc(2024, 1, 2, 0))
            },
            &StatusVocabulary::default(),
            &WallClock,
        );
        assert_eq!(out.tracked_hours(), 3);
        assert_eq!(out.untracked_hours, 11);
    }

    #[test]
    fn rounding_happens_once_at_the_end() {
        // Three 20-minute development stints: 1h total, 0h each if rounded early.
        let events = [
            ev("In Progress", utc(2024, 1, 1, 0)),
            ev("Backlog", utc(2024, 1, 1, 0) + chrono::Duration::minutes(20)),
            ev("In Progress", utc(2024, 1, 1, 1)),
            ev("Backlog", utc(2024, 1, 1, 1) + chrono::Duration::minutes(20)),
            ev("In Progress", utc(2024, 1, 1, 2)),
            ev("Done", utc(2024, 1, 1, 2) + chrono::Duration::minutes(20)),
        ];
        let out = compute_durations(
            &DurationInput {
                is_terminal: true,
                ..input(&events, utc(2024, 1, 2, 0))
            },
            &StatusVocabulary::default(),
            &WallClock,
        );
        assert_eq!(out.development_hours, 1);
    }

    #[test]
    fn current_block_needs_flag_and_start() {
        let events = [ev("Blocked", utc(2024, 2, 1, 0))];
        let base = DurationInput {
            block_started_at: Some(utc(2024, 2, 1, 0)),
            ..input(&events, utc(2024, 2, 2, 12))
        };
        let vocab = StatusVocabulary::default();

        let blocked = compute_durations(
            &DurationInput {
                currently_blocked: true,
                ..base
            },
            &vocab,
            &WallClock,
        );
        assert_eq!(blocked.current_block_duration_hours, Some(36));
        assert_eq!(blocked.blocked_hours, 36);

        let clear = compute_durations(&base, &vocab, &WallClock);
        assert_eq!(clear.current_block_duration_hours, None);
    }

    #[test]
    fn cycle_time_needs_both_ends() {
        let only_created = DurationInput {
            created_at: Some(utc(2024, 1, 1, 0)),
            ..input(&[], utc(2024, 1, 5, 0))
        };
        let out = compute_durations(&only_created, &StatusVocabulary::default(), &WallClock);
        assert_eq!(out.total_cycle_time_hours, None);
    }

    #[test]
    fn business_calendar_changes_bucket_sizes() {
        // Friday 17:00 blocked until Monday 09:30.
        let events = [
            ev("Blocked", utc(2024, 1, 5, 17)),
            ev("Unblocked", utc(2024, 1, 8, 9) + chrono::Duration::minutes(30)),
        ];
        let out = compute_durations(
            &DurationInput {
                is_terminal: true,
                ..input(&events, utc(2024, 1, 9, 0))
            },
            &StatusVocabulary::default(),
            &BusinessHours::standard(),
        );
        assert_eq!(out.blocked_hours, 2);
    }

    #[test]
    fn broken_strategy_is_clamped_to_zero() {
        let events = [ev("In Progress", utc(2024, 1, 1, 0)), ev("QA", utc(2024, 1, 1, 1))];
        let out = compute_durations(&input(&events, utc(2024, 1, 2, 0)), &StatusVocabulary::default(), &Broken);
        assert_eq!(out.development_hours, 0);
        assert_eq!(out.qa_hours, 0);
    }

    #[test]
    fn halves_round_away_from_zero() {
        assert_eq!(round_hours(0.5), 1);
        assert_eq!(round_hours(1.49), 1);
        assert_eq!(round_hours(2.5), 3);
        assert_eq!(round_hours(0.0), 0);
    }
}
