//! Elapsed-time strategies used for every duration the engine reports.
//!
//! The engine never measures time itself: it asks a [`WorkingHours`]
//! implementation how many hours separate two instants. Which calendar
//! applies is a configuration decision (`[hours] policy`), not something the
//! lifecycle code assumes.

use chrono::{
    Datelike, DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc,
    Weekday,
};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Measures elapsed hours between two instants.
///
/// Implementations must be total (never panic) and monotonic: when
/// `to >= from` the result is `>= 0`. The engine clamps anything negative
/// or NaN to zero regardless.
pub trait WorkingHours: Send + Sync {
    fn elapsed_hours(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> f64;

    /// Short policy name for logs and `config show`.
    fn policy_name(&self) -> &'static str;
}

/// Every hour counts: plain wall-clock difference (24x7).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallClock;

impl WorkingHours for WallClock {
    fn elapsed_hours(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
        if to <= from {
            return 0.0;
        }
        millis_to_hours((to - from).num_milliseconds())
    }

    fn policy_name(&self) -> &'static str {
        "wall_clock"
    }
}

/// Only time inside a daily window on working weekdays counts.
///
/// Days are evaluated in a fixed UTC offset, so daylight-saving shifts are
/// not modelled. Holidays are not modelled either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessHours {
    workdays: Vec<Weekday>,
    day_start: NaiveTime,
    day_end: NaiveTime,
    offset: FixedOffset,
}

impl BusinessHours {
    /// Build a calendar; `None` when the window is empty or inverted.
    #[must_use]
    pub fn new(
        workdays: Vec<Weekday>,
        day_start: NaiveTime,
        day_end: NaiveTime,
        offset: FixedOffset,
    ) -> Option<Self> {
        (day_start < day_end).then_some(Self {
            workdays,
            day_start,
            day_end,
            offset,
        })
    }

    /// Monday to Friday, 08:30 to 17:30, UTC.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            workdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            day_start: NaiveTime::from_hms_opt(8, 30, 0).unwrap_or(NaiveTime::MIN),
            day_end: NaiveTime::from_hms_opt(17, 30, 0).unwrap_or(NaiveTime::MIN),
            offset: Utc.fix(),
        }
    }

    /// Wall-clock time in the calendar's offset, saturating at the ends of
    /// the representable range.
    fn local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        let shift = i64::from(self.offset.local_minus_utc());
        instant
            .naive_utc()
            .checked_add_signed(Duration::seconds(shift))
            .unwrap_or(if shift > 0 {
                NaiveDateTime::MAX
            } else {
                NaiveDateTime::MIN
            })
    }

    fn is_workday(&self, day: Weekday) -> bool {
        self.workdays.contains(&day)
    }

    /// Working time on `day` that falls inside `[from, to]`.
    fn day_millis(&self, day: NaiveDate, from: NaiveDateTime, to: NaiveDateTime) -> i64 {
        if !self.is_workday(day.weekday()) {
            return 0;
        }
        let window_start = day.and_time(self.day_start).max(from);
        let window_end = day.and_time(self.day_end).min(to);
        if window_start < window_end {
            (window_end - window_start).num_milliseconds()
        } else {
            0
        }
    }

    /// Number of working days among `days` consecutive days starting on a
    /// `first` weekday. Whole weeks are counted arithmetically.
    fn workdays_in(&self, first: Weekday, days: i64) -> i64 {
        let per_week = WEEK
            .iter()
            .fold(0_i64, |n, day| n + i64::from(self.is_workday(*day)));
        let mut count = days / 7 * per_week;
        let mut day = first;
        for _ in 0..days % 7 {
            count += i64::from(self.is_workday(day));
            day = day.succ();
        }
        count
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl Default for BusinessHours {
    fn default() -> Self {
        Self::standard()
    }
}

impl WorkingHours for BusinessHours {
    fn elapsed_hours(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
        if to <= from {
            return 0.0;
        }

        let start = self.local(from);
        let end = self.local(to);
        let (first, last) = (start.date(), end.date());
        if first == last {
            return millis_to_hours(self.day_millis(first, start, end));
        }

        let edges = self.day_millis(first, start, end) + self.day_millis(last, start, end);
        let inner_days = (last - first).num_days() - 1;
        let inner_workdays = self.workdays_in(first.weekday().succ(), inner_days);
        let window = (self.day_end - self.day_start).num_milliseconds();

        #[allow(clippy::cast_precision_loss)]
        let inner = inner_workdays as f64 * window as f64;
        millis_to_hours(edges) + inner / MILLIS_PER_HOUR
    }

    fn policy_name(&self) -> &'static str {
        "business"
    }
}

#[allow(clippy::cast_precision_loss)]
fn millis_to_hours(millis: i64) -> f64 {
    millis as f64 / MILLIS_PER_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn wall_clock_counts_every_hour() {
        let hours = WallClock.elapsed_hours(utc(2024, 1, 1, 9, 0), utc(2024, 1, 2, 9, 30));
        assert!(approx(hours, 24.5));
    }

    #[test]
    fn reversed_intervals_are_zero() {
        let a = utc(2024, 1, 2, 9, 0);
        let b = utc(2024, 1, 1, 9, 0);
        assert!(approx(WallClock.elapsed_hours(a, b), 0.0));
        assert!(approx(BusinessHours::standard().elapsed_hours(a, b), 0.0));
    }

    #[test]
    fn business_hours_full_weekday_is_nine_hours() {
        // 2024-01-01 is a Monday.
        let cal = BusinessHours::standard();
        let hours = cal.elapsed_hours(utc(2024, 1, 1, 0, 0), utc(2024, 1, 2, 0, 0));
        assert!(approx(hours, 9.0));
    }

    #[test]
    fn business_hours_skip_weekends() {
        // Friday 17:00 -> Monday 09:30: half an hour Friday, one hour Monday.
        let cal = BusinessHours::standard();
        let hours = cal.elapsed_hours(utc(2024, 1, 5, 17, 0), utc(2024, 1, 8, 9, 30));
        assert!(approx(hours, 1.5));
    }

    #[test]
    fn business_hours_clip_partial_days() {
        let cal = BusinessHours::standard();
        // Monday 07:00 -> 10:00 counts 08:30 -> 10:00.
        let hours = cal.elapsed_hours(utc(2024, 1, 1, 7, 0), utc(2024, 1, 1, 10, 0));
        assert!(approx(hours, 1.5));
        // Entirely after hours.
        let hours = cal.elapsed_hours(utc(2024, 1, 1, 18, 0), utc(2024, 1, 1, 23, 0));
        assert!(approx(hours, 0.0));
    }

    #[test]
    fn business_hours_one_full_week() {
        let cal = BusinessHours::standard();
        let hours = cal.elapsed_hours(utc(2024, 1, 1, 0, 0), utc(2024, 1, 8, 0, 0));
        assert!(approx(hours, 45.0));
    }

    #[test]
    fn business_hours_respect_offset() {
        let ist = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        let cal = BusinessHours::new(
            vec![Weekday::Mon],
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            ist,
        )
        .unwrap();
        // 09:00-10:00 IST on Monday is 03:30-04:30 UTC.
        let hours = cal.elapsed_hours(utc(2024, 1, 1, 3, 0), utc(2024, 1, 1, 5, 0));
        assert!(approx(hours, 1.0));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let five = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        assert!(BusinessHours::new(vec![Weekday::Mon], five, nine, Utc.fix()).is_none());
        assert!(BusinessHours::new(vec![Weekday::Mon], nine, nine, Utc.fix()).is_none());
    }

    #[test]
    fn policies_have_names() {
        assert_eq!(WallClock.policy_name(), "wall_clock");
        assert_eq!(BusinessHours::default().policy_name(), "business");
    }

    /// Day-by-day walk used to check the arithmetic week counting.
    fn walked_hours(cal: &BusinessHours, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
        let (start, end) = (cal.local(from), cal.local(to));
        let millis: i64 = start
            .date()
            .iter_days()
            .take_while(|day| *day <= end.date())
            .map(|day| cal.day_millis(day, start, end))
            .sum();
        millis_to_hours(millis)
    }

    #[test]
    fn week_arithmetic_matches_a_day_walk() {
        let odd = BusinessHours::new(
            vec![Weekday::Tue, Weekday::Sat, Weekday::Sun],
            NaiveTime::from_hms_opt(6, 15, 0).unwrap(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            FixedOffset::west_opt(7 * 3600).unwrap(),
        )
        .unwrap();
        let calendars = [BusinessHours::standard(), odd];
        let base = utc(2024, 1, 3, 13, 17);
        for cal in &calendars {
            for span_hours in [1_i64, 7, 23, 25, 49, 100, 167, 169, 500, 1_000, 4_321] {
                for shift_hours in [0_i64, 5, 11, 60] {
                    let from = base + Duration::hours(shift_hours);
                    let to = from + Duration::hours(span_hours);
                    let fast = cal.elapsed_hours(from, to);
                    let slow = walked_hours(cal, from, to);
                    assert!(approx(fast, slow), "{span_hours}h from +{shift_hours}h: {fast} vs {slow}");
                }
            }
        }
    }

    #[test]
    fn extreme_instants_do_not_panic() {
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        let cal = BusinessHours::new(
            vec![Weekday::Mon, Weekday::Fri],
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            ist,
        )
        .unwrap();
        let near_max = DateTime::from_timestamp_millis(8_210_266_876_799_999).unwrap();
        let near_min = DateTime::from_timestamp_millis(-8_000_000_000_000_000).unwrap();
        let hours = cal.elapsed_hours(utc(2024, 1, 1, 0, 0), near_max);
        assert!(hours.is_finite() && hours > 0.0);
        let hours = cal.elapsed_hours(near_min, near_max);
        assert!(hours.is_finite() && hours > 0.0);
    }

    #[test]
    fn ten_thousand_years_is_computed_arithmetically() {
        // One week holds 45 standard hours; 2024-01-01 is a Monday.
        let from = utc(2024, 1, 1, 0, 0);
        let weeks = 52 * 7_000_i64;
        let to = from + Duration::weeks(weeks);
        #[allow(clippy::cast_precision_loss)]
        let expected = 45.0 * weeks as f64;
        assert!(approx(BusinessHours::standard().elapsed_hours(from, to), expected));
    }
}
