//! Human duration strings: `"1d 2h"` and back, using 24-hour days.

/// Render whole hours as `"{d}d {h}h"`, dropping zero parts.
///
/// ```
/// use ticketline_core::format::format_hours;
///
/// assert_eq!(format_hours(0), "0h");
/// assert_eq!(format_hours(26), "1d 2h");
/// assert_eq!(format_hours(48), "2d");
/// ```
#[must_use]
pub fn format_hours(hours: i64) -> String {
    if hours == 0 {
        return "0h".to_string();
    }
    let sign = if hours < 0 { "-" } else { "" };
    let total = hours.unsigned_abs();
    let (days, rest) = (total / 24, total % 24);
    match (days, rest) {
        (0, h) => format!("{sign}{h}h"),
        (d, 0) => format!("{sign}{d}d"),
        (d, h) => format!("{sign}{d}d {h}h"),
    }
}

/// Parse a duration string such as `"3d 4h"`, `"5h"` or `"2 d"` into hours.
///
/// Only `<digits>d` and `<digits>h` parts are recognised (first of each
/// wins); anything else contributes nothing, so garbage parses as `0`.
#[must_use]
pub fn parse_duration(input: &str) -> i64 {
    let lower = input.to_ascii_lowercase();
    let days = unit_value(&lower, 'd').unwrap_or(0);
    let hours = unit_value(&lower, 'h').unwrap_or(0);
    days.saturating_mul(24).saturating_add(hours)
}

/// Find the first run of digits followed (after optional spaces) by `unit`.
fn unit_value(text: &str, unit: char) -> Option<i64> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let digits = &text[start..i];
        let suffix = text[i..].trim_start();
        if suffix.starts_with(unit) {
            return digits.parse().ok();
        }
    }
    None
}
