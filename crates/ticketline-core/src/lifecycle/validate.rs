//! Structural checks over a ticket's final event sequence.
//!
//! Every check runs independently and only reports; nothing here reorders,
//! drops, or repairs events.

use tracing::warn;

use crate::model::event::Event;
use crate::model::issue::{DataIssue, IssueKind};
use crate::model::status::{StatusClass, StatusVocabulary};

/// Ticket-level facts and switches the checks depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// The ticket's blocked flag is set or its status is Blocked-class.
    pub currently_blocked: bool,
    /// Report a blocked ticket whose log does not end in a block.
    pub flag_status_log_mismatch: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            currently_blocked: false,
            flag_status_log_mismatch: true,
        }
    }
}

/// Run every check and collect their issues in check order.
#[must_use]
pub fn validate_sequence(
    events: &[Event],
    vocab: &StatusVocabulary,
    options: ValidationOptions,
) -> Vec<DataIssue> {
    let mut issues = Vec::new();
    issues.extend(check_chronological(events));
    issues.extend(check_closed_blocks(events, vocab, options.currently_blocked));
    issues.extend(check_duplicate_statuses(events));
    if options.flag_status_log_mismatch {
        issues.extend(check_status_log_mismatch(
            events,
            vocab,
            options.currently_blocked,
        ));
    }
    issues
}

/// First out-of-order pair, if any. Only one issue is ever reported.
///
/// The enricher sorts before validating, so a hit here means something
/// upstream broke the ordering.
#[must_use]
pub fn check_chronological(events: &[Event]) -> Option<DataIssue> {
    let index = events
        .windows(2)
        .position(|pair| pair[1].timestamp < pair[0].timestamp)?
        + 1;
    warn!(index, "event sequence is not chronological");
    Some(DataIssue::new(
        IssueKind::NonChronological,
        format!(
            "event {index} ({}) precedes event {} ({})",
            events[index].timestamp.to_rfc3339(),
            index - 1,
            events[index - 1].timestamp.to_rfc3339()
        ),
    ))
}

/// Every block must be followed by an unblock or a return to development
/// before the next block. A trailing open block is fine while the ticket is
/// still blocked.
#[must_use]
pub fn check_closed_blocks(
    events: &[Event],
    vocab: &StatusVocabulary,
    currently_blocked: bool,
) -> Vec<DataIssue> {
    let unclosed = |index: usize| {
        DataIssue::new(
            IssueKind::UnclosedBlock,
            format!(
                "block at event {index} ({}) is never resumed",
                events[index].status
            ),
        )
    };

    let mut issues = Vec::new();
    let mut open: Option<usize> = None;
    for (index, event) in events.iter().enumerate() {
        let class = vocab.classify(&event.status);
        if class == StatusClass::Blocked {
            if let Some(prev) = open.replace(index) {
                issues.push(unclosed(prev));
            }
        } else if class.resumes_work() {
            open = None;
        }
    }

    if let Some(last) = open
        && !currently_blocked
    {
        issues.push(unclosed(last));
    }
    issues
}

/// Consecutive events with the same status label.
#[must_use]
pub fn check_duplicate_statuses(events: &[Event]) -> Vec<DataIssue> {
    events
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0].status == pair[1].status)
        .map(|(i, pair)| {
            DataIssue::new(
                IssueKind::DuplicateStatus,
                format!("event {} repeats status '{}'", i + 1, pair[1].status),
            )
        })
        .collect()
}

/// A blocked ticket whose log ends in something other than a block.
#[must_use]
pub fn check_status_log_mismatch(
    events: &[Event],
    vocab: &StatusVocabulary,
    currently_blocked: bool,
) -> Option<DataIssue> {
    if !currently_blocked {
        return None;
    }
    let last = events.last()?;
    (vocab.classify(&last.status) != StatusClass::Blocked).then(|| {
        DataIssue::new(
            IssueKind::StatusLogMismatch,
            format!(
                "ticket is blocked but its last event is '{}'",
                last.status
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::EventOrigin;
    use chrono::{Duration, TimeZone, Utc};

    fn seq(statuses: &[&str]) -> Vec<Event> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        statuses
            .iter()
            .zip(0_i64..)
            .map(|(status, day)| Event {
                status: (*status).to_string(),
                timestamp: start + Duration::days(day),
                user: "ram".into(),
                blocked_by: None,
                note: None,
                reason: None,
                origin: EventOrigin::Observed,
            })
            .collect()
    }

    fn kinds(issues: &[DataIssue]) -> Vec<IssueKind> {
        issues.iter().map(|issue| issue.kind).collect()
    }

    fn vocab() -> StatusVocabulary {
        StatusVocabulary::default()
    }

    #[test]
    fn clean_sequence_has_no_issues() {
        let events = seq(&["In Progress", "Blocked", "In Progress", "Done"]);
        assert!(validate_sequence(&events, &vocab(), ValidationOptions::default()).is_empty());
    }

    #[test]
    fn reports_first_out_of_order_pair_only() {
        let mut events = seq(&["In Progress", "In Review", "QA", "Done", "Released"]);
        events.swap(1, 2);
        events.swap(3, 4);
        let issue = check_chronological(&events).unwrap();
        assert_eq!(issue.kind, IssueKind::NonChronological);
        assert!(issue.detail.starts_with("event 2"), "{}", issue.detail);

        let all = validate_sequence(&events, &vocab(), ValidationOptions::default());
        assert_eq!(
            all.iter()
                .filter(|i| i.kind == IssueKind::NonChronological)
                .count(),
            1
        );
    }

    #[test]
    fn block_followed_by_block_is_unclosed() {
        let events = seq(&["Blocked", "In Review", "Blocked", "Unblocked"]);
        let issues = check_closed_blocks(&events, &vocab(), false);
        assert_eq!(kinds(&issues), vec![IssueKind::UnclosedBlock]);
        assert!(issues[0].detail.contains("event 0"));
    }

    #[test]
    fn development_resumes_work() {
        let events = seq(&["Blocked", "In Development", "Blocked", "Resumed"]);
        assert!(check_closed_blocks(&events, &vocab(), false).is_empty());
    }

    #[test]
    fn trailing_block_is_exempt_only_while_blocked() {
        let events = seq(&["In Progress", "Blocked"]);
        assert!(check_closed_blocks(&events, &vocab(), true).is_empty());
        let issues = check_closed_blocks(&events, &vocab(), false);
        assert_eq!(kinds(&issues), vec![IssueKind::UnclosedBlock]);
        assert!(issues[0].detail.contains("event 1"));
    }

    #[test]
    fn currently_blocked_with_unrelated_last_event_is_not_unclosed() {
        let events = seq(&["Blocked", "In Progress", "In Review"]);
        assert!(check_closed_blocks(&events, &vocab(), true).is_empty());
        let mismatch = check_status_log_mismatch(&events, &vocab(), true).unwrap();
        assert_eq!(mismatch.kind, IssueKind::StatusLogMismatch);
        assert!(mismatch.detail.contains("In Review"));
    }

    #[test]
    fn mismatch_check_skips_empty_logs_and_unblocked_tickets() {
        assert!(check_status_log_mismatch(&[], &vocab(), true).is_none());
        let events = seq(&["In Progress"]);
        assert!(check_status_log_mismatch(&events, &vocab(), false).is_none());
        let events = seq(&["In Progress", "Blocked"]);
        assert!(check_status_log_mismatch(&events, &vocab(), true).is_none());
    }

    #[test]
    fn mismatch_check_can_be_disabled() {
        let events = seq(&["Blocked", "In Progress"]);
        let on = ValidationOptions {
            currently_blocked: true,
            flag_status_log_mismatch: true,
        };
        let off = ValidationOptions {
            flag_status_log_mismatch: false,
            ..on
        };
        assert_eq!(
            kinds(&validate_sequence(&events, &vocab(), on)),
            vec![IssueKind::StatusLogMismatch]
        );
        assert!(validate_sequence(&events, &vocab(), off).is_empty());
    }

    #[test]
    fn duplicates_report_index_of_second_event() {
        let events = seq(&["In Progress", "In Progress", "In Progress", "Done"]);
        let issues = check_duplicate_statuses(&events);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].detail.starts_with("event 1"));
        assert!(issues[1].detail.starts_with("event 2"));
    }
}
