//! Read-only views over a final event sequence: status phases, the blocker
//! log, status transitions, and ownership handoffs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::durations::{elapsed, round_hours};
use crate::hours::WorkingHours;
use crate::model::event::Event;
use crate::model::status::{StatusClass, StatusVocabulary};

/// A contiguous stretch during which the ticket held one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPhase {
    pub status: String,
    pub start: DateTime<Utc>,
    /// `None` only for the final phase of a finished ticket.
    pub end: Option<DateTime<Utc>>,
    /// Actor of the event that opened the phase.
    pub by: String,
    pub duration_hours: Option<i64>,
}

/// One blocking episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub blocked_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub since: DateTime<Utc>,
    /// `None` while the block is still open.
    pub resumed_at: Option<DateTime<Utc>>,
    pub duration_hours: i64,
}

/// A change of status label between two consecutive events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub timestamp: DateTime<Utc>,
    pub from: String,
    pub to: String,
    pub by: String,
}

/// Collapse runs of identical statuses into phases.
#[must_use]
pub fn status_phases(
    events: &[Event],
    is_terminal: bool,
    now: DateTime<Utc>,
    hours: &dyn WorkingHours,
) -> Vec<StatusPhase> {
    let starts: Vec<&Event> = events
        .iter()
        .enumerate()
        .filter(|(i, event)| *i == 0 || events[i - 1].status != event.status)
        .map(|(_, event)| event)
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, first)| {
            let end = starts
                .get(i + 1)
                .map(|next| next.timestamp)
                .or((!is_terminal).then_some(now));
            StatusPhase {
                status: first.status.clone(),
                start: first.timestamp,
                end,
                by: first.user.clone(),
                duration_hours: end.map(|end| round_hours(elapsed(hours, first.timestamp, end))),
            }
        })
        .collect()
}

/// Pair each block with the event that ended it.
///
/// Consecutive Blocked-class events extend one block; the first event of
/// any other class closes it.
#[must_use]
pub fn block_log(
    events: &[Event],
    vocab: &StatusVocabulary,
    now: DateTime<Utc>,
    hours: &dyn WorkingHours,
) -> Vec<BlockRecord> {
    let mut records = Vec::new();
    let mut open: Option<&Event> = None;

    for event in events {
        let blocked = vocab.classify(&event.status) == StatusClass::Blocked;
        match (open, blocked) {
            (None, true) => open = Some(event),
            (Some(start), false) => {
                records.push(close_block(start, Some(event.timestamp), now, hours));
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        records.push(close_block(start, None, now, hours));
    }
    records
}

fn close_block(
    start: &Event,
    resumed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    hours: &dyn WorkingHours,
) -> BlockRecord {
    let until = resumed_at.unwrap_or(now);
    BlockRecord {
        blocked_by: start.blocked_by.clone().unwrap_or_else(|| start.user.clone()),
        reason: start.explanation().map(ToString::to_string),
        since: start.timestamp,
        resumed_at,
        duration_hours: round_hours(elapsed(hours, start.timestamp, until)),
    }
}

/// Every change of status label, attributed to the actor of the later event.
#[must_use]
pub fn transitions(events: &[Event]) -> Vec<Transition> {
    events
        .windows(2)
        .filter(|pair| pair[0].status != pair[1].status)
        .map(|pair| Transition {
            timestamp: pair[1].timestamp,
            from: pair[0].status.clone(),
            to: pair[1].status.clone(),
            by: pair[1].user.clone(),
        })
        .collect()
}

/// Distinct known actors in order of first appearance.
#[must_use]
pub fn handoffs(events: &[Event]) -> Vec<String> {
    let mut actors: Vec<String> = Vec::new();
    for event in events {
        if event.user != super::UNKNOWN_ACTOR && !actors.contains(&event.user) {
            actors.push(event.user.clone());
        }
    }
    actors
}
