//! Event-log payload parsing.
//!
//! The payload arrives either as a JSON string (CSV exports embed the log as
//! text) or as an already structured array. Nothing here fails: a payload
//! that cannot be used becomes a data issue and an empty sequence.

use serde_json::{Map, Value};

use super::TicketContext;
use crate::model::event::{Event, EventOrigin};
use crate::model::fields::{first_present, value_text};
use crate::model::issue::{DataIssue, IssueKind};
use crate::model::status::{StatusClass, StatusVocabulary};
use crate::time::TimestampParser;

const STATUS_KEYS: &[&str] = &["status"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "time", "at"];
const USER_KEYS: &[&str] = &["user", "by", "actor", "owner"];
const BLOCKED_BY_KEYS: &[&str] = &["blockedBy", "blocked_by"];
const NOTE_KEYS: &[&str] = &["note"];
const REASON_KEYS: &[&str] = &["reason"];

/// Events recovered from a payload, in source order, plus what was wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub events: Vec<Event>,
    pub issues: Vec<DataIssue>,
}

/// Parse a ticket's event-log payload into typed events.
///
/// Blocked-class entries take the ticket's explicit block start as their
/// timestamp when one exists, and Unblocked-class entries take the explicit
/// unblock time; every other entry uses its own timestamp.
#[must_use]
pub fn normalize_events(
    payload: Option<&Value>,
    ctx: &TicketContext,
    vocab: &StatusVocabulary,
    parser: &TimestampParser,
) -> Normalized {
    let mut out = Normalized::default();

    let entries = match payload {
        None | Some(Value::Null) => return out,
        Some(Value::String(text)) if text.trim().is_empty() => return out,
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(entries)) => entries,
            Ok(other) => {
                out.issues.push(malformed(&format!(
                    "event log parsed as {} instead of an array",
                    json_kind(&other)
                )));
                return out;
            }
            Err(err) => {
                out.issues
                    .push(malformed(&format!("event log is not valid JSON: {err}")));
                return out;
            }
        },
        Some(Value::Array(entries)) => entries.clone(),
        Some(other) => {
            out.issues.push(malformed(&format!(
                "event log is {} instead of an array",
                json_kind(other)
            )));
            return out;
        }
    };

    for (index, entry) in entries.iter().enumerate() {
        match normalize_entry(index, entry, ctx, vocab, parser) {
            Ok(event) => out.events.push(event),
            Err(issue) => out.issues.push(issue),
        }
    }

    out
}

fn normalize_entry(
    index: usize,
    entry: &Value,
    ctx: &TicketContext,
    vocab: &StatusVocabulary,
    parser: &TimestampParser,
) -> Result<Event, DataIssue> {
    let Value::Object(fields) = entry else {
        return Err(DataIssue::new(
            IssueKind::InvalidEvent,
            format!("entry {index} is {} instead of an object", json_kind(entry)),
        ));
    };

    let status = text_of(fields, STATUS_KEYS).ok_or_else(|| {
        DataIssue::new(
            IssueKind::InvalidEvent,
            format!("entry {index} has no status"),
        )
    })?;
    let class = vocab.classify(&status);

    let timestamp = match (class, ctx.block_started_at, ctx.unblocked_at) {
        (StatusClass::Blocked, Some(at), _) | (StatusClass::Unblocked, _, Some(at)) => at,
        _ => {
            let (_, raw) = first_present(fields, TIMESTAMP_KEYS).ok_or_else(|| {
                DataIssue::new(
                    IssueKind::InvalidTimestamp,
                    format!("entry {index} ({status}) has no timestamp"),
                )
            })?;
            parser.parse_value(raw).map_err(|err| {
                DataIssue::new(
                    IssueKind::InvalidTimestamp,
                    format!("entry {index} ({status}): {err}"),
                )
            })?
        }
    };

    let user = text_of(fields, USER_KEYS).unwrap_or_else(|| {
        if class == StatusClass::Blocked {
            ctx.block_actor().to_string()
        } else {
            ctx.owner_actor().to_string()
        }
    });

    let blocked_by = text_of(fields, BLOCKED_BY_KEYS)
        .or_else(|| (class == StatusClass::Blocked).then(|| user.clone()));

    Ok(Event {
        status,
        timestamp,
        user,
        blocked_by,
        note: text_of(fields, NOTE_KEYS),
        reason: text_of(fields, REASON_KEYS),
        origin: EventOrigin::Observed,
    })
}

fn text_of(fields: &Map<String, Value>, keys: &[&'static str]) -> Option<String> {
    first_present(fields, keys).and_then(|(_, value)| value_text(value))
}

fn malformed(detail: &str) -> DataIssue {
    DataIssue::new(IssueKind::MalformedEventLog, detail)
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
