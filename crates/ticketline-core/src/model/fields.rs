//! First-match-wins alias resolution for source ticket fields.
//!
//! Ticket exports have renamed their columns over time (`closedOn`,
//! `Resolved_On`, `resolved_at`, ...). Each semantic [`Field`] owns one
//! ordered alias list; resolution walks it and returns the first alias that
//! is present with a usable value. There is no other fallback logic.

use serde_json::{Map, Value};
use std::fmt;

/// A semantic ticket field with its ordered list of accepted source names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Title,
    Status,
    Owner,
    Sprint,
    Blocked,
    BlockedBy,
    Created,
    Resolved,
    BlockStarted,
    Unblocked,
    EventLog,
}

impl Field {
    pub const ALL: [Self; 12] = [
        Self::Id,
        Self::Title,
        Self::Status,
        Self::Owner,
        Self::Sprint,
        Self::Blocked,
        Self::BlockedBy,
        Self::Created,
        Self::Resolved,
        Self::BlockStarted,
        Self::Unblocked,
        Self::EventLog,
    ];

    /// Source names accepted for this field, highest priority first.
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Id => &["id", "ID", "key", "ticketId"],
            Self::Title => &["title", "Title", "summary"],
            Self::Status => &["status", "Status", "state"],
            Self::Owner => &["owner", "ownerName", "Owner", "assignee"],
            Self::Sprint => &["sprintName", "sprint", "Sprint"],
            Self::Blocked => &["blocked", "isBlocked", "Blocked"],
            Self::BlockedBy => &["blockedBy", "Blocked_By", "blocked_by"],
            Self::Created => &[
                "createdOn",
                "Created_On",
                "Created_On_Date",
                "created_at",
                "createdAt",
            ],
            Self::Resolved => &[
                "closedOn",
                "Closed_On",
                "resolvedOn",
                "Resolved_On",
                "resolved_at",
                "resolvedAt",
            ],
            Self::BlockStarted => &["Blocked_Since", "blockedSince", "blocked_since"],
            Self::Unblocked => &["Unblocked_At", "unblockedAt", "unblocked_at"],
            Self::EventLog => &["Event_Log", "eventLog", "event_log", "events"],
        }
    }

    /// Canonical name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Status => "status",
            Self::Owner => "owner",
            Self::Sprint => "sprint",
            Self::Blocked => "blocked",
            Self::BlockedBy => "blocked_by",
            Self::Created => "created",
            Self::Resolved => "resolved",
            Self::BlockStarted => "block_started",
            Self::Unblocked => "unblocked",
            Self::EventLog => "event_log",
        }
    }

    /// Resolve this field against a source record.
    ///
    /// Returns the matching alias and its value.
    #[must_use]
    pub fn resolve(self, record: &Map<String, Value>) -> Option<(&'static str, &Value)> {
        first_present(record, self.aliases())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Return the first key in `keys` whose value is present and not blank.
///
/// `null` and whitespace-only strings count as absent, so an empty CSV
/// column never shadows a populated alias further down the list.
#[must_use]
pub fn first_present<'r>(
    record: &'r Map<String, Value>,
    keys: &[&'static str],
) -> Option<(&'static str, &'r Value)> {
    keys.iter().find_map(|&key| {
        record
            .get(key)
            .filter(|value| !is_blank(value))
            .map(|value| (key, value))
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Render a scalar value as trimmed text.
///
/// Numbers and booleans are stringified (CSV-derived ids are often numeric);
/// arrays and objects are not text.
#[must_use]
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Interpret a boolean-like value.
///
/// Strings `true/yes/y/1` (any case) and non-zero numbers are true;
/// everything else is false.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1"
        ),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// Trim and collapse internal whitespace; `None` when nothing is left.
#[must_use]
pub fn normalize_name(raw: &str) -> Option<String> {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}
