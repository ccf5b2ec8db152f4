//! Non-fatal data-quality diagnostics.
//!
//! Every problem the engine detects in a ticket's source data becomes a
//! [`DataIssue`] appended to that ticket. Issues never abort enrichment; the
//! surrounding application decides how to surface them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of a data-quality issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The ticket has no usable `id`.
    MissingId,
    /// The ticket has no usable `title`.
    MissingTitle,
    /// The event-log payload is present but is not a JSON array.
    MalformedEventLog,
    /// An event-log entry is not an object or has no status.
    InvalidEvent,
    /// An event or ticket date field does not resolve to an instant.
    InvalidTimestamp,
    /// The final sequence is not in ascending timestamp order.
    NonChronological,
    /// A block is never followed by an unblock or resumed work.
    UnclosedBlock,
    /// Two consecutive events carry the identical status label.
    DuplicateStatus,
    /// The ticket is currently blocked but its log does not end blocked.
    StatusLogMismatch,
}

impl IssueKind {
    pub const ALL: [Self; 9] = [
        Self::MissingId,
        Self::MissingTitle,
        Self::MalformedEventLog,
        Self::InvalidEvent,
        Self::InvalidTimestamp,
        Self::NonChronological,
        Self::UnclosedBlock,
        Self::DuplicateStatus,
        Self::StatusLogMismatch,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingId => "missing_id",
            Self::MissingTitle => "missing_title",
            Self::MalformedEventLog => "malformed_event_log",
            Self::InvalidEvent => "invalid_event",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::NonChronological => "non_chronological",
            Self::UnclosedBlock => "unclosed_block",
            Self::DuplicateStatus => "duplicate_status",
            Self::StatusLogMismatch => "status_log_mismatch",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown issue kind string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown issue kind '{raw}'")]
pub struct UnknownIssueKind {
    pub raw: String,
}

impl FromStr for IssueKind {
    type Err = UnknownIssueKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownIssueKind { raw: s.to_string() })
    }
}

/// A structured, non-fatal diagnostic attached to one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataIssue {
    pub kind: IssueKind,
    pub detail: String,
}

impl DataIssue {
    pub fn new(kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn kind_strings_are_unique_and_roundtrip() {
        let mut seen = HashSet::new();
        for kind in IssueKind::ALL {
            assert!(seen.insert(kind.as_str()), "duplicate kind {kind}");
            assert_eq!(IssueKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn serde_matches_display() {
        for kind in IssueKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn issue_display_includes_kind_and_detail() {
        let issue = DataIssue::new(IssueKind::DuplicateStatus, "index 3 repeats 'QA'");
        assert_eq!(issue.to_string(), "duplicate_status: index 3 repeats 'QA'");
    }
}
