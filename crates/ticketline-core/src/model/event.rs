use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOrigin {
    /// Present in the ticket's own event log.
    Observed,
    /// Inserted by the engine to reconcile explicit ticket fields.
    Synthesized,
}

impl EventOrigin {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Observed => "observed",
            Self::Synthesized => "synthesized",
        }
    }
}

impl fmt::Display for EventOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped lifecycle entry belonging to a single ticket.
///
/// Events are built once by the normalizer or synthesizer and are not
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Status label as spelled in the source (or the canonical label for
    /// synthesized events).
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// Actor the entry is attributed to; `"?"` when unknown.
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub origin: EventOrigin,
}

impl Event {
    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        self.origin == EventOrigin::Synthesized
    }

    /// Free-text explanation, preferring `reason` over `note`.
    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.reason.as_deref().or(self.note.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(origin: EventOrigin) -> Event {
        Event {
            status: "Blocked".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
            user: "ram".into(),
            blocked_by: Some("ssr".into()),
            note: Some("waiting on API keys".into()),
            reason: None,
            origin,
        }
    }

    #[test]
    fn synthesized_marker_is_visible_in_json() {
        let json = serde_json::to_value(event(EventOrigin::Synthesized)).unwrap();
        assert_eq!(json["origin"], "synthesized");
        assert_eq!(json["blocked_by"], "ssr");
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn explanation_prefers_reason() {
        let mut e = event(EventOrigin::Observed);
        assert_eq!(e.explanation(), Some("waiting on API keys"));
        e.reason = Some("vendor outage".into());
        assert_eq!(e.explanation(), Some("vendor outage"));
        assert!(!e.is_synthesized());
    }
}
