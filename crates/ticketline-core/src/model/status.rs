//! Status label classification.
//!
//! Source systems spell statuses freely ("In Progress", "in development",
//! "Blocked for Clarification"). The engine only cares which *class* a label
//! falls into: that decides timestamp overrides, synthesis matching, block
//! closure, and which duration bucket a phase is attributed to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The lifecycle class of a status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    /// Work is blocked on someone or something.
    Blocked,
    /// An explicit unblock / "resumed work" marker.
    Unblocked,
    /// Active development.
    Development,
    /// Code or technical review.
    Review,
    /// Quality assurance / business acceptance.
    Qa,
    /// Finished (done, deployed, released).
    Terminal,
    /// Anything the vocabulary does not track (backlog, to do, ...).
    Other,
}

impl StatusClass {
    /// All classes in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Blocked,
        Self::Unblocked,
        Self::Development,
        Self::Review,
        Self::Qa,
        Self::Terminal,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocked => "blocked",
            Self::Unblocked => "unblocked",
            Self::Development => "development",
            Self::Review => "review",
            Self::Qa => "qa",
            Self::Terminal => "terminal",
            Self::Other => "other",
        }
    }

    /// Whether an event of this class closes an open block.
    ///
    /// An explicit unblock does, and so does moving back into development.
    #[must_use]
    pub const fn resumes_work(self) -> bool {
        matches!(self, Self::Unblocked | Self::Development)
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status class name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status class '{raw}'")]
pub struct UnknownStatusClass {
    pub raw: String,
}

impl FromStr for StatusClass {
    type Err = UnknownStatusClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatusClass { raw: s.to_string() })
    }
}

/// Label lists that map free-form status text onto [`StatusClass`].
///
/// Matching is case-insensitive and ignores surrounding and repeated
/// whitespace. The first label of `blocked` / `unblocked` is the spelling
/// used for synthesized events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusVocabulary {
    pub blocked: Vec<String>,
    pub unblocked: Vec<String>,
    pub development: Vec<String>,
    pub review: Vec<String>,
    pub qa: Vec<String>,
    pub terminal: Vec<String>,
}

impl Default for StatusVocabulary {
    fn default() -> Self {
        fn labels(items: &[&str]) -> Vec<String> {
            items.iter().map(ToString::to_string).collect()
        }

        Self {
            blocked: labels(&["Blocked", "Blocked for Clarification"]),
            unblocked: labels(&["Unblocked", "Resumed", "Resumed Work"]),
            development: labels(&["In Progress", "In Development"]),
            review: labels(&["In Review", "Code Review", "Tech QC"]),
            qa: labels(&["QA", "In QA", "Business QC"]),
            terminal: labels(&["Done", "Deployed", "Released"]),
        }
    }
}

impl StatusVocabulary {
    /// Classify a raw status label.
    #[must_use]
    pub fn classify(&self, label: &str) -> StatusClass {
        let key = normalize_label(label);
        if key.is_empty() {
            return StatusClass::Other;
        }

        let lists = [
            (&self.blocked, StatusClass::Blocked),
            (&self.unblocked, StatusClass::Unblocked),
            (&self.development, StatusClass::Development),
            (&self.review, StatusClass::Review),
            (&self.qa, StatusClass::Qa),
            (&self.terminal, StatusClass::Terminal),
        ];

        lists
            .into_iter()
            .find(|(list, _)| list.iter().any(|candidate| normalize_label(candidate) == key))
            .map_or(StatusClass::Other, |(_, class)| class)
    }

    /// Label written on synthesized block events.
    #[must_use]
    pub fn canonical_blocked(&self) -> &str {
        self.blocked.first().map_or("Blocked", String::as_str)
    }

    /// Label written on synthesized unblock events.
    #[must_use]
    pub fn canonical_unblocked(&self) -> &str {
        self.unblocked.first().map_or("Unblocked", String::as_str)
    }
}

/// Lower-case, trim, and collapse internal whitespace runs.
fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
