//! Per-ticket lifecycle derivation.
//!
//! The pipeline for one ticket is strictly sequential and shares nothing
//! with other tickets:
//!
//! 1. [`normalize`]: raw event-log payload into typed [`Event`]s.
//! 2. [`synthesize`]: reconcile explicit block/unblock fields with the log.
//! 3. [`validate`]: structural checks, emitted as data issues.
//! 4. [`durations`]: fold the sequence into per-bucket hours.
//! 5. [`history`]: phases, blocker log, transitions, handoffs.
//!
//! [`Engine`] wires the steps together and owns the configuration.
//!
//! [`Event`]: crate::model::event::Event

pub mod durations;
pub mod enrich;
pub mod history;
pub mod normalize;
pub mod synthesize;
pub mod validate;

use chrono::{DateTime, Utc};

pub use enrich::{Engine, EnrichedTicket};

/// Actor recorded when nobody can be attributed.
pub const UNKNOWN_ACTOR: &str = "?";

/// Explicit ticket fields the event steps reconcile against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketContext {
    pub owner: Option<String>,
    pub blocked_by: Option<String>,
    pub block_started_at: Option<DateTime<Utc>>,
    pub unblocked_at: Option<DateTime<Utc>>,
}

impl TicketContext {
    /// Who a block is attributed to: the blocker, else the owner.
    #[must_use]
    pub fn block_actor(&self) -> &str {
        self.blocked_by
            .as_deref()
            .or(self.owner.as_deref())
            .unwrap_or(UNKNOWN_ACTOR)
    }

    /// Who everything else is attributed to.
    #[must_use]
    pub fn owner_actor(&self) -> &str {
        self.owner.as_deref().unwrap_or(UNKNOWN_ACTOR)
    }
}
