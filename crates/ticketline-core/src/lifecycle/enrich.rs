//! The ticket enricher: one raw ticket in, one [`EnrichedTicket`] out.
//!
//! Enrichment never fails. Anything wrong with a ticket is reported in
//! [`EnrichedTicket::issues`] alongside best-effort derived values.

use std::fmt;
use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TicketContext;
use super::durations::{DurationInput, Durations, compute_durations};
use super::history::{self, BlockRecord, StatusPhase, Transition};
use super::normalize::normalize_events;
use super::synthesize::synthesize_events;
use super::validate::{ValidationOptions, validate_sequence};
use crate::config::{ConfigError, ProjectConfig};
use crate::hours::{BusinessHours, WorkingHours};
use crate::model::event::Event;
use crate::model::fields::Field;
use crate::model::issue::{DataIssue, IssueKind};
use crate::model::status::{StatusClass, StatusVocabulary};
use crate::model::ticket::RawTicket;
use crate::time::TimestampParser;

// ---------------------------------------------------------------------------
// EnrichedTicket
// ---------------------------------------------------------------------------

/// A ticket with every derived field filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedTicket {
    pub id: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub owner: Option<String>,
    pub sprint: Option<String>,
    pub blocked_by: Option<String>,
    pub is_blocked: bool,
    pub is_terminal: bool,
    pub created_at: Option<DateTime<Utc>>,
    /// Explicit resolution date, or the final terminal event of a finished
    /// ticket when the source has none.
    pub resolved_at: Option<DateTime<Utc>>,
    pub block_started_at: Option<DateTime<Utc>>,
    pub unblocked_at: Option<DateTime<Utc>>,
    pub events: Vec<Event>,
    pub durations: Durations,
    pub phases: Vec<StatusPhase>,
    pub blocks: Vec<BlockRecord>,
    pub transitions: Vec<Transition>,
    pub handoffs: Vec<String>,
    pub issues: Vec<DataIssue>,
    /// The raw record, untouched.
    pub source: RawTicket,
}

impl EnrichedTicket {
    /// Id for display: the ticket id or `"?"`.
    #[must_use]
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or(super::UNKNOWN_ACTOR)
    }

    #[must_use]
    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|issue| issue.kind == kind)
    }

    #[must_use]
    pub fn synthesized_events(&self) -> usize {
        self.events.iter().filter(|event| event.is_synthesized()).count()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Configured lifecycle engine.
///
/// Holds no per-ticket state; one engine can enrich any number of tickets,
/// from any number of threads.
pub struct Engine {
    vocabulary: StatusVocabulary,
    parser: TimestampParser,
    hours: Box<dyn WorkingHours>,
    flag_status_log_mismatch: bool,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("vocabulary", &self.vocabulary)
            .field("parser", &self.parser)
            .field("hours", &self.hours.policy_name())
            .field("flag_status_log_mismatch", &self.flag_status_log_mismatch)
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(BusinessHours::standard())
    }
}

impl Engine {
    /// Engine with the default vocabulary and UTC source timestamps.
    pub fn new(hours: impl WorkingHours + 'static) -> Self {
        Self {
            vocabulary: StatusVocabulary::default(),
            parser: TimestampParser::default(),
            hours: Box::new(hours),
            flag_status_log_mismatch: true,
        }
    }

    /// Build an engine from project configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the `[hours]` section is invalid.
    pub fn from_config(config: &ProjectConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            vocabulary: config.vocabulary()?,
            parser: config.hours.timestamp_parser()?,
            hours: config.hours.build_strategy()?,
            flag_status_log_mismatch: config.validation.flag_status_log_mismatch,
        })
    }

    #[must_use]
    pub fn with_vocabulary(mut self, vocabulary: StatusVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    #[must_use]
    pub const fn with_timestamp_parser(mut self, parser: TimestampParser) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub const fn with_status_log_mismatch(mut self, enabled: bool) -> Self {
        self.flag_status_log_mismatch = enabled;
        self
    }

    #[must_use]
    pub const fn vocabulary(&self) -> &StatusVocabulary {
        &self.vocabulary
    }

    #[must_use]
    pub fn hours(&self) -> &dyn WorkingHours {
        self.hours.as_ref()
    }

    /// Derive the full lifecycle picture of one ticket as of `now`.
    #[must_use]
    pub fn enrich(&self, raw: &RawTicket, now: DateTime<Utc>) -> EnrichedTicket {
        let vocab = &self.vocabulary;
        let mut issues = Vec::new();

        let id = raw.text(Field::Id);
        if id.is_none() {
            issues.push(DataIssue::new(IssueKind::MissingId, "ticket has no id"));
        }
        let title = raw.text(Field::Title);
        if title.is_none() {
            issues.push(DataIssue::new(IssueKind::MissingTitle, "ticket has no title"));
        }
        let status = raw.text(Field::Status);
        let owner = raw.name(Field::Owner);
        let sprint = raw.name(Field::Sprint);
        let blocked_by = raw.name(Field::BlockedBy);

        let created_at = self.ticket_date(raw, Field::Created, &mut issues);
        let explicit_resolved = self.ticket_date(raw, Field::Resolved, &mut issues);
        let block_started_at = self.ticket_date(raw, Field::BlockStarted, &mut issues);
        let unblocked_at = self.ticket_date(raw, Field::Unblocked, &mut issues);

        let ctx = TicketContext {
            owner: owner.clone(),
            blocked_by: blocked_by.clone(),
            block_started_at,
            unblocked_at,
        };

        let normalized = normalize_events(raw.get(Field::EventLog), &ctx, vocab, &self.parser);
        issues.extend(normalized.issues);
        let events = synthesize_events(normalized.events, &ctx, vocab);

        let status_class = status.as_deref().map(|label| vocab.classify(label));
        let is_blocked = raw.blocked_flag() || status_class == Some(StatusClass::Blocked);
        let is_terminal = status_class
            .or_else(|| events.last().map(|event| vocab.classify(&event.status)))
            == Some(StatusClass::Terminal);
        // An unusable resolution field stays unset rather than falling back.
        let resolved_at = if raw.get(Field::Resolved).is_some() {
            explicit_resolved
        } else {
            events
                .last()
                .filter(|last| is_terminal && vocab.classify(&last.status) == StatusClass::Terminal)
                .map(|last| last.timestamp)
        };

        issues.extend(validate_sequence(
            &events,
            vocab,
            ValidationOptions {
                currently_blocked: is_blocked,
                flag_status_log_mismatch: self.flag_status_log_mismatch,
            },
        ));

        let hours = self.hours.as_ref();
        let durations = compute_durations(
            &DurationInput {
                events: &events,
                is_terminal,
                currently_blocked: is_blocked,
                created_at,
                resolved_at,
                block_started_at,
                now,
            },
            vocab,
            hours,
        );
        let phases = history::status_phases(&events, is_terminal, now, hours);
        let blocks = history::block_log(&events, vocab, now, hours);
        let transitions = history::transitions(&events);
        let handoffs = history::handoffs(&events);

        debug!(
            id = id.as_deref().unwrap_or("?"),
            events = events.len(),
            issues = issues.len(),
            blocked = is_blocked,
            terminal = is_terminal,
            "enriched ticket"
        );

        EnrichedTicket {
            id,
            title,
            status,
            owner,
            sprint,
            blocked_by,
            is_blocked,
            is_terminal,
            created_at,
            resolved_at,
            block_started_at,
            unblocked_at,
            events,
            durations,
            phases,
            blocks,
            transitions,
            handoffs,
            issues,
            source: raw.clone(),
        }
    }

    /// Enrich every ticket sequentially, in input order.
    #[must_use]
    pub fn enrich_all(&self, raws: &[RawTicket], now: DateTime<Utc>) -> Vec<EnrichedTicket> {
        raws.iter().map(|raw| self.enrich(raw, now)).collect()
    }

    /// Enrich tickets on up to `workers` scoped threads.
    ///
    /// Tickets are split into contiguous chunks, so the output order matches
    /// the input order and equals [`Engine::enrich_all`] for the same `now`.
    #[must_use]
    pub fn enrich_parallel(
        &self,
        raws: &[RawTicket],
        now: DateTime<Utc>,
        workers: NonZeroUsize,
    ) -> Vec<EnrichedTicket> {
        let chunk_size = raws.len().div_ceil(workers.get()).max(1);
        if chunk_size >= raws.len() {
            return self.enrich_all(raws, now);
        }

        debug!(tickets = raws.len(), workers = workers.get(), chunk_size, "parallel enrichment");
        std::thread::scope(|scope| {
            let handles: Vec<_> = raws
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || self.enrich_all(chunk, now)))
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        })
    }

    /// Parse one ticket-level date; an unusable value becomes an issue.
    fn ticket_date(
        &self,
        raw: &RawTicket,
        field: Field,
        issues: &mut Vec<DataIssue>,
    ) -> Option<DateTime<Utc>> {
        let value = raw.get(field)?;
        match self.parser.parse_value(value) {
            Ok(instant) => Some(instant),
            Err(err) => {
                issues.push(DataIssue::new(
                    IssueKind::InvalidTimestamp,
                    format!("{field}: {err}"),
                ));
                None
            }
        }
    }
}
