//! Cross-ticket views folded from a batch of [`EnrichedTicket`]s.
//!
//! Everything here is a pure function of already-enriched tickets: the
//! per-ticket engine stays independent, and these summaries only count and
//! sum what it derived. Ordering is deterministic: ties break on name.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::{EnrichedTicket, UNKNOWN_ACTOR};
use crate::model::status::{StatusClass, StatusVocabulary};

/// Sprint bucket for tickets without a sprint.
pub const NO_SPRINT: &str = "No Sprint";
/// Blocker name for blocked tickets that do not say who blocks them.
pub const UNKNOWN_BLOCKER: &str = "Unknown";

// ---------------------------------------------------------------------------
// Blockers
// ---------------------------------------------------------------------------

/// Blocking totals for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockerStats {
    pub entity: String,
    /// Blocking episodes attributed to the entity.
    pub blocks: usize,
    /// Distinct tickets the entity blocked at least once.
    pub tickets: usize,
    pub blocked_hours: i64,
    /// Tickets the entity is blocking right now.
    pub active: usize,
}

/// Per-entity blocking totals, most blocked hours first.
///
/// A block still open counts as active for its entity. A ticket flagged
/// blocked without any recorded block counts as active for its blocker
/// field, or [`UNKNOWN_BLOCKER`].
#[must_use]
pub fn blockers(tickets: &[EnrichedTicket]) -> Vec<BlockerStats> {
    #[derive(Default)]
    struct Acc {
        blocks: usize,
        tickets: BTreeSet<usize>,
        hours: i64,
        active: usize,
    }

    let mut by_entity: BTreeMap<&str, Acc> = BTreeMap::new();
    for (index, ticket) in tickets.iter().enumerate() {
        for block in &ticket.blocks {
            let acc = by_entity.entry(block.blocked_by.as_str()).or_default();
            acc.blocks += 1;
            acc.tickets.insert(index);
            acc.hours += block.duration_hours;
            acc.active += usize::from(block.resumed_at.is_none() && ticket.is_blocked);
        }
        let recorded = ticket.blocks.iter().any(|b| b.resumed_at.is_none());
        if ticket.is_blocked && !recorded {
            let entity = ticket.blocked_by.as_deref().unwrap_or(UNKNOWN_BLOCKER);
            let acc = by_entity.entry(entity).or_default();
            acc.active += 1;
            acc.tickets.insert(index);
        }
    }

    let mut stats: Vec<BlockerStats> = by_entity
        .into_iter()
        .map(|(entity, acc)| BlockerStats {
            entity: entity.to_string(),
            blocks: acc.blocks,
            tickets: acc.tickets.len(),
            blocked_hours: acc.hours,
            active: acc.active,
        })
        .collect();
    // Stable sort keeps the name order among equal totals.
    stats.sort_by_key(|s| Reverse(s.blocked_hours));
    stats
}

// ---------------------------------------------------------------------------
// Sprints
// ---------------------------------------------------------------------------

/// Blocking and throughput summary for one sprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintStats {
    pub sprint: String,
    pub tickets: usize,
    /// Tickets currently blocked.
    pub blocked_tickets: usize,
    /// Tickets in a terminal status.
    pub closed: usize,
    pub blocked_hours: i64,
    pub development_hours: i64,
    /// Blocked hours as a whole percentage of development hours; `0` when
    /// the sprint has no development time.
    pub percent_blocked: i64,
    /// The entity blocking the most currently blocked tickets.
    pub most_frequent_blocker: Option<String>,
}

/// Per-sprint summaries in sprint-name order.
#[must_use]
pub fn sprints(tickets: &[EnrichedTicket]) -> Vec<SprintStats> {
    let mut groups: BTreeMap<&str, Vec<&EnrichedTicket>> = BTreeMap::new();
    for ticket in tickets {
        groups
            .entry(ticket.sprint.as_deref().unwrap_or(NO_SPRINT))
            .or_default()
            .push(ticket);
    }

    groups
        .into_iter()
        .map(|(sprint, members)| {
            let blocked_hours: i64 = members.iter().map(|t| t.durations.blocked_hours).sum();
            let development_hours: i64 =
                members.iter().map(|t| t.durations.development_hours).sum();
            let mut blocker_counts: BTreeMap<&str, usize> = BTreeMap::new();
            for ticket in members.iter().filter(|t| t.is_blocked) {
                *blocker_counts
                    .entry(ticket.blocked_by.as_deref().unwrap_or(UNKNOWN_BLOCKER))
                    .or_default() += 1;
            }
            SprintStats {
                sprint: sprint.to_string(),
                tickets: members.len(),
                blocked_tickets: members.iter().filter(|t| t.is_blocked).count(),
                closed: members.iter().filter(|t| t.is_terminal).count(),
                blocked_hours,
                development_hours,
                percent_blocked: percent(blocked_hours, development_hours),
                most_frequent_blocker: top_entry(&blocker_counts)
                    .map(|(name, _)| name.to_string()),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// People
// ---------------------------------------------------------------------------

/// Ownership and blocking totals for one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonStats {
    pub name: String,
    /// Tickets the person owns.
    pub tickets: usize,
    /// Owned tickets in a terminal status.
    pub resolved: usize,
    /// Development hours across owned tickets.
    pub development_hours: i64,
    /// Blocking episodes attributed to the person, on any ticket.
    pub blocks_caused: usize,
}

/// Per-person totals, most owned tickets first.
#[must_use]
pub fn people(tickets: &[EnrichedTicket]) -> Vec<PersonStats> {
    let mut by_name: BTreeMap<String, PersonStats> = BTreeMap::new();
    for ticket in tickets {
        if let Some(owner) = ticket.owner.as_deref() {
            let person = person_entry(&mut by_name, owner);
            person.tickets += 1;
            person.resolved += usize::from(ticket.is_terminal);
            person.development_hours += ticket.durations.development_hours;
        }
        for block in &ticket.blocks {
            if block.blocked_by != UNKNOWN_ACTOR {
                person_entry(&mut by_name, &block.blocked_by).blocks_caused += 1;
            }
        }
    }

    let mut stats: Vec<PersonStats> = by_name.into_values().collect();
    stats.sort_by_key(|s| Reverse(s.tickets));
    stats
}

fn person_entry<'m>(map: &'m mut BTreeMap<String, PersonStats>, name: &str) -> &'m mut PersonStats {
    map.entry(name.to_string()).or_insert_with(|| PersonStats {
        name: name.to_string(),
        tickets: 0,
        resolved: 0,
        development_hours: 0,
        blocks_caused: 0,
    })
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

/// A current block stands out above this multiple of the average current block.
pub const OUTLIER_FACTOR: f64 = 1.8;
/// Current blocks shorter than this never stand out.
pub const OUTLIER_MIN_HOURS: i64 = 24;
/// Cycle times above this are worth calling out.
pub const LONG_CYCLE_HOURS: i64 = 72;
/// Sprints need more tickets than this to be compared.
pub const SPRINT_MIN_TICKETS: usize = 3;
/// Sprint blocked share, in percent, worth calling out.
pub const SPRINT_BLOCKED_PERCENT: i64 = 30;
/// Window for counting resolved blocks.
pub const RESOLVER_WINDOW_DAYS: i64 = 7;

/// One noteworthy observation about the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    /// A current block far longer than the average current block.
    OutlierBlock {
        ticket: String,
        hours: i64,
        average_hours: i64,
    },
    /// The person who ended the most blocks in the last week.
    TopResolver {
        person: String,
        resolved: usize,
        /// Margin over the runner-up; `None` when nobody else resolved any.
        lead: Option<usize>,
    },
    /// The sprint with the largest share of currently blocked tickets.
    BlockedSprint { sprint: String, percent: i64 },
    /// The ticket with the longest creation-to-resolution time.
    LongestCycle { ticket: String, hours: i64 },
    /// The owner with the most currently blocked tickets.
    MostBlockedOwner { person: String, tickets: usize },
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutlierBlock {
                ticket,
                hours,
                average_hours,
            } => write!(
                f,
                "Ticket {ticket} has been blocked for {hours}h, against an average of {average_hours}h for blocked tickets."
            ),
            Self::TopResolver {
                person,
                resolved,
                lead,
            } => match lead {
                Some(lead) => write!(
                    f,
                    "{person} resolved {resolved} blocked ticket(s) this week, {lead} more than anyone else."
                ),
                None => write!(f, "{person} resolved {resolved} blocked ticket(s) this week."),
            },
            Self::BlockedSprint { sprint, percent } => write!(
                f,
                "Sprint \"{sprint}\" currently has {percent}% of its tickets blocked."
            ),
            Self::LongestCycle { ticket, hours } => write!(
                f,
                "Ticket {ticket} has the longest cycle time: {hours}h from creation to resolution."
            ),
            Self::MostBlockedOwner { person, tickets } => {
                write!(f, "{person} currently has {tickets} tickets blocked.")
            }
        }
    }
}

/// Derive insights for the batch as of `now`, in a fixed order.
#[must_use]
pub fn insights(
    tickets: &[EnrichedTicket],
    vocab: &StatusVocabulary,
    now: DateTime<Utc>,
) -> Vec<Insight> {
    [
        outlier_block(tickets),
        top_resolver(tickets, vocab, now),
        blocked_sprint(tickets),
        longest_cycle(tickets),
        most_blocked_owner(tickets),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn outlier_block(tickets: &[EnrichedTicket]) -> Option<Insight> {
    let current: Vec<(&EnrichedTicket, i64)> = tickets
        .iter()
        .filter(|t| t.is_blocked)
        .filter_map(|t| t.durations.current_block_duration_hours.map(|h| (t, h)))
        .collect();
    let (ticket, hours) = current
        .iter()
        .copied()
        .reduce(|best, next| if next.1 > best.1 { next } else { best })?;

    #[allow(clippy::cast_precision_loss)]
    let average = current.iter().map(|(_, h)| *h as f64).sum::<f64>() / current.len() as f64;
    #[allow(clippy::cast_precision_loss)]
    let outlier = (hours as f64) > average * OUTLIER_FACTOR && hours > OUTLIER_MIN_HOURS;
    #[allow(clippy::cast_possible_truncation)]
    let average_hours = average.round() as i64;
    outlier.then(|| Insight::OutlierBlock {
        ticket: ticket.display_id().to_string(),
        hours,
        average_hours,
    })
}

/// Counts transitions out of a Blocked-class status into one that resumes
/// work, made within the window before `now`.
fn top_resolver(
    tickets: &[EnrichedTicket],
    vocab: &StatusVocabulary,
    now: DateTime<Utc>,
) -> Option<Insight> {
    let since = now - Duration::days(RESOLVER_WINDOW_DAYS);
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for ticket in tickets {
        for transition in &ticket.transitions {
            let resolves = vocab.classify(&transition.from) == StatusClass::Blocked
                && vocab.classify(&transition.to).resumes_work();
            if resolves
                && transition.timestamp > since
                && transition.timestamp <= now
                && transition.by != UNKNOWN_ACTOR
            {
                *counts.entry(transition.by.as_str()).or_default() += 1;
            }
        }
    }

    let (person, resolved) = top_entry(&counts)?;
    let runner_up = counts
        .iter()
        .filter(|(name, _)| **name != person)
        .map(|(_, count)| *count)
        .max();
    match runner_up {
        Some(second) if second >= resolved => None,
        _ => Some(Insight::TopResolver {
            person: person.to_string(),
            resolved,
            lead: runner_up.map(|second| resolved - second),
        }),
    }
}

fn blocked_sprint(tickets: &[EnrichedTicket]) -> Option<Insight> {
    sprints(tickets)
        .into_iter()
        .filter(|s| s.tickets > SPRINT_MIN_TICKETS)
        .map(|s| {
            let share = percent(to_i64(s.blocked_tickets), to_i64(s.tickets));
            (s.sprint, share)
        })
        .fold(None, |best: Option<(String, i64)>, (sprint, share)| match best {
            Some((_, top)) if top >= share => best,
            _ => Some((sprint, share)),
        })
        .filter(|(_, share)| *share > SPRINT_BLOCKED_PERCENT)
        .map(|(sprint, percent)| Insight::BlockedSprint { sprint, percent })
}

fn longest_cycle(tickets: &[EnrichedTicket]) -> Option<Insight> {
    tickets
        .iter()
        .filter_map(|t| t.durations.total_cycle_time_hours.map(|h| (t, h)))
        .reduce(|best, next| if next.1 > best.1 { next } else { best })
        .filter(|(_, hours)| *hours > LONG_CYCLE_HOURS)
        .map(|(ticket, hours)| Insight::LongestCycle {
            ticket: ticket.display_id().to_string(),
            hours,
        })
}

fn most_blocked_owner(tickets: &[EnrichedTicket]) -> Option<Insight> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for ticket in tickets
        .iter()
        .filter(|t| t.is_blocked && t.durations.current_block_duration_hours.is_some())
    {
        *counts
            .entry(ticket.owner.as_deref().unwrap_or(UNKNOWN_ACTOR))
            .or_default() += 1;
    }
    top_entry(&counts)
        .filter(|(_, count)| *count > 1)
        .map(|(person, tickets)| Insight::MostBlockedOwner {
            person: person.to_string(),
            tickets,
        })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Highest count; the alphabetically first name wins a tie.
fn top_entry<'a>(counts: &BTreeMap<&'a str, usize>) -> Option<(&'a str, usize)> {
    counts
        .iter()
        .fold(None, |best: Option<(&str, usize)>, (name, count)| match best {
            Some((_, top)) if top >= *count => best,
            _ => Some((*name, *count)),
        })
}

/// `part / whole` as a whole percentage, half away from zero; `0` for an
/// empty whole.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn percent(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as i64
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
