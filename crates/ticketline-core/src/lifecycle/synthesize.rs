//! Repair events inferred from explicit ticket fields.
//!
//! A ticket may say "blocked since X" or "unblocked at Y" without its log
//! recording either. The synthesizer inserts the missing event, marked as
//! synthesized, so downstream durations see the block. Matching is exact on
//! the instant, which makes the step idempotent.

use chrono::{DateTime, Utc};
use tracing::trace;

use super::TicketContext;
use crate::model::event::{Event, EventOrigin};
use crate::model::status::{StatusClass, StatusVocabulary};

/// Note attached to events inferred from the block-start field.
pub const BLOCK_START_NOTE: &str = "synthesized from block start";
/// Note attached to events inferred from the unblock field.
pub const UNBLOCK_NOTE: &str = "synthesized from unblock time";

/// Add missing block/unblock events and return the sequence sorted by time.
///
/// The sort is stable: events sharing an instant keep their relative order,
/// with synthesized events after observed ones.
#[must_use]
pub fn synthesize_events(
    mut events: Vec<Event>,
    ctx: &TicketContext,
    vocab: &StatusVocabulary,
) -> Vec<Event> {
    let has_event_at = |events: &[Event], class: StatusClass, at: DateTime<Utc>| {
        events
            .iter()
            .any(|event| event.timestamp == at && vocab.classify(&event.status) == class)
    };

    if let Some(at) = ctx.block_started_at
        && !has_event_at(&events, StatusClass::Blocked, at)
    {
        let actor = ctx.block_actor().to_string();
        trace!(%at, blocked_by = %actor, "synthesizing block event");
        events.push(Event {
            status: vocab.canonical_blocked().to_string(),
            timestamp: at,
            user: actor.clone(),
            blocked_by: Some(actor),
            note: Some(BLOCK_START_NOTE.to_string()),
            reason: None,
            origin: EventOrigin::Synthesized,
        });
    }

    if let Some(at) = ctx.unblocked_at
        && !has_event_at(&events, StatusClass::Unblocked, at)
    {
        trace!(%at, "synthesizing unblock event");
        events.push(Event {
            status: vocab.canonical_unblocked().to_string(),
            timestamp: at,
            user: ctx.owner_actor().to_string(),
            blocked_by: None,
            note: Some(UNBLOCK_NOTE.to_string()),
            reason: None,
            origin: EventOrigin::Synthesized,
        });
    }

    events.sort_by_key(|event| event.timestamp);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    fn observed(status: &str, at: DateTime<Utc>) -> Event {
        Event {
            status: status.into(),
            timestamp: at,
            user: "ram".into(),
            blocked_by: None,
            note: None,
            reason: None,
            origin: EventOrigin::Observed,
        }
    }

    #[test]
    fn nothing_to_do_without_explicit_fields() {
        let events = vec![
            observed("Done", utc(2024, 1, 3, 9)),
            observed("In Progress", utc(2024, 1, 1, 9)),
        ];
        let out = synthesize_events(events, &TicketContext::default(), &StatusVocabulary::default());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].status, "In Progress");
    }

    #[test]
    fn inserts_missing_block_event_in_order() {
        let ctx = TicketContext {
            owner: Some("ram".into()),
            blocked_by: Some("ssr".into()),
            block_started_at: Some(utc(2024, 2, 1, 0)),
            ..TicketContext::default()
        };
        let events = vec![
            observed("In Progress", utc(2024, 1, 30, 9)),
            observed("In Review", utc(2024, 2, 2, 9)),
        ];
        let out = synthesize_events(events, &ctx, &StatusVocabulary::default());
        assert_eq!(out.len(), 3);
        let block = &out[1];
        assert_eq!(block.status, "Blocked");
        assert_eq!(block.timestamp, utc(2024, 2, 1, 0));
        assert_eq!(block.user, "ssr");
        assert_eq!(block.blocked_by.as_deref(), Some("ssr"));
        assert_eq!(block.note.as_deref(), Some(BLOCK_START_NOTE));
        assert!(block.is_synthesized());
    }

    #[test]
    fn inserts_missing_unblock_event_attributed_to_owner() {
        let ctx = TicketContext {
            owner: Some("ram".into()),
            blocked_by: Some("ssr".into()),
            unblocked_at: Some(utc(2024, 2, 3, 0)),
            ..TicketContext::default()
        };
        let out = synthesize_events(Vec::new(), &ctx, &StatusVocabulary::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].status, "Unblocked");
        assert_eq!(out[0].user, "ram");
        assert_eq!(out[0].blocked_by, None);
        assert_eq!(out[0].note.as_deref(), Some(UNBLOCK_NOTE));
    }

    #[test]
    fn matching_event_at_same_instant_suppresses_synthesis() {
        let ctx = TicketContext {
            block_started_at: Some(utc(2024, 2, 1, 0)),
            ..TicketContext::default()
        };
        let events = vec![observed("blocked for clarification", utc(2024, 2, 1, 0))];
        let out = synthesize_events(events, &ctx, &StatusVocabulary::default());
        assert_eq!(out.len(), 1);
        assert!(!out[0].is_synthesized());
    }

    #[test]
    fn block_event_at_other_instant_does_not_count() {
        let ctx = TicketContext {
            block_started_at: Some(utc(2024, 2, 1, 0)),
            ..TicketContext::default()
        };
        let events = vec![observed("Blocked", utc(2024, 2, 1, 1))];
        let out = synthesize_events(events, &ctx, &StatusVocabulary::default());
        assert_eq!(out.len(), 2);
        assert!(out[0].is_synthesized());
        assert_eq!(out[0].user, "?");
    }

    #[test]
    fn synthesis_is_idempotent() {
        let ctx = TicketContext {
            owner: Some("ram".into()),
            block_started_at: Some(utc(2024, 2, 1, 0)),
            unblocked_at: Some(utc(2024, 2, 2, 0)),
            ..TicketContext::default()
        };
        let vocab = StatusVocabulary::default();
        let once = synthesize_events(vec![observed("In Progress", utc(2024, 1, 1, 9))], &ctx, &vocab);
        let twice = synthesize_events(once.clone(), &ctx, &vocab);
        assert_eq!(once.len(), 3);
        assert_eq!(once, twice);
    }

    #[test]
    fn sort_is_stable_for_equal_instants() {
        let at = utc(2024, 1, 1, 9);
        let events = vec![observed("In Progress", at), observed("In Review", at)];
        let out = synthesize_events(events, &TicketContext::default(), &StatusVocabulary::default());
        assert_eq!(out[0].status, "In Progress");
        assert_eq!(out[1].status, "In Review");
    }
}
