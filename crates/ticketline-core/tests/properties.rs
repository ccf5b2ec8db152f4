use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use std::num::NonZeroUsize;
use ticketline_core::hours::WallClock;
use ticketline_core::lifecycle::synthesize::synthesize_events;
use ticketline_core::lifecycle::{Engine, EnrichedTicket, TicketContext};
use ticketline_core::model::issue::IssueKind;
use ticketline_core::model::status::{StatusClass, StatusVocabulary};

use generators::*;

fn now() -> DateTime<Utc> {
    base() + Duration::days(45)
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn enrichment_is_deterministic(raw in arb_ticket()) {
        let engine = Engine::new(WallClock);
        prop_assert_eq!(engine.enrich(&raw, now()), engine.enrich(&raw, now()));
    }

    #[test]
    fn synthesis_adds_nothing_the_second_time(
        raw in arb_ticket(),
        block in prop::option::of(0i64..1000),
        unblock in prop::option::of(0i64..1000),
    ) {
        let vocab = StatusVocabulary::default();
        let enriched = Engine::new(WallClock).enrich(&raw, now());
        let ctx = TicketContext {
            owner: enriched.owner.clone(),
            blocked_by: enriched.blocked_by.clone(),
            block_started_at: block.map(|m| base() + Duration::minutes(m)),
            unblocked_at: unblock.map(|m| base() + Duration::minutes(m)),
        };
        let once = synthesize_events(enriched.events, &ctx, &vocab);
        let twice = synthesize_events(once.clone(), &ctx, &vocab);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn events_come_out_sorted(raw in arb_ticket()) {
        let enriched = Engine::new(WallClock).enrich(&raw, now());
        prop_assert!(enriched.events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        prop_assert!(!enriched.has_issue(IssueKind::NonChronological));
    }

    #[test]
    fn tracked_buckets_conserve_elapsed_time(raw in arb_tracked_ticket()) {
        let enriched = Engine::new(WallClock).enrich(&raw, now());
        let first = enriched.events.first().unwrap().timestamp;
        let last = enriched.events.last().unwrap().timestamp;
        let span_minutes = (last - first).num_minutes();
        let sum_minutes = enriched.durations.tracked_hours() * 60;
        // Each of the four buckets rounds independently.
        prop_assert!((sum_minutes - span_minutes).abs() <= 4 * 60, "sum={} span={}", sum_minutes, span_minutes);
        prop_assert_eq!(enriched.durations.untracked_hours, 0);
    }

    #[test]
    fn every_block_is_resumed_or_reported(raw in arb_ticket()) {
        let vocab = StatusVocabulary::default();
        let enriched = Engine::new(WallClock).enrich(&raw, now());
        prop_assume!(!enriched.is_blocked);

        let classes: Vec<_> = enriched.events.iter().map(|e| vocab.classify(&e.status)).collect();
        let violated = classes.iter().enumerate().any(|(i, class)| {
            *class == StatusClass::Blocked
                && !classes[i + 1..]
                    .iter()
                    .take_while(|c| **c != StatusClass::Blocked)
                    .any(|c| c.resumes_work())
        });
        if violated {
            prop_assert!(enriched.has_issue(IssueKind::UnclosedBlock));
        }
    }

    #[test]
    fn durations_are_never_negative(raw in arb_ticket()) {
        let d = Engine::new(WallClock).enrich(&raw, now()).durations;
        prop_assert!(d.blocked_hours >= 0 && d.development_hours >= 0);
        prop_assert!(d.review_hours >= 0 && d.qa_hours >= 0 && d.untracked_hours >= 0);
        prop_assert!(d.current_block_duration_hours.unwrap_or(0) >= 0);
    }

    #[test]
    fn parallel_equals_sequential(
        raws in prop::collection::vec(arb_ticket(), 0..24),
        workers in 1usize..8,
    ) {
        let engine = Engine::new(WallClock);
        let sequential = engine.enrich_all(&raws, now());
        let parallel = engine.enrich_parallel(&raws, now(), NonZeroUsize::new(workers).unwrap());
        prop_assert_eq!(parallel, sequential);
    }

    #[test]
    fn advancing_now_only_moves_open_ended_values(
        raw in arb_ticket(),
        advance in 1i64..2_000,
    ) {
        let engine = Engine::new(WallClock);
        let early = engine.enrich(&raw, now());
        let late = engine.enrich(&raw, now() + Duration::hours(advance));

        prop_assert_eq!(&early.events, &late.events);
        prop_assert_eq!(&early.issues, &late.issues);
        prop_assert_eq!(&early.transitions, &late.transitions);
        prop_assert_eq!(&early.handoffs, &late.handoffs);
        prop_assert_eq!(early.resolved_at, late.resolved_at);
        prop_assert_eq!(early.durations.total_cycle_time_hours, late.durations.total_cycle_time_hours);

        let starts = |t: &EnrichedTicket| {
            t.phases.iter().map(|p| p.start).collect::<Vec<_>>()
        };
        prop_assert_eq!(starts(&early), starts(&late));
        let since = |t: &EnrichedTicket| {
            t.blocks.iter().map(|b| (b.since, b.resumed_at)).collect::<Vec<_>>()
        };
        prop_assert_eq!(since(&early), since(&late));

        let (a, b) = (early.durations, late.durations);
        if early.is_terminal {
            prop_assert_eq!(
                (a.blocked_hours, a.development_hours, a.review_hours, a.qa_hours, a.untracked_hours),
                (b.blocked_hours, b.development_hours, b.review_hours, b.qa_hours, b.untracked_hours)
            );
        } else {
            prop_assert!(b.tracked_hours() + b.untracked_hours >= a.tracked_hours() + a.untracked_hours);
        }
        prop_assert!(b.current_block_duration_hours >= a.current_block_duration_hours);
    }
}
