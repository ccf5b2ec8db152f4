#![no_main]

use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use ticketline_core::feed::parse_feed;
use ticketline_core::hours::BusinessHours;
use ticketline_core::lifecycle::Engine;

// Any feed that parses must enrich without panicking.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(raws) = parse_feed(text) else {
        return;
    };
    let Some(now) = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single() else {
        return;
    };
    let engine = Engine::new(BusinessHours::standard());
    for ticket in engine.enrich_all(&raws, now) {
        assert!(ticket.durations.blocked_hours >= 0);
        assert!(ticket.events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
});
