#![no_main]

use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use serde_json::json;
use ticketline_core::hours::WallClock;
use ticketline_core::lifecycle::Engine;
use ticketline_core::model::ticket::RawTicket;

// Arbitrary text as the embedded event-log column of an otherwise valid
// blocked ticket.
fuzz_target!(|data: &[u8]| {
    let log = String::from_utf8_lossy(data);
    let Some(raw) = RawTicket::from_value(json!({
        "id": "FZ-1",
        "title": "fuzz",
        "status": "Blocked",
        "blocked": "TRUE",
        "Blocked_Since": "2024-01-02T09:00",
        "Unblocked_At": "2024-01-03T09:00",
        "Event_Log": log,
    })) else {
        return;
    };
    let Some(now) = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single() else {
        return;
    };
    let engine = Engine::new(WallClock);
    let first = engine.enrich(&raw, now);
    assert_eq!(first, engine.enrich(&raw, now));
});
