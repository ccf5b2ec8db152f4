//! ticketline-core library.
//!
//! Derives a consistent lifecycle picture for raw ticket records: a cleaned
//! and ordered event sequence, synthesized repair events, data-quality
//! issues, and duration metrics. [`report`] folds a batch of enriched
//! tickets into blocker, sprint, people, and insight summaries.
//!
//! # Conventions
//!
//! - **Errors**: per-ticket problems are [`model::issue::DataIssue`]s, never
//!   errors. Library failures (feed parsing, config) use `thiserror` enums;
//!   file loading uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use ticketline_core::hours::WallClock;
//! use ticketline_core::lifecycle::Engine;
//! use ticketline_core::model::ticket::RawTicket;
//!
//! let raw = RawTicket::from_value(serde_json::json!({
//!     "id": "T1",
//!     "title": "Login fix",
//!     "status": "Done",
//!     "Event_Log": [
//!         {"status": "In Progress", "timestamp": "2024-01-01T09:00:00Z"},
//!         {"status": "Done", "timestamp": "2024-01-02T09:00:00Z"}
//!     ]
//! }))
//! .unwrap();
//!
//! let engine = Engine::new(WallClock);
//! let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
//! let ticket = engine.enrich(&raw, now);
//! assert_eq!(ticket.durations.development_hours, 24);
//! assert!(ticket.issues.is_empty());
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod format;
pub mod hours;
pub mod lifecycle;
pub mod model;
pub mod report;
pub mod time;
