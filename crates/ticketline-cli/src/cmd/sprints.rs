use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use ticketline_core::format::format_hours;
use ticketline_core::report::{SprintStats, sprints};

use super::Session;
use crate::output::{pretty_section, pretty_table, render_mode, text_table};

/// Arguments for `tl sprints`.
#[derive(Args, Debug)]
pub struct SprintsArgs {
    /// Ticket feed: a JSON array or JSON Lines file, or `-` for stdin.
    pub file: PathBuf,
}

/// Summarize blocking and throughput per sprint.
///
/// # Errors
///
/// Returns an error if the feed cannot be loaded or output rendering fails.
pub fn run_sprints(args: &SprintsArgs, session: &Session) -> anyhow::Result<()> {
    let tickets = session.enrich_feed(&args.file)?;
    let stats = sprints(&tickets);
    render_mode(
        session.output,
        stats.as_slice(),
        render_sprints_text,
        render_sprints_human,
    )
}

const HEADERS: [&str; 8] = [
    "SPRINT", "TICKETS", "CLOSED", "BLOCKED_NOW", "BLOCKED", "DEV", "BLOCKED_%", "TOP_BLOCKER",
];

fn row(stat: &SprintStats) -> [String; 8] {
    [
        stat.sprint.clone(),
        stat.tickets.to_string(),
        stat.closed.to_string(),
        stat.blocked_tickets.to_string(),
        format_hours(stat.blocked_hours),
        format_hours(stat.development_hours),
        format!("{}%", stat.percent_blocked),
        stat.most_frequent_blocker
            .clone()
            .unwrap_or_else(|| "-".to_string()),
    ]
}

fn render_sprints_text(stats: &[SprintStats], w: &mut dyn Write) -> std::io::Result<()> {
    let rows: Vec<[String; 8]> = stats.iter().map(row).collect();
    text_table(w, &HEADERS, &rows)
}

fn render_sprints_human(stats: &[SprintStats], w: &mut dyn Write) -> std::io::Result<()> {
    if stats.is_empty() {
        writeln!(w, "No tickets found.")?;
        return Ok(());
    }

    let rows: Vec<[String; 8]> = stats.iter().map(row).collect();
    pretty_section(w, &format!("Sprints ({})", stats.len()))?;
    pretty_table(w, &HEADERS, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat() -> SprintStats {
        SprintStats {
            sprint: "Sprint 4".into(),
            tickets: 6,
            blocked_tickets: 2,
            closed: 3,
            blocked_hours: 12,
            development_hours: 48,
            percent_blocked: 25,
            most_frequent_blocker: Some("legal".into()),
        }
    }

    #[test]
    fn text_row_shows_share_and_top_blocker() {
        let mut buf = Vec::new();
        render_sprints_text(&[stat()], &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert_eq!(out.lines().nth(1), Some("Sprint 4  6  3  2  12h  2d  25%  legal"));
    }

    #[test]
    fn missing_top_blocker_renders_dash() {
        let mut quiet = stat();
        quiet.most_frequent_blocker = None;
        assert_eq!(row(&quiet)[7], "-");
    }

    #[test]
    fn pretty_output_has_heading() {
        let mut buf = Vec::new();
        render_sprints_human(&[stat()], &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("Sprints (1)\n"));
        assert!(out.contains("Sprint 4"));
    }
}
