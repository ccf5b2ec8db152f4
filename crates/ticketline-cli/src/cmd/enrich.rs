use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use ticketline_core::format::{format_hours, parse_duration};
use ticketline_core::lifecycle::EnrichedTicket;

use super::Session;
use crate::output::{pretty_rule, pretty_section, pretty_table, render_mode, text_table};

/// Arguments for `tl enrich`.
#[derive(Args, Debug)]
pub struct EnrichArgs {
    /// Ticket feed: a JSON array or JSON Lines file, or `-` for stdin.
    pub file: PathBuf,

    /// Only keep tickets blocked for at least this long (e.g. "2d 4h").
    #[arg(long, value_name = "DURATION")]
    pub blocked_over: Option<String>,

    /// Only keep tickets that carry at least one data issue.
    #[arg(long)]
    pub with_issues: bool,
}

/// Enrich every ticket in the feed and render the batch.
///
/// # Errors
///
/// Returns an error if the feed cannot be loaded or output rendering fails.
pub fn run_enrich(args: &EnrichArgs, session: &Session) -> anyhow::Result<()> {
    let mut tickets = session.enrich_feed(&args.file)?;

    if let Some(raw) = args.blocked_over.as_deref() {
        let threshold = parse_duration(raw);
        tickets.retain(|t| t.durations.blocked_hours >= threshold);
    }
    if args.with_issues {
        tickets.retain(|t| !t.issues.is_empty());
    }

    render_mode(
        session.output,
        tickets.as_slice(),
        render_enrich_text,
        render_enrich_human,
    )
}

const HEADERS: [&str; 8] = [
    "ID", "STATUS", "BLOCKED", "DEV", "REVIEW", "QA", "CYCLE", "ISSUES",
];

fn row(ticket: &EnrichedTicket) -> [String; 8] {
    let d = &ticket.durations;
    [
        ticket.display_id().to_string(),
        ticket.status.clone().unwrap_or_else(|| "-".to_string()),
        format_hours(d.blocked_hours),
        format_hours(d.development_hours),
        format_hours(d.review_hours),
        format_hours(d.qa_hours),
        d.total_cycle_time_hours
            .map_or_else(|| "-".to_string(), format_hours),
        ticket.issues.len().to_string(),
    ]
}

fn render_enrich_text(tickets: &[EnrichedTicket], w: &mut dyn Write) -> std::io::Result<()> {
    let rows: Vec<[String; 8]> = tickets.iter().map(row).collect();
    text_table(w, &HEADERS, &rows)
}

fn render_enrich_human(tickets: &[EnrichedTicket], w: &mut dyn Write) -> std::io::Result<()> {
    if tickets.is_empty() {
        writeln!(w, "No tickets found.")?;
        return Ok(());
    }

    let rows: Vec<[String; 8]> = tickets.iter().map(row).collect();
    pretty_section(w, &format!("Tickets ({})", tickets.len()))?;
    pretty_table(w, &HEADERS, &rows)?;

    let blocked = tickets.iter().filter(|t| t.is_blocked).count();
    let issues: usize = tickets.iter().map(|t| t.issues.len()).sum();
    pretty_rule(w)?;
    writeln!(w, "{blocked} currently blocked, {issues} data issue(s)")?;
    Ok(())
}
