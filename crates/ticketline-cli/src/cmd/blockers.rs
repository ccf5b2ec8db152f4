use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use ticketline_core::format::format_hours;
use ticketline_core::report::{BlockerStats, blockers};

use super::Session;
use crate::output::{pretty_rule, pretty_section, pretty_table, render_mode, text_table};

/// Arguments for `tl blockers`.
#[derive(Args, Debug)]
pub struct BlockersArgs {
    /// Ticket feed: a JSON array or JSON Lines file, or `-` for stdin.
    pub file: PathBuf,
}

/// Rank everyone who has blocked a ticket by total blocked time.
///
/// # Errors
///
/// Returns an error if the feed cannot be loaded or output rendering fails.
pub fn run_blockers(args: &BlockersArgs, session: &Session) -> anyhow::Result<()> {
    let tickets = session.enrich_feed(&args.file)?;
    let stats = blockers(&tickets);
    render_mode(
        session.output,
        stats.as_slice(),
        render_blockers_text,
        render_blockers_human,
    )
}

const HEADERS: [&str; 5] = ["BLOCKER", "BLOCKED", "BLOCKS", "TICKETS", "ACTIVE"];

fn row(stat: &BlockerStats) -> [String; 5] {
    [
        stat.entity.clone(),
        format_hours(stat.blocked_hours),
        stat.blocks.to_string(),
        stat.tickets.to_string(),
        stat.active.to_string(),
    ]
}

fn render_blockers_text(stats: &[BlockerStats], w: &mut dyn Write) -> std::io::Result<()> {
    let rows: Vec<[String; 5]> = stats.iter().map(row).collect();
    text_table(w, &HEADERS, &rows)
}

fn render_blockers_human(stats: &[BlockerStats], w: &mut dyn Write) -> std::io::Result<()> {
    if stats.is_empty() {
        writeln!(w, "No blocks recorded.")?;
        return Ok(());
    }

    let rows: Vec<[String; 5]> = stats.iter().map(row).collect();
    pretty_section(w, &format!("Blockers ({})", stats.len()))?;
    pretty_table(w, &HEADERS, &rows)?;

    let active: usize = stats.iter().map(|s| s.active).sum();
    let hours: i64 = stats.iter().map(|s| s.blocked_hours).sum();
    pretty_rule(w)?;
    writeln!(w, "{active} active block(s), {} blocked in total", format_hours(hours))?;
    Ok(())
}
