use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use ticketline_core::lifecycle::EnrichedTicket;
use ticketline_core::model::issue::IssueKind;

use super::Session;
use crate::output::{pretty_rule, pretty_section, render_mode};

/// Arguments for `tl issues`.
#[derive(Args, Debug)]
pub struct IssuesArgs {
    /// Ticket feed: a JSON array or JSON Lines file, or `-` for stdin.
    pub file: PathBuf,

    /// Only report issues of this kind (e.g. `unclosed_block`).
    #[arg(long, value_parser = parse_kind)]
    pub kind: Option<IssueKind>,
}

fn parse_kind(raw: &str) -> Result<IssueKind, String> {
    raw.parse::<IssueKind>().map_err(|e| e.to_string())
}

/// One data issue attributed to its ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueRow {
    pub ticket: String,
    pub kind: IssueKind,
    pub detail: String,
}

/// Flatten every ticket's issues in feed order.
fn collect_rows(tickets: &[EnrichedTicket], kind: Option<IssueKind>) -> Vec<IssueRow> {
    tickets
        .iter()
        .flat_map(|ticket| {
            ticket.issues.iter().map(|issue| IssueRow {
                ticket: ticket.display_id().to_string(),
                kind: issue.kind,
                detail: issue.detail.clone(),
            })
        })
        .filter(|row| kind.is_none_or(|k| row.kind == k))
        .collect()
}

/// Report every data issue across the feed.
///
/// Issues describe the data, not the run, so finding some is still a
/// successful exit.
///
/// # Errors
///
/// Returns an error if the feed cannot be loaded or output rendering fails.
pub fn run_issues(args: &IssuesArgs, session: &Session) -> anyhow::Result<()> {
    let tickets = session.enrich_feed(&args.file)?;
    let rows = collect_rows(&tickets, args.kind);
    render_mode(
        session.output,
        rows.as_slice(),
        render_issues_text,
        render_issues_human,
    )
}

fn render_issues_text(rows: &[IssueRow], w: &mut dyn Write) -> std::io::Result<()> {
    for row in rows {
        writeln!(w, "{}  {}  {}", row.ticket, row.kind, row.detail)?;
    }
    Ok(())
}

fn render_issues_human(rows: &[IssueRow], w: &mut dyn Write) -> std::io::Result<()> {
    if rows.is_empty() {
        writeln!(w, "No data issues found.")?;
        return Ok(());
    }

    pretty_section(w, &format!("Data issues ({})", rows.len()))?;
    for row in rows {
        writeln!(w, "{:<12} {:<20} {}", row.ticket, row.kind.as_str(), row.detail)?;
    }

    let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        *by_kind.entry(row.kind.as_str()).or_default() += 1;
    }
    pretty_rule(w)?;
    for (kind, count) in by_kind {
        writeln!(w, "{kind:<20} {count}")?;
    }
    Ok(())
}
