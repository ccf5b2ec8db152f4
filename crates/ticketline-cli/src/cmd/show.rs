use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use ticketline_core::error::ErrorCode;
use ticketline_core::format::format_hours;
use ticketline_core::lifecycle::EnrichedTicket;

use super::Session;
use crate::output::{CliError, fail, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Arguments for `tl show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Ticket feed: a JSON array or JSON Lines file, or `-` for stdin.
    pub file: PathBuf,

    /// Ticket ID to show.
    pub id: String,
}

/// Show one ticket's durations and history.
///
/// # Errors
///
/// Returns an error if the feed cannot be loaded, the ticket does not
/// exist, or output rendering fails.
pub fn run_show(args: &ShowArgs, session: &Session) -> anyhow::Result<()> {
    let wanted = args.id.trim();
    let tickets = session.enrich_feed(&args.file)?;
    let Some(ticket) = tickets.into_iter().find(|t| t.id.as_deref() == Some(wanted)) else {
        return fail(
            session.output,
            &CliError::from_code(
                ErrorCode::TicketNotFound,
                format!("ticket '{wanted}' not found"),
            ),
        );
    };

    render_mode(session.output, &ticket, render_show_text, render_show_human)
}

fn stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn opt_stamp(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), stamp)
}

fn opt_hours(hours: Option<i64>) -> String {
    hours.map_or_else(|| "-".to_string(), format_hours)
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// Render full ticket details in human-readable format.
fn render_show_human(ticket: &EnrichedTicket, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Ticket {}", ticket.display_id()))?;
    writeln!(w, "{}", or_dash(ticket.title.as_deref()))?;
    pretty_rule(w)?;
    pretty_kv(w, "status", or_dash(ticket.status.as_deref()))?;
    pretty_kv(w, "owner", or_dash(ticket.owner.as_deref()))?;
    if let Some(ref sprint) = ticket.sprint {
        pretty_kv(w, "sprint", sprint)?;
    }
    if ticket.is_blocked {
        pretty_kv(
            w,
            "blocked",
            format!(
                "by {} since {}",
                or_dash(ticket.blocked_by.as_deref()),
                opt_stamp(ticket.block_started_at)
            ),
        )?;
    }
    pretty_kv(w, "created", opt_stamp(ticket.created_at))?;
    pretty_kv(w, "resolved", opt_stamp(ticket.resolved_at))?;

    let d = &ticket.durations;
    writeln!(w)?;
    pretty_section(w, "Durations")?;
    pretty_kv(w, "blocked", format_hours(d.blocked_hours))?;
    pretty_kv(w, "development", format_hours(d.development_hours))?;
    pretty_kv(w, "review", format_hours(d.review_hours))?;
    pretty_kv(w, "qa", format_hours(d.qa_hours))?;
    pretty_kv(w, "untracked", format_hours(d.untracked_hours))?;
    pretty_kv(w, "cycle", opt_hours(d.total_cycle_time_hours))?;
    if d.current_block_duration_hours.is_some() {
        pretty_kv(w, "block now", opt_hours(d.current_block_duration_hours))?;
    }

    if !ticket.phases.is_empty() {
        writeln!(w)?;
        pretty_section(w, &format!("Phases ({})", ticket.phases.len()))?;
        for phase in &ticket.phases {
            writeln!(
                w,
                "{:<24} {} -> {:<16} {:>7}  {}",
                phase.status,
                stamp(phase.start),
                opt_stamp(phase.end),
                opt_hours(phase.duration_hours),
                phase.by
            )?;
        }
    }

    if !ticket.blocks.is_empty() {
        writeln!(w)?;
        pretty_section(w, &format!("Blocks ({})", ticket.blocks.len()))?;
        for block in &ticket.blocks {
            let resumed = block
                .resumed_at
                .map_or_else(|| "ongoing".to_string(), stamp);
            write!(
                w,
                "{} -> {} ({}) by {}",
                stamp(block.since),
                resumed,
                format_hours(block.duration_hours),
                block.blocked_by
            )?;
            match block.reason {
                Some(ref reason) => writeln!(w, ": {reason}")?,
                None => writeln!(w)?,
            }
        }
    }

    if !ticket.transitions.is_empty() {
        writeln!(w)?;
        pretty_section(w, &format!("Transitions ({})", ticket.transitions.len()))?;
        for t in &ticket.transitions {
            writeln!(w, "[{}] {} -> {} ({})", stamp(t.timestamp), t.from, t.to, t.by)?;
        }
    }

    if !ticket.handoffs.is_empty() {
        writeln!(w)?;
        pretty_kv(w, "handoffs", ticket.handoffs.join(" -> "))?;
    }

    if !ticket.issues.is_empty() {
        writeln!(w)?;
        pretty_section(w, &format!("Issues ({})", ticket.issues.len()))?;
        for issue in &ticket.issues {
            writeln!(w, "{}: {}", issue.kind, issue.detail)?;
        }
    }
    Ok(())
}

fn render_show_text(ticket: &EnrichedTicket, w: &mut dyn Write) -> std::io::Result<()> {
    let d = &ticket.durations;
    writeln!(w, "id: {}", ticket.display_id())?;
    writeln!(w, "title: {}", or_dash(ticket.title.as_deref()))?;
    writeln!(w, "status: {}", or_dash(ticket.status.as_deref()))?;
    writeln!(w, "owner: {}", or_dash(ticket.owner.as_deref()))?;
    writeln!(w, "blocked: {}", ticket.is_blocked)?;
    writeln!(
        w,
        "hours: blocked={} development={} review={} qa={} untracked={}",
        d.blocked_hours, d.development_hours, d.review_hours, d.qa_hours, d.untracked_hours
    )?;
    writeln!(
        w,
        "cycle: {}",
        d.total_cycle_time_hours
            .map_or_else(|| "-".to_string(), |h| h.to_string())
    )?;
    for phase in &ticket.phases {
        writeln!(
            w,
            "phase: {} {} {}",
            phase.status,
            phase.start.to_rfc3339(),
            phase
                .duration_hours
                .map_or_else(|| "-".to_string(), |h| h.to_string())
        )?;
    }
    for block in &ticket.blocks {
        writeln!(
            w,
            "block: {} {} {}",
            block.since.to_rfc3339(),
            block.duration_hours,
            block.blocked_by
        )?;
    }
    for issue in &ticket.issues {
        writeln!(w, "issue: {} {}", issue.kind, issue.detail)?;
    }
    Ok(())
}
