use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use ticketline_core::report::{Insight, insights};

use super::Session;
use crate::output::{pretty_section, render_mode};

/// Arguments for `tl insights`.
#[derive(Args, Debug)]
pub struct InsightsArgs {
    /// Ticket feed: a JSON array or JSON Lines file, or `-` for stdin.
    pub file: PathBuf,
}

/// Point out outliers across the feed as of the session's `now`.
///
/// # Errors
///
/// Returns an error if the feed cannot be loaded or output rendering fails.
pub fn run_insights(args: &InsightsArgs, session: &Session) -> anyhow::Result<()> {
    let tickets = session.enrich_feed(&args.file)?;
    let found = insights(&tickets, session.engine.vocabulary(), session.now);
    render_mode(
        session.output,
        found.as_slice(),
        render_insights_text,
        render_insights_human,
    )
}

fn kind(insight: &Insight) -> &'static str {
    match insight {
        Insight::OutlierBlock { .. } => "outlier_block",
        Insight::TopResolver { .. } => "top_resolver",
        Insight::BlockedSprint { .. } => "blocked_sprint",
        Insight::LongestCycle { .. } => "longest_cycle",
        Insight::MostBlockedOwner { .. } => "most_blocked_owner",
    }
}

fn render_insights_text(found: &[Insight], w: &mut dyn Write) -> std::io::Result<()> {
    for insight in found {
        writeln!(w, "{}  {insight}", kind(insight))?;
    }
    Ok(())
}

fn render_insights_human(found: &[Insight], w: &mut dyn Write) -> std::io::Result<()> {
    if found.is_empty() {
        writeln!(w, "Nothing stands out.")?;
        return Ok(());
    }
    pretty_section(w, &format!("Insights ({})", found.len()))?;
    for insight in found {
        writeln!(w, "- {insight}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle() -> Insight {
        Insight::LongestCycle {
            ticket: "T-9".into(),
            hours: 80,
        }
    }

    #[test]
    fn text_lines_lead_with_kind() {
        let mut buf = Vec::new();
        render_insights_text(&[cycle()], &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("longest_cycle  Ticket T-9 has the longest cycle time"));
    }

    #[test]
    fn text_kind_matches_json_tag() {
        let value = serde_json::to_value(cycle()).unwrap();
        assert_eq!(value["kind"], kind(&cycle()));
    }

    #[test]
    fn pretty_output_when_quiet() {
        let mut buf = Vec::new();
        render_insights_human(&[], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Nothing stands out.\n");
    }
}
