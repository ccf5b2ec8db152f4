use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use ticketline_core::format::format_hours;
use ticketline_core::report::{PersonStats, people};

use super::Session;
use crate::output::{pretty_section, pretty_table, render_mode, text_table};

/// Arguments for `tl people`.
#[derive(Args, Debug)]
pub struct PeopleArgs {
    /// Ticket feed: a JSON array or JSON Lines file, or `-` for stdin.
    pub file: PathBuf,
}

/// Summarize ownership and blocking per person.
///
/// # Errors
///
/// Returns an error if the feed cannot be loaded or output rendering fails.
pub fn run_people(args: &PeopleArgs, session: &Session) -> anyhow::Result<()> {
    let tickets = session.enrich_feed(&args.file)?;
    let stats = people(&tickets);
    render_mode(
        session.output,
        stats.as_slice(),
        render_people_text,
        render_people_human,
    )
}

const HEADERS: [&str; 5] = ["NAME", "TICKETS", "RESOLVED", "DEV", "BLOCKS_CAUSED"];

fn row(stat: &PersonStats) -> [String; 5] {
    [
        stat.name.clone(),
        stat.tickets.to_string(),
        stat.resolved.to_string(),
        format_hours(stat.development_hours),
        stat.blocks_caused.to_string(),
    ]
}

fn render_people_text(stats: &[PersonStats], w: &mut dyn Write) -> std::io::Result<()> {
    let rows: Vec<[String; 5]> = stats.iter().map(row).collect();
    text_table(w, &HEADERS, &rows)
}

fn render_people_human(stats: &[PersonStats], w: &mut dyn Write) -> std::io::Result<()> {
    if stats.is_empty() {
        writeln!(w, "No people found.")?;
        return Ok(());
    }

    let rows: Vec<[String; 5]> = stats.iter().map(row).collect();
    pretty_section(w, &format!("People ({})", stats.len()))?;
    pretty_table(w, &HEADERS, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_row_lists_counts() {
        let stat = PersonStats {
            name: "Virat Kohli".into(),
            tickets: 4,
            resolved: 1,
            development_hours: 26,
            blocks_caused: 0,
        };
        let mut buf = Vec::new();
        render_people_text(&[stat], &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert_eq!(out.lines().nth(1), Some("Virat Kohli  4  1  1d 2h  0"));
    }

    #[test]
    fn pretty_output_without_people() {
        let mut buf = Vec::new();
        render_people_human(&[], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "No people found.\n");
    }
}
