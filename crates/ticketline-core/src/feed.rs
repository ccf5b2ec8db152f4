//! Ticket feed parsing.
//!
//! A feed is either a JSON array of ticket objects or JSON Lines (one ticket
//! object per line, blank lines ignored). Problems inside a ticket are the
//! engine's business and become data issues; a feed that is not a sequence
//! of objects at all is a [`FeedError`].

use serde_json::Value;

use crate::model::ticket::RawTicket;

/// Errors from parsing a ticket feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A JSON array feed failed to parse.
    #[error("feed is not a valid JSON array: {0}")]
    InvalidArray(#[source] serde_json::Error),

    /// A JSON Lines record failed to parse.
    #[error("line {line}: invalid JSON: {source}")]
    InvalidLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A record parsed but is not a JSON object.
    #[error("record {index} is not a JSON object")]
    NotAnObject { index: usize },
}

/// Parse a feed document into raw tickets, preserving record order.
///
/// # Errors
///
/// Returns a [`FeedError`] when the document is neither a JSON array nor
/// JSON Lines, or when any record is not an object.
pub fn parse_feed(input: &str) -> Result<Vec<RawTicket>, FeedError> {
    let trimmed = input.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        let records: Vec<Value> = serde_json::from_str(trimmed).map_err(FeedError::InvalidArray)?;
        return records
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                RawTicket::from_value(value).ok_or(FeedError::NotAnObject { index })
            })
            .collect();
    }

    let mut tickets = Vec::new();
    for (idx, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|source| FeedError::InvalidLine {
            line: idx + 1,
            source,
        })?;
        let ticket = RawTicket::from_value(value).ok_or(FeedError::NotAnObject {
            index: tickets.len(),
        })?;
        tickets.push(ticket);
    }
    Ok(tickets)
}
