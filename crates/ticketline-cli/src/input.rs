//! Reading ticket feeds from a file or stdin.

use std::io::{self, Read};
use std::path::Path;

use ticketline_core::error::ErrorCode;
use ticketline_core::feed::parse_feed;
use ticketline_core::model::ticket::RawTicket;
use tracing::debug;

use crate::output::{CliError, OutputMode, fail};

/// Path argument meaning "read the feed from stdin".
pub const STDIN_PATH: &str = "-";

/// Read and parse the feed at `path` (`-` for stdin).
///
/// # Errors
///
/// Renders and returns an error when the file is missing or unreadable,
/// or when its content is not a JSON array / JSON Lines feed.
pub fn read_feed(path: &Path, output: OutputMode) -> anyhow::Result<Vec<RawTicket>> {
    let content = if path.as_os_str() == STDIN_PATH {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            return fail(
                output,
                &CliError::from_code(ErrorCode::InputReadFailed, format!("stdin: {e}")),
            );
        }
        buf
    } else {
        match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return fail(
                    output,
                    &CliError::from_code(
                        ErrorCode::InputNotFound,
                        format!("feed '{}' not found", path.display()),
                    ),
                );
            }
            Err(e) => {
                return fail(
                    output,
                    &CliError::from_code(
                        ErrorCode::InputReadFailed,
                        format!("{}: {e}", path.display()),
                    ),
                );
            }
        }
    };

    match parse_feed(&content) {
        Ok(raws) => {
            debug!(path = %path.display(), tickets = raws.len(), "feed loaded");
            Ok(raws)
        }
        Err(e) => fail(
            output,
            &CliError::from_code(
                ErrorCode::FeedParseError,
                format!("{}: {e}", path.display()),
            ),
        ),
    }
}
