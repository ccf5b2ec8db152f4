pub mod blockers;
pub mod completions;
pub mod config;
pub mod enrich;
pub mod insights;
pub mod issues;
pub mod people;
pub mod show;
pub mod sprints;

use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use ticketline_core::config::load_project_config;
use ticketline_core::error::ErrorCode;
use ticketline_core::lifecycle::{EnrichedTicket, Engine};
use tracing::{debug, info};

use crate::input::read_feed;
use crate::output::{CliError, OutputMode, fail};

/// Everything a feed-processing command needs: the configured engine, the
/// pinned `now`, and the worker count.
#[derive(Debug)]
pub struct Session {
    pub engine: Engine,
    pub now: DateTime<Utc>,
    pub workers: NonZeroUsize,
    pub output: OutputMode,
}

impl Session {
    /// Build an engine from the project config under `project_root`.
    ///
    /// # Errors
    ///
    /// Returns an error when the project config cannot be read or holds an
    /// unusable value.
    pub fn open(
        project_root: &Path,
        now: DateTime<Utc>,
        workers: NonZeroUsize,
        output: OutputMode,
    ) -> anyhow::Result<Self> {
        let config = match load_project_config(project_root) {
            Ok(config) => config,
            Err(e) => {
                return fail(
                    output,
                    &CliError::from_code(ErrorCode::ConfigParseError, format!("{e:#}")),
                );
            }
        };
        let engine = match Engine::from_config(&config) {
            Ok(engine) => engine,
            Err(e) => {
                return fail(
                    output,
                    &CliError::from_code(ErrorCode::InvalidConfigValue, e.to_string()),
                );
            }
        };
        debug!(?engine, %now, workers = workers.get(), "session ready");
        Ok(Self {
            engine,
            now,
            workers,
            output,
        })
    }

    /// Read the feed at `path` and enrich every ticket in input order.
    ///
    /// # Errors
    ///
    /// Returns an error when the feed cannot be read or parsed.
    pub fn enrich_feed(&self, path: &Path) -> anyhow::Result<Vec<EnrichedTicket>> {
        let raws = read_feed(path, self.output)
            .with_context(|| format!("loading {}", path.display()))?;
        let tickets = self.engine.enrich_parallel(&raws, self.now, self.workers);
        let issues: usize = tickets.iter().map(|t| t.issues.len()).sum();
        info!(tickets = tickets.len(), issues, "feed enriched");
        Ok(tickets)
    }
}
