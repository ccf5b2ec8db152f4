#![forbid(unsafe_code)]

mod cmd;
mod input;
mod output;

use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode};
use std::env;
use std::num::NonZeroUsize;
use ticketline_core::config::{UserConfig, load_user_config};
use ticketline_core::error::ErrorCode;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tl: ticket lifecycle timelines and duration metrics",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides `--json`, `FORMAT` and the user config).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Evaluate open-ended durations at this RFC 3339 instant instead of
    /// the current time.
    #[arg(long, global = true, value_name = "RFC3339")]
    now: Option<String>,

    /// Worker threads for batch enrichment (default: available cores).
    #[arg(long, global = true, value_name = "N")]
    workers: Option<NonZeroUsize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        about = "Enrich every ticket in a feed",
        long_about = "Normalize, repair, validate and measure every ticket in a JSON or JSON Lines feed.",
        after_help = "EXAMPLES:\n    # Duration table for a feed\n    tl enrich tickets.json\n\n    # Full enriched records, pinned to a fixed instant\n    tl enrich tickets.jsonl --json --now 2024-06-01T00:00:00Z\n\n    # Tickets blocked for two days or more\n    tl enrich tickets.json --blocked-over 2d"
    )]
    Enrich(cmd::enrich::EnrichArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one ticket's timeline",
        long_about = "Show one ticket's durations, status phases, blocker log, transitions, handoffs and data issues.",
        after_help = "EXAMPLES:\n    # Show a ticket\n    tl show tickets.json PROJ-42\n\n    # Emit machine-readable output\n    tl show tickets.json PROJ-42 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "List data-quality issues",
        long_about = "List every data-quality issue found across a feed. Finding issues is not a failure.",
        after_help = "EXAMPLES:\n    # Every issue in the feed\n    tl issues tickets.json\n\n    # Only blocks that were never resumed\n    tl issues tickets.json --kind unclosed_block"
    )]
    Issues(cmd::issues::IssuesArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Rank blockers by blocked time",
        long_about = "Total blocking episodes, affected tickets and blocked time per blocker, plus the blocks still open.",
        after_help = "EXAMPLES:\n    # Who blocks the most work\n    tl blockers tickets.json\n\n    # As JSON, pinned to a fixed instant\n    tl blockers tickets.json --json --now 2024-06-01T00:00:00Z"
    )]
    Blockers(cmd::blockers::BlockersArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Summarize each sprint",
        long_about = "Ticket counts, blocked share of development time and the most frequent current blocker per sprint.",
        after_help = "EXAMPLES:\n    # Sprint health\n    tl sprints tickets.json"
    )]
    Sprints(cmd::sprints::SprintsArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Summarize each person",
        long_about = "Owned and resolved tickets, development time and blocks caused per person.",
        after_help = "EXAMPLES:\n    # Workload per person\n    tl people tickets.json --format text"
    )]
    People(cmd::people::PeopleArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Point out outliers",
        long_about = "Call out unusually long blocks, the week's top resolver, heavily blocked sprints, the longest cycle time and owners with several blocked tickets.",
        after_help = "EXAMPLES:\n    # What stands out today\n    tl insights tickets.json"
    )]
    Insights(cmd::insights::InsightsArgs),

    #[command(
        next_help_heading = "Configuration",
        about = "Inspect configuration",
        long_about = "Show the effective configuration or the raw project/user config files.",
        after_help = "EXAMPLES:\n    # Effective configuration\n    tl config show\n\n    # Raw project file\n    tl config show --project"
    )]
    Config(cmd::config::ConfigArgs),

    #[command(
        next_help_heading = "Configuration",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    tl completions bash > ~/.local/share/bash-completion/completions/tl"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

/// Parse `--now`, defaulting to the current time.
fn resolve_now(raw: Option<&str>) -> Result<DateTime<Utc>, chrono::ParseError> {
    raw.map_or_else(
        || Ok(Utc::now()),
        |value| DateTime::parse_from_rfc3339(value.trim()).map(|at| at.with_timezone(&Utc)),
    )
}

fn default_workers() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TICKETLINE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "ticketline=debug,info"
        } else {
            "ticketline=info,warn"
        })
    });

    let format = env::var("TICKETLINE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // Logs go to stderr so stdout stays parseable.
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let user = load_user_config();
    let output = output::resolve_output_mode(
        cli.format,
        cli.json,
        user.as_ref().ok().and_then(|user| user.output.as_deref()),
    );
    let user = match user {
        Ok(user) => user,
        // `tl config show` is how a broken user config gets inspected.
        Err(e) if matches!(cli.command, Commands::Config(_)) => {
            warn!("ignoring unreadable user config: {e:#}");
            UserConfig::default()
        }
        Err(e) => {
            return output::fail(
                output,
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{e:#}")),
            );
        }
    };

    let now = match resolve_now(cli.now.as_deref()) {
        Ok(now) => now,
        Err(e) => {
            return output::fail(
                output,
                &CliError::from_code(
                    ErrorCode::InvalidNow,
                    format!("invalid --now '{}': {e}", cli.now.as_deref().unwrap_or_default()),
                ),
            );
        }
    };
    let workers = cli.workers.unwrap_or_else(default_workers);

    match cli.command {
        Commands::Enrich(ref args) => {
            let session = cmd::Session::open(&project_root, now, workers, output)?;
            cmd::enrich::run_enrich(args, &session)
        }
        Commands::Show(ref args) => {
            let session = cmd::Session::open(&project_root, now, workers, output)?;
            cmd::show::run_show(args, &session)
        }
        Commands::Issues(ref args) => {
            let session = cmd::Session::open(&project_root, now, workers, output)?;
            cmd::issues::run_issues(args, &session)
        }
        Commands::Blockers(ref args) => {
            let session = cmd::Session::open(&project_root, now, workers, output)?;
            cmd::blockers::run_blockers(args, &session)
        }
        Commands::Sprints(ref args) => {
            let session = cmd::Session::open(&project_root, now, workers, output)?;
            cmd::sprints::run_sprints(args, &session)
        }
        Commands::People(ref args) => {
            let session = cmd::Session::open(&project_root, now, workers, output)?;
            cmd::people::run_people(args, &session)
        }
        Commands::Insights(ref args) => {
            let session = cmd::Session::open(&project_root, now, workers, output)?;
            cmd::insights::run_insights(args, &session)
        }
        Commands::Config(ref args) => cmd::config::run_config(args, &project_root, user, output),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
