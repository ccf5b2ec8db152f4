use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::io::Write;
use std::path::Path;
use ticketline_core::config::{
    EffectiveConfig, UserConfig, project_config_path, resolve_config, user_config_path,
};
use ticketline_core::error::ErrorCode;
use ticketline_core::model::status::StatusVocabulary;
use toml::Value;

use crate::output::{CliError, OutputMode, fail};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Show resolved or raw configuration
    Show(ShowArgs),
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Show raw project config only
    #[arg(long, conflicts_with = "user")]
    project: bool,

    /// Show raw user config only
    #[arg(long)]
    user: bool,
}

/// Run `tl config`.
///
/// `user` is the already-loaded user config (defaults when it could not be
/// read) and `output` the mode the rest of the CLI resolved.
pub fn run_config(
    args: &ConfigArgs,
    project_root: &Path,
    user: UserConfig,
    output: OutputMode,
) -> Result<()> {
    match &args.command {
        ConfigCommand::Show(show) => run_show(show, project_root, user, output),
    }
}

fn run_show(
    args: &ShowArgs,
    project_root: &Path,
    user: UserConfig,
    output: OutputMode,
) -> Result<()> {
    if args.project {
        return show_raw(&project_config_path(project_root), output);
    }

    if args.user {
        let path = user_config_path().context("could not determine user config directory")?;
        return show_raw(&path, output);
    }

    let effective = match resolve_config(project_root, user, output.as_str()) {
        Ok(effective) => effective,
        Err(e) => {
            return fail(
                output,
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{e:#}")),
            );
        }
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match output {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, &effective)?;
            writeln!(out)?;
        }
        OutputMode::Text => write_effective_text(&effective, &mut out)?,
        OutputMode::Pretty => write_effective_pretty(&effective, &mut out)?,
    }
    Ok(())
}

/// Print a config file as stored. JSON mode converts it, which needs the
/// file to parse; the other modes print it verbatim so a broken file can
/// still be inspected.
fn show_raw(path: &Path, output: OutputMode) -> Result<()> {
    let content = read_raw(path)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if !output.is_json() {
        write_verbatim(&content, &mut out)?;
        return Ok(());
    }
    match toml::from_str::<Value>(&content) {
        Ok(value) => {
            serde_json::to_writer_pretty(&mut out, &value)?;
            writeln!(out)?;
            Ok(())
        }
        Err(e) => fail(
            output,
            &CliError::from_code(
                ErrorCode::ConfigParseError,
                format!("Failed to parse {}: {e}", path.display()),
            ),
        ),
    }
}

fn read_raw(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_verbatim(content: &str, w: &mut dyn Write) -> std::io::Result<()> {
    write!(w, "{content}")?;
    if !content.is_empty() && !content.ends_with('\n') {
        writeln!(w)?;
    }
    Ok(())
}

fn status_lines(statuses: &StatusVocabulary) -> [(&'static str, String); 6] {
    [
        ("blocked", statuses.blocked.join(", ")),
        ("unblocked", statuses.unblocked.join(", ")),
        ("development", statuses.development.join(", ")),
        ("review", statuses.review.join(", ")),
        ("qa", statuses.qa.join(", ")),
        ("terminal", statuses.terminal.join(", ")),
    ]
}

fn write_effective_text(value: &EffectiveConfig, w: &mut dyn Write) -> std::io::Result<()> {
    let hours = &value.project.hours;
    writeln!(w, "resolved_output={}", value.resolved_output)?;
    writeln!(
        w,
        "hours.policy={}",
        toml_scalar(&hours.policy).unwrap_or_default()
    )?;
    writeln!(w, "hours.workdays={}", hours.workdays.join(","))?;
    writeln!(w, "hours.day_start={}", hours.day_start)?;
    writeln!(w, "hours.day_end={}", hours.day_end)?;
    writeln!(w, "hours.utc_offset_minutes={}", hours.utc_offset_minutes)?;
    for (class, labels) in status_lines(&value.project.statuses) {
        writeln!(w, "statuses.{class}={labels}")?;
    }
    writeln!(
        w,
        "validation.flag_status_log_mismatch={}",
        value.project.validation.flag_status_log_mismatch
    )?;
    if let Some(out) = &value.user.output {
        writeln!(w, "user.output={out}")?;
    }
    Ok(())
}

fn write_effective_pretty(value: &EffectiveConfig, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "resolved_output = \"{}\"", value.resolved_output)?;
    writeln!(w)?;
    let project = toml::to_string_pretty(&value.project)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    write!(w, "{project}")?;
    if let Some(out) = &value.user.output {
        writeln!(w)?;
        writeln!(w, "[user]")?;
        writeln!(w, "output = \"{out}\"")?;
    }
    Ok(())
}

/// Render a unit-like serde enum as its bare string form.
fn toml_scalar<T: serde::Serialize>(value: &T) -> Option<String> {
    match Value::try_from(value).ok()? {
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
