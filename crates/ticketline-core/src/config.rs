use anyhow::{Context, Result};
use chrono::{FixedOffset, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::hours::{BusinessHours, WallClock, WorkingHours};
use crate::model::status::{StatusClass, StatusVocabulary};
use crate::time::TimestampParser;

/// Project-level engine configuration (`.ticketline/config.toml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub hours: HoursConfig,
    #[serde(default)]
    pub statuses: StatusVocabulary,
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Which elapsed-time calendar durations are measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoursPolicy {
    /// Working weekdays inside a daily window only.
    Business,
    /// Every hour counts (24x7).
    WallClock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursConfig {
    #[serde(default = "default_policy")]
    pub policy: HoursPolicy,
    #[serde(default = "default_workdays")]
    pub workdays: Vec<String>,
    #[serde(default = "default_day_start")]
    pub day_start: String,
    #[serde(default = "default_day_end")]
    pub day_end: String,
    /// Offset applied to offset-less source timestamps and to the
    /// business-day calendar.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for HoursConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            workdays: default_workdays(),
            day_start: default_day_start(),
            day_end: default_day_end(),
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Flag tickets that are currently blocked while their log does not end
    /// in a block.
    #[serde(default = "default_true")]
    pub flag_status_log_mismatch: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            flag_status_log_mismatch: default_true(),
        }
    }
}

/// An engine configuration value that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key} '{value}': expected HH:MM")]
    InvalidTime { key: &'static str, value: String },

    #[error("invalid weekday '{0}': expected mon..sun")]
    InvalidWeekday(String),

    #[error("business-hours window {start}..{end} is empty")]
    EmptyWindow { start: String, end: String },

    #[error("utc_offset_minutes {0} is out of range")]
    InvalidOffset(i32),

    #[error("statuses.{class} must start with a label that classifies as {class}")]
    UnusableSynthesisLabel { class: StatusClass },
}

impl ProjectConfig {
    /// The status vocabulary, checked for use by event synthesis.
    ///
    /// Synthesized events carry the first `blocked` and `unblocked` labels,
    /// so each must classify back into its own class.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnusableSynthesisLabel`] for an empty list, a
    /// blank first label, or a first label claimed by an earlier class.
    pub fn vocabulary(&self) -> Result<StatusVocabulary, ConfigError> {
        let statuses = &self.statuses;
        let checks = [
            (statuses.blocked.first(), StatusClass::Blocked),
            (statuses.unblocked.first(), StatusClass::Unblocked),
        ];
        for (label, class) in checks {
            if label.is_none_or(|label| statuses.classify(label) != class) {
                return Err(ConfigError::UnusableSynthesisLabel { class });
            }
        }
        Ok(statuses.clone())
    }
}

impl HoursConfig {
    /// The fixed offset for naive timestamps and the business calendar.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOffset`] outside of +/- 24 hours.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::InvalidOffset(self.utc_offset_minutes))
    }

    /// Build the configured working-hours strategy.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unparseable times or weekdays, an empty
    /// daily window, or an out-of-range offset.
    pub fn build_strategy(&self) -> Result<Box<dyn WorkingHours>, ConfigError> {
        match self.policy {
            HoursPolicy::WallClock => Ok(Box::new(WallClock)),
            HoursPolicy::Business => {
                let start = parse_clock("day_start", &self.day_start)?;
                let end = parse_clock("day_end", &self.day_end)?;
                let workdays = self
                    .workdays
                    .iter()
                    .map(|day| {
                        day.parse::<Weekday>()
                            .map_err(|_| ConfigError::InvalidWeekday(day.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let calendar = BusinessHours::new(workdays, start, end, self.offset()?)
                    .ok_or_else(|| ConfigError::EmptyWindow {
                        start: self.day_start.clone(),
                        end: self.day_end.clone(),
                    })?;
                Ok(Box::new(calendar))
            }
        }
    }

    /// Timestamp parser reading naive timestamps at the configured offset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOffset`] for an out-of-range offset.
    pub fn timestamp_parser(&self) -> Result<TimestampParser, ConfigError> {
        Ok(TimestampParser::new(self.offset()?))
    }
}

fn parse_clock(key: &'static str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| ConfigError::InvalidTime {
        key,
        value: value.to_string(),
    })
}

/// Per-user preferences (`<config_dir>/ticketline/config.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

#[must_use]
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".ticketline/config.toml")
}

#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ticketline/config.toml"))
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_config_path(project_root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(path) = user_config_path() else {
        return Ok(UserConfig::default());
    };

    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Combine the project file with an already-loaded user config and the
/// output mode the caller resolved.
pub fn resolve_config(
    project_root: &Path,
    user: UserConfig,
    resolved_output: impl Into<String>,
) -> Result<EffectiveConfig> {
    Ok(EffectiveConfig {
        project: load_project_config(project_root)?,
        user,
        resolved_output: resolved_output.into(),
    })
}

const fn default_true() -> bool {
    true
}

const fn default_policy() -> HoursPolicy {
    HoursPolicy::Business
}

fn default_workdays() -> Vec<String> {
    ["mon", "tue", "wed", "thu", "fri"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_day_start() -> String {
    "08:30".to_string()
}

fn default_day_end() -> String {
    "17:30".to_string()
}
