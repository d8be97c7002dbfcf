//! Configuration for the four-pillar calendar tools.
//!
//! Read from `$BAZI_CONFIG` when set, else `~/.bazi/config.toml`. Every
//! section is optional; a missing file is not an error.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "BAZI_CONFIG";

/// Accepted civil offsets, in minutes east of UTC (UTC-12 through UTC+14).
pub const UTC_OFFSET_RANGE: std::ops::RangeInclusive<i32> = -720..=840;

/// Check a civil offset against [`UTC_OFFSET_RANGE`].
pub fn check_utc_offset(minutes: i32) -> Result<i32, String> {
    if UTC_OFFSET_RANGE.contains(&minutes) {
        Ok(minutes)
    } else {
        Err(format!(
            "utc offset {minutes} is outside {}..={} minutes",
            UTC_OFFSET_RANGE.start(),
            UTC_OFFSET_RANGE.end()
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BaziConfig {
    pub calendar: Option<CalendarConfig>,
    pub batch: Option<BatchConfig>,
    pub output: Option<OutputConfig>,
    pub reference: Option<ReferenceConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config at {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CalendarConfig {
    /// Civil offset used for calendar days and solar-term instants. Defaults to +480 (UTC+8).
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchConfig {
    pub max_workers: Option<usize>,
    /// Whole-batch deadline in seconds.
    pub deadline_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    pub format: Option<OutputFormat>,
    /// Add `encoded_` integer columns next to the life-cycle columns.
    #[serde(default)]
    pub encode_life_cycle: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReferenceConfig {
    /// Local reference date-time of the entity, e.g. `"1969-11-24T09:00:00"`.
    pub base: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" | "json" => Ok(Self::Jsonl),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format '{other}' (expected jsonl or csv)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jsonl => "jsonl",
            Self::Csv => "csv",
        })
    }
}

impl BaziConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        Self::load_from(&path)
    }

    /// Load from an explicit path. A missing file yields `Ok(None)`.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        let config: Self = match toml::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        config.validate(path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Some(config))
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        };
        if let Some(offset) = self.utc_offset_minutes() {
            check_utc_offset(offset)
                .map_err(|reason| invalid(format!("calendar.utc_offset_minutes: {reason}")))?;
        }
        if self.batch.as_ref().and_then(|b| b.max_workers) == Some(0) {
            return Err(invalid("batch.max_workers must be at least 1".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn utc_offset_minutes(&self) -> Option<i32> {
        self.calendar.as_ref().and_then(|c| c.utc_offset_minutes)
    }

    #[must_use]
    pub fn max_workers(&self) -> Option<usize> {
        self.batch.as_ref().and_then(|b| b.max_workers)
    }

    #[must_use]
    pub fn deadline_secs(&self) -> Option<u64> {
        self.batch.as_ref().and_then(|b| b.deadline_secs)
    }

    #[must_use]
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output.as_ref().and_then(|o| o.format)
    }

    #[must_use]
    pub fn encode_life_cycle(&self) -> bool {
        self.output.as_ref().is_some_and(|o| o.encode_life_cycle)
    }

    #[must_use]
    pub fn reference_base(&self) -> Option<&str> {
        self.reference.as_ref().and_then(|r| r.base.as_deref())
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(explicit));
    }
    dirs::home_dir().map(|home| home.join(".bazi").join("config.toml"))
}
