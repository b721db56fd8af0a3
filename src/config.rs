use crate::digest::DEFAULT_KEY_PERCENTILES;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Widest key latency bar the text report will draw.
pub const MAX_BAR_WIDTH: usize = 200;
/// More decimal places than an f64 latency can carry.
pub const MAX_LATENCY_PRECISION: usize = 17;

/// Top-level configuration loaded from chbench.toml.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub report: ReportConfig,
}

/// Output format of the rendered report.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub format: OutputFormat,
    pub key_percentiles: Vec<f64>,
    /// Decimal places for latencies in text output.
    pub latency_precision: usize,
    /// Width in characters of the longest bar in the key latency chart.
    pub bar_width: usize,
    pub strict: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            key_percentiles: DEFAULT_KEY_PERCENTILES.to_vec(),
            latency_precision: 3,
            bar_width: 40,
            strict: false,
        }
    }
}

impl Config {
    /// Check values serde cannot constrain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(p) = self
            .report
            .key_percentiles
            .iter()
            .find(|p| !(0.0..=100.0).contains(*p))
        {
            return Err(ConfigError::Invalid(format!(
                "key percentile {p} is outside 0..=100"
            )));
        }
        if self.report.bar_width == 0 || self.report.bar_width > MAX_BAR_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "bar_width must be between 1 and {MAX_BAR_WIDTH}"
            )));
        }
        if self.report.latency_precision > MAX_LATENCY_PRECISION {
            return Err(ConfigError::Invalid(format!(
                "latency_precision must be at most {MAX_LATENCY_PRECISION}"
            )));
        }
        Ok(())
    }
}

/// Load config from `path`.
///
/// A missing file falls back to defaults unless `required` is set, which is
/// the case when the path was given explicitly on the command line.
pub fn load_config(path: &Path, required: bool) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let config: Config = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;

    tracing::debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

/// Errors from loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}
