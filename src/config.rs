/// Configuration file handling.
///
/// Settings come from `<data_root>/config.toml` (or an explicit path) with
/// per-field defaults, then CLI overrides. The aggregation core only ever
/// sees the values built here, never the environment.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::clock::SystemClock;
use crate::summarizer::{
    ConfiguredSummarizer, DisabledSummarizer, HttpSummarizer, HttpSummarizerSettings,
};
use crate::timefmt::parse_utc_offset;
use crate::window::AnalysisWindow;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "CHANSTAT_DATA_DIR";

/// Data root used when [`DATA_DIR_ENV`] is unset.
pub const DEFAULT_DATA_DIR: &str = ".chanstat";

pub fn resolve_data_root() -> PathBuf {
    match env::var_os(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(DEFAULT_DATA_DIR),
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub summarizer: SummarizerConfig,

    #[serde(default)]
    pub quota: QuotaConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scan bounds and local time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Hard cap on posts scanned.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Cutoff age in days.
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Fixed offset used for hour and day bucketing, e.g. `+03:30`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            window_days: default_window_days(),
            utc_offset: default_utc_offset(),
        }
    }
}

fn default_max_messages() -> usize {
    100
}

fn default_window_days() -> u32 {
    7
}

fn default_utc_offset() -> String {
    "+03:30".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Channel archive directory; relative paths hang off the data root.
    #[serde(default = "default_archive_dir")]
    pub dir: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            dir: default_archive_dir(),
        }
    }
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("archive")
}

/// Content summarizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Chat-completions URL. Unset disables the summarizer.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Language the summary is written in.
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_timeout(),
            language: default_language(),
            temperature: default_temperature(),
        }
    }
}

fn default_model() -> String {
    "google/gemini-pro".to_string()
}

fn default_api_key_env() -> String {
    "CHANSTAT_SUMMARIZER_KEY".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_language() -> String {
    "English".to_string()
}

fn default_temperature() -> f32 {
    0.4
}

/// Per-user analysis allowance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Free analyses granted on registration.
    #[serde(default = "default_free_analyses")]
    pub free_analyses: u32,

    /// Analyses credited to a referrer per referred user.
    #[serde(default = "default_referral_reward")]
    pub referral_reward: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_analyses: default_free_analyses(),
            referral_reward: default_referral_reward(),
        }
    }
}

fn default_free_analyses() -> u32 {
    2
}

fn default_referral_reward() -> u32 {
    5
}

/// Session log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info,chanstat=debug".to_string()
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub window_days: Option<u32>,
    pub max_messages: Option<usize>,
    pub utc_offset: Option<String>,
    pub archive: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load `explicit`, else `<data_root>/config.toml` if present, else defaults.
    pub fn discover(explicit: Option<&Path>, data_root: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = data_root.join("config.toml");
        if default_path.exists() {
            Self::load(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(days) = overrides.window_days {
            self.analysis.window_days = days;
        }
        if let Some(max) = overrides.max_messages {
            self.analysis.max_messages = max;
        }
        if let Some(offset) = overrides.utc_offset {
            self.analysis.utc_offset = offset;
        }
        if let Some(dir) = overrides.archive {
            self.archive.dir = dir;
        }
    }

    pub fn analysis_window(&self) -> Result<AnalysisWindow> {
        AnalysisWindow::new(self.analysis.max_messages, self.analysis.window_days)
    }

    pub fn clock(&self) -> Result<SystemClock> {
        let offset = parse_utc_offset(&self.analysis.utc_offset)?;
        Ok(SystemClock::new(offset))
    }

    pub fn archive_dir(&self, data_root: &Path) -> PathBuf {
        if self.archive.dir.is_absolute() {
            self.archive.dir.clone()
        } else {
            data_root.join(&self.archive.dir)
        }
    }

    /// Build the configured summarizer.
    ///
    /// No endpoint means disabled. An endpoint without its API key in the
    /// environment is a configuration error.
    pub fn summarizer(&self) -> Result<ConfiguredSummarizer> {
        let cfg = &self.summarizer;
        let Some(endpoint) = cfg.endpoint.clone() else {
            return Ok(ConfiguredSummarizer::Disabled(DisabledSummarizer));
        };
        let api_key = env::var(&cfg.api_key_env).map_err(|_| {
            anyhow!(
                "Summarizer endpoint is set but {} is not in the environment",
                cfg.api_key_env
            )
        })?;

        let http = HttpSummarizer::new(HttpSummarizerSettings {
            endpoint,
            model: cfg.model.clone(),
            api_key,
            timeout: Duration::from_secs(cfg.timeout_seconds),
            language: cfg.language.clone(),
            temperature: cfg.temperature,
        })
        .context("Failed to build summarizer HTTP client")?;
        Ok(ConfiguredSummarizer::Http(http))
    }
}
