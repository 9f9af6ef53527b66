//! Orchestrator configuration with layered loading.
//!
//! Raw input is collected into a [`PartialConfig`] where every field is
//! optional, then [`PartialConfig::resolve`] fills in defaults and produces an
//! immutable [`ScrapyardConfig`]. Sources, highest precedence first:
//!
//! 1. Environment variables (SCRAPYARD_*)
//! 2. TOML config file (if SCRAPYARD_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

mod duration;
mod validation;

pub use duration::parse_duration;
pub use validation::ConfigError;

/// A freshness value as written by the user: milliseconds or a duration string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationSetting {
    Millis(u64),
    Text(String),
}

impl DurationSetting {
    fn to_duration(&self, field: &str) -> Result<Duration, ConfigError> {
        match self {
            DurationSetting::Millis(ms) => Ok(Duration::from_millis(*ms)),
            DurationSetting::Text(text) => parse_duration(text)
                .map_err(|reason| ConfigError::Invalid { field: field.into(), reason }),
        }
    }
}

/// Unresolved configuration input; absent fields take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialConfig {
    /// Maximum attempts per request.
    #[serde(default)]
    pub retry: Option<u32>,

    /// Maximum concurrent outbound requests.
    #[serde(default)]
    pub connections: Option<usize>,

    /// Cache root directory. Empty disables caching.
    #[serde(default)]
    pub cache: Option<String>,

    /// How long a cached entry stays usable. Zero never expires.
    ///
    /// Also accepted under its older name `bestbefore`.
    #[serde(default, alias = "bestbefore")]
    pub freshness: Option<DurationSetting>,

    /// Older name for `freshness`; only consulted when `freshness` is unset.
    #[serde(default)]
    pub timeout: Option<DurationSetting>,

    /// Enables diagnostic logging.
    #[serde(default)]
    pub debug: Option<bool>,

    /// User-Agent header for outbound requests.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Per-request transport timeout in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Resolved, immutable orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapyardConfig {
    /// Retry ceiling: the number of attempts permitted per request.
    pub retry: u32,
    /// Worker pool size.
    pub connections: usize,
    /// Cache root, or `None` when caching is disabled.
    pub cache: Option<PathBuf>,
    /// Freshness window for cached entries.
    pub freshness: Duration,
    /// Diagnostic output only; no behavioral effect.
    pub debug: bool,
    pub user_agent: String,
    pub timeout_ms: u64,
}

pub const DEFAULT_RETRY: u32 = 5;
pub const DEFAULT_CONNECTIONS: usize = 5;
pub const DEFAULT_USER_AGENT: &str = "scrapyard/0.1";
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

impl Default for ScrapyardConfig {
    fn default() -> Self {
        Self {
            retry: DEFAULT_RETRY,
            connections: DEFAULT_CONNECTIONS,
            cache: None,
            freshness: Duration::ZERO,
            debug: false,
            user_agent: DEFAULT_USER_AGENT.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl PartialConfig {
    /// Fill in defaults for every absent field.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a freshness string cannot be parsed.
    pub fn resolve(&self) -> Result<ScrapyardConfig, ConfigError> {
        let freshness = match (&self.freshness, &self.timeout) {
            (Some(setting), _) => setting.to_duration("freshness")?,
            (None, Some(setting)) => setting.to_duration("timeout")?,
            (None, None) => Duration::ZERO,
        };

        let cache = self
            .cache
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(ScrapyardConfig {
            retry: self.retry.unwrap_or(DEFAULT_RETRY),
            connections: self.connections.unwrap_or(DEFAULT_CONNECTIONS),
            cache,
            freshness,
            debug: self.debug.unwrap_or(false),
            user_agent: self.user_agent.clone().unwrap_or_else(|| DEFAULT_USER_AGENT.into()),
            timeout_ms: self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        })
    }
}

impl ScrapyardConfig {
    /// Transport timeout as a Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whether a cache directory is configured.
    pub fn caching_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Resolve and validate a partial configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if resolution or validation fails.
    pub fn from_partial(partial: &PartialConfig) -> Result<Self, ConfigError> {
        let config = partial.resolve()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SCRAPYARD_`
    /// 2. TOML file from `SCRAPYARD_CONFIG_FILE` (if set)
    /// 3. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::new();

        if let Ok(config_path) = std::env::var("SCRAPYARD_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SCRAPYARD_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let partial: PartialConfig = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        Self::from_partial(&partial)
    }
}
