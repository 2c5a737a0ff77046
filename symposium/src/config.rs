//! Runtime configuration.
//!
//! Values are layered with the `config` crate: built-in defaults, then an
//! optional JSON file, then `SYMPOSIUM_*` environment variables, then
//! whatever the caller sets last (for example command-line flags).
//!
//! Environment variables name a field after the prefix, with `__` between
//! nested keys: `SYMPOSIUM_MAX_TOPIC_LENGTH=280`,
//! `SYMPOSIUM_LOGGING__FORMAT=json`, `SYMPOSIUM_MODERATION_QUOTA__CALLS=5`.

use crate::errors::ConfigError;
use crate::logging::LoggingConfig;
use crate::moderation::DEFAULT_MAX_TOPIC_LENGTH;
use crate::pipeline::{StageTemplates, DEFAULT_STAGE_TIMEOUT};
use crate::ratelimit::{Quota, DEFAULT_CALLS, DEFAULT_PERIOD_SECS};
use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix of environment variables read by [`SymposiumConfig::load`].
pub const ENV_PREFIX: &str = "SYMPOSIUM";

/// Separator between nested keys in environment variable names.
pub const ENV_SEPARATOR: &str = "__";

/// Rate quota as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Maximum calls per period.
    pub calls: u32,
    /// Period length in seconds.
    pub period_secs: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            calls: DEFAULT_CALLS,
            period_secs: DEFAULT_PERIOD_SECS,
        }
    }
}

impl QuotaConfig {
    /// Converts to a validated [`Quota`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidQuota` for zero calls or a zero period.
    pub fn to_quota(self) -> Result<Quota, ConfigError> {
        Quota::new(self.calls, Duration::from_secs(self.period_secs))
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymposiumConfig {
    /// Maximum topic length in characters.
    pub max_topic_length: usize,
    /// Quota for moderation calls.
    pub moderation_quota: QuotaConfig,
    /// Timeout for one moderation call, in seconds.
    pub moderation_timeout_secs: u64,
    /// Timeout for one stage call, in seconds.
    pub stage_timeout_secs: u64,
    /// Stage request templates.
    pub templates: StageTemplates,
    /// Logging setup.
    pub logging: LoggingConfig,
}

impl Default for SymposiumConfig {
    fn default() -> Self {
        Self {
            max_topic_length: DEFAULT_MAX_TOPIC_LENGTH,
            moderation_quota: QuotaConfig::default(),
            moderation_timeout_secs: 30,
            stage_timeout_secs: DEFAULT_STAGE_TIMEOUT.as_secs(),
            templates: StageTemplates::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SymposiumConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads defaults, then the JSON file at `path` if one is given, then
    /// `SYMPOSIUM_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Source` if the file is missing or malformed, or
    /// if a value does not fit its field.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), reading variables from `vars` instead of
    /// the process environment when given.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_with_env(
        path: Option<&Path>,
        vars: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator(ENV_SEPARATOR)
            .source(vars);

        let config = Self::layered(path)?.add_source(environment).build()?;
        config.try_deserialize().map_err(ConfigError::from)
    }

    /// Loads defaults overlaid with a JSON file; missing keys keep defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Source` if the file is missing or malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::layered(Some(path.as_ref()))?.build()?;
        config.try_deserialize().map_err(ConfigError::from)
    }

    fn layered(path: Option<&Path>) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Json).required(true));
        }
        Ok(builder)
    }

    /// Sets the maximum topic length.
    #[must_use]
    pub fn with_max_topic_length(mut self, max: usize) -> Self {
        self.max_topic_length = max;
        self
    }

    /// Sets the moderation quota.
    #[must_use]
    pub fn with_moderation_quota(mut self, calls: u32, period_secs: u64) -> Self {
        self.moderation_quota = QuotaConfig { calls, period_secs };
        self
    }

    /// Sets the moderation call timeout in seconds.
    #[must_use]
    pub fn with_moderation_timeout_secs(mut self, secs: u64) -> Self {
        self.moderation_timeout_secs = secs;
        self
    }

    /// Sets the stage call timeout in seconds.
    #[must_use]
    pub fn with_stage_timeout_secs(mut self, secs: u64) -> Self {
        self.stage_timeout_secs = secs;
        self
    }

    /// Sets the stage templates.
    #[must_use]
    pub fn with_templates(mut self, templates: StageTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Returns the moderation call timeout.
    #[must_use]
    pub const fn moderation_timeout(&self) -> Duration {
        Duration::from_secs(self.moderation_timeout_secs)
    }

    /// Returns the stage call timeout.
    #[must_use]
    pub const fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    /// Checks the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_topic_length == 0 {
            return Err(ConfigError::Invalid(
                "max_topic_length must be at least 1".to_string(),
            ));
        }
        if self.moderation_timeout_secs == 0 || self.stage_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be at least 1 second".to_string(),
            ));
        }
        self.moderation_quota.to_quota()?;
        self.templates.validate()?;
        Ok(())
    }
}
