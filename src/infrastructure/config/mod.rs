//! Configuration loading with hierarchical merging.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("worker.source_path cannot be empty")]
    EmptySourcePath,

    #[error("worker.command cannot be empty")]
    EmptyCommand,

    #[error("invalid worker.poll_interval_secs: {0}. Must be at least 1")]
    InvalidPollInterval(u64),

    #[error("invalid evolution.max_proposal_attempts: {0}. Cannot be 0")]
    InvalidMaxProposalAttempts(u32),

    #[error("invalid logging level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("invalid logging format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `symbiont.yaml` (project config)
    /// 3. `symbiont.local.yaml` (local overrides, optional)
    /// 4. Environment variables (`SYMBIONT_*` prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("symbiont.yaml"))
            .merge(Yaml::file("symbiont.local.yaml"))
            .merge(Env::prefixed("SYMBIONT_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, skipping the default
    /// chain.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.worker.source_path.is_empty() {
            return Err(ConfigError::EmptySourcePath);
        }

        if config.worker.command.is_empty() {
            return Err(ConfigError::EmptyCommand);
        }

        if config.worker.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval(
                config.worker.poll_interval_secs,
            ));
        }

        if config.evolution.max_proposal_attempts == 0 {
            return Err(ConfigError::InvalidMaxProposalAttempts(
                config.evolution.max_proposal_attempts,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(ConfigLoader::validate(&Config::default()).is_ok());
    }

    #[test]
    fn rejects_empty_command() {
        let mut config = Config::default();
        config.worker.command = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyCommand)
        ));
    }

    #[test]
    fn rejects_zero_proposal_attempts() {
        let mut config = Config::default();
        config.evolution.max_proposal_attempts = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxProposalAttempts(0))
        ));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }
}
