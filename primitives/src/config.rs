use once_cell::sync::Lazy;
use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::ApiUrl;

pub use toml::de::Error as TomlError;

pub static DEVELOPMENT_CONFIG: Lazy<Config> = Lazy::new(|| {
    Config::try_toml(include_str!("../../docs/config/dev.toml"))
        .expect("Failed to parse dev.toml config file")
});

pub static PRODUCTION_CONFIG: Lazy<Config> = Lazy::new(|| {
    Config::try_toml(include_str!("../../docs/config/prod.toml"))
        .expect("Failed to parse prod.toml config file")
});

/// The environment in which the application is running.
/// Defaults to [`Environment::Development`].
#[derive(Debug, Display, FromStr, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
#[display(style = "camelCase")]
pub enum Environment {
    /// The default development setup is an Ad Store running locally.
    Development,
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Self::Development
    }
}

/// The configuration shared by all Ad Store clients.
///
/// The base url of the store is a configuration value resolved at startup,
/// never a compiled-in constant.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub ad_store_url: ApiUrl,
    /// The Client timeout for requests to the Ad Store.
    /// In milliseconds
    pub fetch_timeout: u32,
    /// `watch` mode refresh of the analytics stats.
    /// In seconds
    pub stats_poll_interval: u32,
    /// `watch` mode refresh of the ad list.
    /// In seconds
    pub ads_poll_interval: u32,
    /// Whether failed impression/click records should be queued
    /// and retried (at-least-once), instead of being dropped.
    pub retry_analytics: bool,
}

impl Config {
    /// Utility method that will deserialize a Toml file content into a [`Config`].
    ///
    /// Instead of relying on the `toml` crate directly, use this method instead.
    pub fn try_toml(toml: &str) -> Result<Self, TomlError> {
        toml::from_str(toml)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Toml parsing: {0}")]
    Toml(#[from] TomlError),
    #[error("File reading: {0}")]
    InvalidFile(#[from] std::io::Error),
}

/// If no `config_file` path is provided it will load the [`Environment`] configuration.
/// If a `config_file` path is provided it will try to read and parse the file in Toml format.
pub fn configuration(
    environment: Environment,
    config_file: Option<&str>,
) -> Result<Config, ConfigError> {
    match config_file {
        Some(config_file) => {
            let content = std::fs::read(config_file)?;

            Ok(toml::from_slice(&content)?)
        }
        None => match environment {
            Environment::Production => Ok(PRODUCTION_CONFIG.clone()),
            Environment::Development => Ok(DEVELOPMENT_CONFIG.clone()),
        },
    }
}
