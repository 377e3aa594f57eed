//! Client configuration.
//!
//! Layers, later ones win:
//!
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. `TABLINK_*` environment variables (`TABLINK_SERVER_URL`, `TABLINK_TOKEN`,
//!    `TABLINK_DATABASE`, `TABLINK_ACCOUNT_ID`, `TABLINK_TIMEOUT_SECS`)

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TABLINK";

/// Connection settings for [`Client::from_config`](crate::Client::from_config)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Endpoint receiving the JSON calls
    pub server_url: String,
    /// Authentication token attached to every call
    pub token: Option<String>,
    /// Default database for the CLI
    pub database: Option<String>,
    /// Account id of the caller, used by duplicate-match resolution
    pub account_id: Option<String>,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8383/api".to_string(),
            token: None,
            database: None,
            account_id: None,
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Load defaults, then `path` (if any), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| Error::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Load defaults and the environment only.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Render as a TOML document.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
