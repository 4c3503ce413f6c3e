//! Navigator configuration
//!
//! Loaded from YAML (`NavigatorConfig::from_file`) or from the environment
//! (`NavigatorConfig::from_env`, which reads `.env` first). Every field has a
//! default so a partial file is enough.

use std::path::Path;

use serde::Deserialize;

use crate::error::{NavError, Result};

pub const ENV_API_URL: &str = "CONSTELLATIONS_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "CONSTELLATIONS_TIMEOUT_SECS";
pub const ENV_PREFETCH: &str = "CONSTELLATIONS_PREFETCH";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Base URL of the scene API
    pub api_url: String,
    pub request_timeout_secs: u64,
    /// Page fetch attempts per coverage call
    pub max_fetch_attempts: u32,
    /// `size` parameter for the nearby feed
    pub nearby_page_size: u32,
    /// Coverage target requested after a feed switch
    pub prefetch: usize,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:7000".to_string(),
            request_timeout_secs: 30,
            max_fetch_attempts: 5,
            nearby_page_size: 30,
            prefetch: 3,
        }
    }
}

impl NavigatorConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| NavError::Config(format!("invalid navigator config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `CONSTELLATIONS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_API_URL) {
            config.api_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            config.request_timeout_secs = parse_var(ENV_TIMEOUT_SECS, &secs)?;
        }
        if let Some(prefetch) = lookup(ENV_PREFETCH) {
            config.prefetch = parse_var(ENV_PREFETCH, &prefetch)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_fetch_attempts == 0 {
            return Err(NavError::Config(
                "max_fetch_attempts must be at least 1".to_string(),
            ));
        }
        if self.api_url.trim().is_empty() {
            return Err(NavError::Config("api_url must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| NavError::Config(format!("{key}={value:?}: {e}")))
}
