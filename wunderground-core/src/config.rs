use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use crate::{Client, ClientBuilder, MemoryCache, ResponseFormat};

/// Settings stored on disk for front-ends such as the CLI.
///
/// The [`Client`] never reads this itself; it is turned into a
/// [`ClientBuilder`] with [`Config::client_builder`].
///
/// Example TOML:
/// ```toml
/// api_key = "0123456789abcdef"
/// format = "json"
/// lang = "EN"
/// cache_timeout_secs = 60
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,

    /// "json" or "xml".
    pub format: Option<String>,

    pub lang: Option<String>,

    pub cache_timeout_secs: Option<u64>,

    /// Unset means requests are not bounded.
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "wunderground", "wunderground-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn response_format(&self) -> Result<ResponseFormat> {
        match &self.format {
            Some(format) => Ok(ResponseFormat::try_from(format.as_str())?),
            None => Ok(ResponseFormat::default()),
        }
    }

    /// A cache sized by `cache_timeout_secs`, or the 60 second default.
    pub fn memory_cache(&self) -> MemoryCache {
        self.cache_timeout_secs.map(MemoryCache::from_secs).unwrap_or_default()
    }

    /// Builder pre-populated from this config. No cache is attached.
    pub fn client_builder(&self) -> Result<ClientBuilder> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `wunderground configure` and enter your API key."
            )
        })?;

        let mut builder = Client::builder(api_key).format(self.response_format()?.as_str());
        if let Some(lang) = &self.lang {
            builder = builder.lang(lang.as_str());
        }
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(builder)
    }

    /// Build a client that shares `cache`, if one is given.
    pub fn client(&self, cache: Option<Arc<MemoryCache>>) -> Result<Client> {
        let mut builder = self.client_builder()?;
        if let Some(cache) = cache {
            builder = builder.cache(cache);
        }
        Ok(builder.build()?)
    }
}
