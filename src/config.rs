use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::cache::{CachePolicy, SqliteFeedStore, DEFAULT_MAX_AGE_DAYS};

/// Environment variable overriding `feed_url`.
pub const FEED_URL_ENV: &str = "FEEDCACHE_FEED_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  /// Remote feed endpoint
  pub feed_url: Option<Url>,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// SQLite file (defaults to the platform data directory)
  pub path: Option<PathBuf>,
  /// Days a cached feed stays valid
  #[serde(default = "default_max_age_days")]
  pub max_age_days: u32,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      path: None,
      max_age_days: DEFAULT_MAX_AGE_DAYS,
    }
  }
}

fn default_max_age_days() -> u32 {
  DEFAULT_MAX_AGE_DAYS
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Filter used when `FEEDCACHE_LOG` is unset
  #[serde(default = "default_level")]
  pub level: String,
  /// Write daily log files here instead of stderr
  pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_level(),
      directory: None,
    }
  }
}

fn default_level() -> String {
  "info".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./feedcache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/feedcache/config.yaml
  ///
  /// Falls back to defaults when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("feedcache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("feedcache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file deserializes to unit, not to an empty mapping
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Resolve the feed endpoint.
  ///
  /// A command-line value wins over `FEEDCACHE_FEED_URL`, which wins over
  /// the config file.
  pub fn feed_url(&self, flag: Option<Url>) -> Result<Url> {
    let env = std::env::var(FEED_URL_ENV).ok();
    self.resolve_feed_url(flag, env.as_deref())
  }

  fn resolve_feed_url(&self, flag: Option<Url>, env: Option<&str>) -> Result<Url> {
    if let Some(url) = flag {
      return Ok(url);
    }
    if let Some(raw) = env.filter(|s| !s.is_empty()) {
      return Url::parse(raw).map_err(|e| eyre!("Invalid {}: {}", FEED_URL_ENV, e));
    }
    self.feed_url.clone().ok_or_else(|| {
      eyre!(
        "No feed URL configured. Pass --feed-url, set {} or add feed_url to the config file.",
        FEED_URL_ENV
      )
    })
  }

  pub fn cache_path(&self) -> Result<PathBuf> {
    self
      .cache
      .path
      .clone()
      .or_else(SqliteFeedStore::default_path)
      .ok_or_else(|| eyre!("Could not determine a cache location. Set cache.path in the config file."))
  }

  pub fn cache_policy(&self) -> CachePolicy {
    CachePolicy::new(self.cache.max_age_days)
  }
}
