use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use url::Url;

/// The live LGPN server. Overridable for tests or mirrors.
pub const DEFAULT_ENDPOINT: &str = "http://clas-lgpn2.classics.ox.ac.uk";

/// Runtime configuration for name retrieval.
#[derive(Debug, Clone)]
pub struct Config {
  /// Scheme and host of the LGPN server.
  pub endpoint: Url,
  /// Directory holding the SQLite name cache.
  pub cache_dir: PathBuf,
}

impl Config {
  /// Build a config from an endpoint URL and an optional cache directory.
  ///
  /// When `cache_dir` is `None` a platform-appropriate per-application cache
  /// directory is selected. The directory is created lazily when the cache is
  /// first opened.
  pub fn new(endpoint: &str, cache_dir: Option<PathBuf>) -> Result<Self> {
    let endpoint =
      Url::parse(endpoint).map_err(|e| eyre!("invalid endpoint {}: {}", endpoint, e))?;

    let cache_dir = match cache_dir {
      Some(dir) => dir,
      None => Self::default_cache_dir()?,
    };

    Ok(Self {
      endpoint,
      cache_dir,
    })
  }

  fn default_cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".cache")))
      .ok_or_else(|| eyre!("Could not determine cache directory"))?;

    Ok(base.join("isopsephos"))
  }
}
