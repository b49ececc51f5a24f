//! Runtime configuration for the admin binary.
//!
//! Settings are layered: built-in defaults, then the optional TOML file, then
//! `SHAREHOLDERS_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Deserialised from `shareholders.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
  /// SQLite database file; a leading `~/` is expanded.
  pub store_path: PathBuf,
}

impl AdminConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("store_path", "shareholders.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("SHAREHOLDERS"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: AdminConfig = settings
      .try_deserialize()
      .context("failed to deserialise AdminConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
