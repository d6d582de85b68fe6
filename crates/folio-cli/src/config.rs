use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use folio_core::Config;

const FOLIO_DIR: &str = ".folio";
const CONFIG_FILE: &str = "config.toml";

/// `~/.folio`, home of the config file, the log and the profile cache.
pub fn folio_home() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine the home directory")?;
    Ok(home.join(FOLIO_DIR))
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(folio_home()?.join(CONFIG_FILE))
}

/// Loads `path`, or the default location when `None`. A missing file yields
/// the default config; a malformed one is an error.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&raw).with_context(|| format!("invalid config {}", path.display()))
}

pub fn parse_config(raw: &str) -> anyhow::Result<Config> {
    Ok(toml::from_str(raw)?)
}

pub fn profile_cache_path(config: &Config) -> anyhow::Result<PathBuf> {
    match &config.services.profile_cache_path {
        Some(path) => Ok(path.clone()),
        None => Ok(folio_home()?.join("profile-cache.json")),
    }
}
