use crate::consts::{APP_NAME, HOME_ENV};
use std::path::PathBuf;

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var("USERPROFILE").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns `$CAIRN_HOME` when set.
fn home_override() -> Option<PathBuf> {
  std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Returns the directory for configuration files (profiles)
#[cfg(windows)]
pub fn config_dir() -> PathBuf {
  if let Some(root) = home_override() {
    return root.join("config");
  }
  std::env::var("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir())
    .join(APP_NAME)
}

/// Returns the directory for configuration files (profiles)
#[cfg(not(windows))]
pub fn config_dir() -> PathBuf {
  if let Some(root) = home_override() {
    return root.join("config");
  }
  let config_home = std::env::var("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".config"));
  config_home.join(APP_NAME)
}

/// Returns the directory for cache files (resolution cache)
#[cfg(windows)]
pub fn cache_dir() -> PathBuf {
  if let Some(root) = home_override() {
    return root.join("cache");
  }
  std::env::var("LOCALAPPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir())
    .join(APP_NAME)
    .join("Cache")
}

/// Returns the directory for cache files (resolution cache)
#[cfg(not(windows))]
pub fn cache_dir() -> PathBuf {
  if let Some(root) = home_override() {
    return root.join("cache");
  }
  let cache_home = std::env::var("XDG_CACHE_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".cache"));
  cache_home.join(APP_NAME)
}

/// Returns the root under which resolved package folders live
pub fn packages_dir() -> PathBuf {
  match home_override() {
    Some(root) => root.join("p"),
    None => cache_dir().join("p"),
  }
}

/// Returns the path of the default settings profile
pub fn default_profile_path() -> PathBuf {
  config_dir().join("profiles").join("default.toml")
}
