//! Settings profiles.
//!
//! A profile is a TOML file with a `[settings]` table:
//!
//! ```toml
//! [settings]
//! os = "linux"
//! compiler = "gcc"
//! compiler_version = "13"
//! build_type = "Release"
//! ```
//!
//! Axis aliases are accepted as keys. A dotted `compiler.version` key parses
//! as a nested table in TOML and is flattened back to its dotted name.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::{SettingsContext, SettingsError, validate_value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileFile {
  #[serde(default)]
  settings: BTreeMap<String, toml::Value>,
}

/// Load a profile from disk.
pub fn load_profile(path: &Path) -> Result<SettingsContext, SettingsError> {
  let content = std::fs::read_to_string(path).map_err(|source| SettingsError::ProfileRead {
    path: path.to_path_buf(),
    source,
  })?;
  let ctx = parse_profile(&content, path)?;
  debug!(path = %path.display(), axes = ctx.len(), "loaded profile");
  Ok(ctx)
}

/// Parse profile text; `path` is used for error messages only.
pub fn parse_profile(content: &str, path: &Path) -> Result<SettingsContext, SettingsError> {
  let file: ProfileFile = toml::from_str(content).map_err(|e| SettingsError::ProfileParse {
    path: path.to_path_buf(),
    message: e.to_string(),
  })?;

  let mut flat = Vec::new();
  for (key, value) in file.settings {
    flatten(&key, value, &mut flat, path)?;
  }

  let mut ctx = SettingsContext::new();
  for (key, value) in flat {
    let axis = key.parse()?;
    validate_value(&format!("{}={}", key, value), &value)?;
    ctx.set(axis, value);
  }
  Ok(ctx)
}

fn flatten(
  key: &str,
  value: toml::Value,
  out: &mut Vec<(String, String)>,
  path: &Path,
) -> Result<(), SettingsError> {
  match value {
    toml::Value::String(s) => out.push((key.to_string(), s)),
    toml::Value::Integer(i) => out.push((key.to_string(), i.to_string())),
    toml::Value::Float(f) => out.push((key.to_string(), f.to_string())),
    toml::Value::Table(table) => {
      for (sub, v) in table {
        flatten(&format!("{}.{}", key, sub), v, out, path)?;
      }
    }
    other => {
      return Err(SettingsError::ProfileParse {
        path: path.to_path_buf(),
        message: format!("setting '{}' must be a string, got {}", key, other.type_str()),
      });
    }
  }
  Ok(())
}
