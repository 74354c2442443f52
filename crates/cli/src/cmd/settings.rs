//! Implementation of the `cairn settings` command.

use anyhow::Result;

use super::SettingsArgs;
use crate::output::{OutputFormat, print_json, print_stat, print_warning};
use cairn_lib::settings::SettingsAxis;

/// Print the effective settings context and its fingerprint.
pub fn cmd_settings(args: &SettingsArgs, output: OutputFormat) -> Result<()> {
  let context = args.effective_settings()?;
  let fingerprint = context.fingerprint();

  if output.is_json() {
    print_json(&serde_json::json!({
      "settings": context,
      "fingerprint": fingerprint,
    }))?;
    return Ok(());
  }

  for (axis, value) in context.iter() {
    print_stat(axis.as_str(), value);
  }
  print_stat("fingerprint", fingerprint.as_str());

  if let Some(axis) = context.first_missing(&SettingsAxis::ALL) {
    print_warning(&format!("Axis '{}' is not set; recipes that require it will fail", axis));
  }

  Ok(())
}
