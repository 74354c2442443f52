//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output: colored status
//! messages, Unicode symbols, JSON output and structured failure reports.

use anyhow::Context;
use cairn_lib::pipeline::PipelineError;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// Machine-readable description of a failed command.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FailureReport {
  pub kind: String,
  pub message: String,
  pub path: Option<String>,
}

impl FailureReport {
  pub fn from_error(err: &anyhow::Error) -> Self {
    match err.downcast_ref::<PipelineError>() {
      Some(pipeline) => Self {
        kind: pipeline.kind().to_string(),
        message: pipeline.to_string(),
        path: pipeline.package_path(),
      },
      None => Self {
        kind: "Error".to_string(),
        message: format!("{:#}", err),
        path: None,
      },
    }
  }
}

/// Report a failure: text on stderr, or a JSON object on stdout.
pub fn print_failure(err: &anyhow::Error, format: OutputFormat) {
  let report = FailureReport::from_error(err);

  if format.is_json()
    && let Ok(json) = serde_json::to_string_pretty(&report)
  {
    println!("{}", json);
    return;
  }

  print_error(&format!("{}: {}", report.kind, report.message));
  if let Some(path) = &report.path {
    eprintln!("  {} {}", symbols::ARROW, path);
  }
}
