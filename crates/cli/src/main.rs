mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{ResolveArgs, SettingsArgs, cmd_graph, cmd_install, cmd_settings};
use crate::output::{OutputFormat, print_failure};

/// cairn - resolve dependency recipes and generate build descriptors
#[derive(Parser)]
#[command(name = "cairn")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
  #[arg(short, long, global = true, action = ArgAction::Count)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve a recipe and write its build descriptors
  Install {
    #[command(flatten)]
    resolve: ResolveArgs,

    /// Directory receiving the generated files
    #[arg(long, default_value = "build")]
    output_folder: PathBuf,

    /// Output format
    #[arg(short = 'o', long = "format", value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Resolve a recipe and print the dependency graph
  Graph {
    #[command(flatten)]
    resolve: ResolveArgs,

    /// Output format
    #[arg(short = 'o', long = "format", value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Print the effective settings and their fingerprint
  Settings {
    #[command(flatten)]
    settings: SettingsArgs,

    /// Output format
    #[arg(short = 'o', long = "format", value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

impl Commands {
  fn output_format(&self) -> OutputFormat {
    match self {
      Commands::Install { output, .. } | Commands::Graph { output, .. } | Commands::Settings { output, .. } => *output,
    }
  }
}

fn init_tracing(verbosity: u8) {
  let level = match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let format = cli.command.output_format();
  let result = match cli.command {
    Commands::Install {
      resolve,
      output_folder,
      output,
    } => cmd_install(&resolve, output_folder, output),
    Commands::Graph { resolve, output } => cmd_graph(&resolve, cli.verbose > 0, output),
    Commands::Settings { settings, output } => cmd_settings(&settings, output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_failure(&err, format);
      ExitCode::FAILURE
    }
  }
}
