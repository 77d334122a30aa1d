use std::path::PathBuf;

use anstyle::{AnsiColor, Effects};
use clap::{Parser, builder::Styles};
use clap_verbosity_flag::{InfoLevel, Verbosity};

fn styles() -> Styles {
  Styles::styled()
    .header(AnsiColor::Green.on_default() | Effects::BOLD)
    .usage(AnsiColor::Green.on_default() | Effects::BOLD)
    .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
    .placeholder(AnsiColor::Cyan.on_default())
}

/// Capture every API resource of a cluster or must-gather bundle and compare captures
#[derive(Debug, Parser)]
#[command(author, about, version, styles = styles())]
pub struct Cli {
  /// Path to kubeconfig file (default: $KUBECONFIG or ~/.kube/config)
  #[arg(long)]
  pub kubeconfig: Option<PathBuf>,

  /// Path to first kubeconfig for cluster comparison
  #[arg(long)]
  pub kubeconfig1: Option<PathBuf>,

  /// Path to second kubeconfig for cluster comparison
  #[arg(long)]
  pub kubeconfig2: Option<PathBuf>,

  /// Path to must-gather directory for offline processing
  #[arg(long)]
  pub must_gather: Option<PathBuf>,

  /// Path to first must-gather directory for comparison
  #[arg(long)]
  pub must_gather1: Option<PathBuf>,

  /// Path to second must-gather directory for comparison
  #[arg(long)]
  pub must_gather2: Option<PathBuf>,

  /// Output directory for collected resources [default: ./output]
  #[arg(short, long)]
  pub output: Option<PathBuf>,

  /// Output file for single file mode
  #[arg(short, long)]
  pub file: Option<PathBuf>,

  /// Collect all resources to a single YAML file
  #[arg(long)]
  pub single_file: bool,

  /// Clean output directory before collection
  #[arg(long)]
  pub clean: bool,

  /// Enable comparison mode (requires --kubeconfig1 and --kubeconfig2)
  #[arg(long)]
  pub compare: bool,

  /// Split a single-file capture into one file per resource type
  #[arg(long, value_name = "FILE")]
  pub import: Option<PathBuf>,

  /// Per resource type fetch timeout in seconds [default: 30]
  #[arg(long, value_name = "SECONDS")]
  pub timeout: Option<u64>,

  /// Path to settings file (default: .collector.yaml in the current directory)
  #[arg(long)]
  pub config: Option<PathBuf>,

  #[command(flatten)]
  pub verbose: Verbosity<InfoLevel>,
}
