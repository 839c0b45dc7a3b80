mod cmd;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// qri-build - build and package qri releases
#[derive(Parser)]
#[command(name = "qri-build")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Cross-compile the qri binary and zip one archive per platform/arch pair
  #[command(name = "primary-binary", visible_alias = "qri")]
  PrimaryBinary(cmd::BinaryArgs),

  /// Build the frontend webapp bundle, optionally publishing it to IPFS
  #[command(name = "browser-bundle", visible_alias = "webapp")]
  BrowserBundle(cmd::BundleArgs),

  /// Build the desktop app installer with an embedded qri backend
  #[command(name = "embedded-app", visible_alias = "desktop")]
  EmbeddedApp(cmd::AppArgs),

  /// Write the homebrew formula for a release zip
  #[command(name = "package-formula", visible_alias = "homebrew")]
  PackageFormula(cmd::FormulaArgs),
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match &cli.command {
    Commands::PrimaryBinary(args) => cmd::cmd_binary(args, cli.format),
    Commands::BrowserBundle(args) => cmd::cmd_bundle(args, cli.format),
    Commands::EmbeddedApp(args) => cmd::cmd_app(args, cli.format),
    Commands::PackageFormula(args) => cmd::cmd_formula(args, cli.format),
  }
}

/// `RUST_LOG` wins; otherwise info, or debug with `--verbose`.
fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}
