//! Implementation of the `qri-build package-formula` command.
//!
//! Writes `qri.rb` into a local homebrew tap checkout. Committing and pushing
//! the tap is left to the operator.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use qri_build_lib::consts::{ENV_HOMEBREW_TAP, ENV_QRI, ENV_ZIP};
use qri_build_lib::release::{FormulaOptions, write_formula};

use super::{resolve_path, runtime};
use crate::output::{OutputFormat, Status, emit_json, report};

#[derive(Debug, Args)]
pub struct FormulaArgs {
  /// Path to the qri source repository
  #[arg(long, env = ENV_QRI)]
  pub src: Option<PathBuf>,

  /// Release zip the formula points at
  #[arg(long, env = ENV_ZIP)]
  pub zip: Option<PathBuf>,

  /// Homebrew tap checkout [default: $GOPATH/src/github.com/qri-io/homebrew-qri]
  #[arg(long, env = ENV_HOMEBREW_TAP)]
  pub tap: Option<PathBuf>,

  /// Publish even if the version is a development version
  #[arg(long)]
  pub ignore_dev_restriction: bool,
}

/// Execute the package-formula command.
pub fn cmd_formula(args: &FormulaArgs, format: OutputFormat) -> Result<()> {
  let mut options = FormulaOptions::new(
    args.src.as_deref().map(resolve_path),
    args.zip.as_deref().map(resolve_path),
  );
  if let Some(tap) = &args.tap {
    options.tap = resolve_path(tap);
  }
  options.ignore_dev_restriction = args.ignore_dev_restriction;

  let rt = runtime()?;
  let release = rt
    .block_on(write_formula(&options))
    .context("Building homebrew formula failed")?;

  if format.is_json() {
    emit_json(&release)?;
  } else {
    report(
      Status::Done,
      &format!(
        "Wrote version {} formula to {}. Commit and push that repo.",
        release.version,
        release.path.display()
      ),
    );
  }

  Ok(())
}
