//! Implementation of the `qri-build embedded-app` command.
//!
//! Builds qri for the host, embeds it into the desktop app and produces the
//! platform installer. Needs `go`, `git`, `yarn` and the desktop app's node
//! dependencies, plus `GO111MODULE=on`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use qri_build_lib::build::GoCompiler;
use qri_build_lib::consts::{ENV_DESKTOP, ENV_OUTPUT, ENV_QRI};
use qri_build_lib::release::{DesktopOptions, build_desktop};

use super::{resolve_path, runtime};
use crate::output::{OutputFormat, Status, emit_json, report};

#[derive(Debug, Args)]
pub struct AppArgs {
  /// Path to the qri repository
  #[arg(long, env = ENV_QRI)]
  pub qri: PathBuf,

  /// Path to the qri desktop repository
  #[arg(long, env = ENV_DESKTOP)]
  pub desktop: PathBuf,

  /// Directory the installer is moved to
  #[arg(long, env = ENV_OUTPUT, default_value = ".")]
  pub output: PathBuf,

  /// Don't check out or pull either repository
  #[arg(long)]
  pub skip_update: bool,
}

/// Execute the embedded-app command.
pub fn cmd_app(args: &AppArgs, format: OutputFormat) -> Result<()> {
  let mut options = DesktopOptions::new(
    resolve_path(&args.qri),
    resolve_path(&args.desktop),
    resolve_path(&args.output),
  );
  options.skip_update = args.skip_update;

  let compiler = GoCompiler::from_env(&options.qri);

  let rt = runtime()?;
  let installer = rt
    .block_on(build_desktop(&compiler, &options))
    .context("Desktop build failed")?;

  if format.is_json() {
    emit_json(&serde_json::json!({ "installer": installer }))?;
  } else {
    report(Status::Done, &format!("Release installer at: {}", installer.display()));
  }

  Ok(())
}
