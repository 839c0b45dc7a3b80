//! Implementation of the `qri-build browser-bundle` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use qri_build_lib::consts::{ENV_API_URL, ENV_FRONTEND, ENV_OUTPUT};
use qri_build_lib::release::{WebappOptions, build_webapp};

use super::{resolve_path, runtime};
use crate::output::{OutputFormat, Status, emit_json, field, report};

#[derive(Debug, Args)]
pub struct BundleArgs {
  /// Path to the qri frontend repository
  #[arg(long, env = ENV_FRONTEND)]
  pub frontend: PathBuf,

  /// Directory the `web/` bundle is placed in
  #[arg(long, env = ENV_OUTPUT, default_value = ".")]
  pub output: PathBuf,

  /// Build the read-only variant of the webapp
  #[arg(long)]
  pub readonly: bool,

  /// Add the finished bundle to IPFS
  #[arg(long)]
  pub ipfs: bool,

  /// API endpoint the webapp talks to
  #[arg(long, env = ENV_API_URL)]
  pub api_url: Option<String>,
}

/// Execute the browser-bundle command.
pub fn cmd_bundle(args: &BundleArgs, format: OutputFormat) -> Result<()> {
  let mut options = WebappOptions::new(resolve_path(&args.frontend), resolve_path(&args.output));
  options.readonly = args.readonly;
  options.api_url = args.api_url.clone();
  options.publish = args.ipfs;

  let rt = runtime()?;
  let release = rt
    .block_on(build_webapp(&options))
    .context("Webapp build failed")?;

  if format.is_json() {
    emit_json(&release)?;
  } else {
    report(Status::Done, &format!("Webapp bundle at: {}", release.dir.display()));
    if let Some(cid) = &release.cid {
      field("IPFS", cid);
    }
  }

  Ok(())
}
