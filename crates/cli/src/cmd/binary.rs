//! Implementation of the `qri-build primary-binary` command.
//!
//! Cross-compiles qri for every platform/architecture pair and zips each
//! binary with its readme. Targets build concurrently and independently; the
//! command fails if any of them failed, after reporting all of them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;
use tracing::debug;

use qri_build_lib::build::GoCompiler;
use qri_build_lib::consts::{BIN_NAME, ENV_ARCH, ENV_JOBS, ENV_OUTPUT, ENV_PLATFORM, ENV_QRI, ENV_TEMPLATES};
use qri_build_lib::matrix::{MatrixOptions, MatrixResult, build_all};
use qri_build_lib::platform::{BuildMatrix, BuildTarget};

use super::{resolve_path, runtime};
use crate::output::{ARROW, OutputFormat, Status, elapsed, emit_json, field, file_size, report};

#[derive(Debug, Args)]
pub struct BinaryArgs {
  /// Platforms to compile, comma separated (darwin|windows|linux|...) [default: host]
  #[arg(long, env = ENV_PLATFORM, value_delimiter = ',')]
  pub platforms: Vec<String>,

  /// Architectures to compile, comma separated (386|amd64|arm|arm64|...) [default: host]
  #[arg(long, env = ENV_ARCH, value_delimiter = ',')]
  pub arches: Vec<String>,

  /// Path to the qri repository
  #[arg(long, env = ENV_QRI, default_value = "qri")]
  pub qri: PathBuf,

  /// Path to the templates directory
  #[arg(long, env = ENV_TEMPLATES, default_value = "templates")]
  pub templates: PathBuf,

  /// Directory the zip archives are written to
  #[arg(long, env = ENV_OUTPUT, default_value = ".")]
  pub output: PathBuf,

  /// Directory the per-target build folders are created in
  #[arg(long, default_value = ".")]
  pub work_dir: PathBuf,

  /// Maximum number of targets building at once [default: available CPUs]
  #[arg(short, long, env = ENV_JOBS)]
  pub jobs: Option<usize>,
}

#[derive(Debug, Serialize)]
struct TargetSummary {
  target: String,
  archive: Option<PathBuf>,
  error: Option<String>,
}

/// Execute the primary-binary command.
pub fn cmd_binary(args: &BinaryArgs, format: OutputFormat) -> Result<()> {
  let matrix = build_matrix(args)?;

  let source = resolve_path(&args.qri);
  debug!(source = %source.display(), templates = %args.templates.display(), "primary binary");
  let compiler = Arc::new(GoCompiler::from_env(source));

  let mut options = MatrixOptions::new(
    BIN_NAME,
    resolve_path(&args.work_dir),
    resolve_path(&args.output),
    resolve_path(&args.templates),
  );
  if let Some(jobs) = args.jobs {
    options = options.with_parallelism(jobs);
  }

  if !format.is_json() {
    report(
      Status::Note,
      &format!(
        "Building {} target(s), up to {} at a time",
        matrix.len(),
        options.parallelism.max(1)
      ),
    );
  }

  let start = Instant::now();
  let rt = runtime()?;
  let result = rt.block_on(build_all(compiler, &matrix, &options));
  let took = start.elapsed();

  if format.is_json() {
    emit_json(&summaries(&result))?;
  } else {
    print_summary(&result);
    field("Elapsed", elapsed(took));
  }

  let failed = result.failed().count();
  if failed > 0 {
    bail!("{} of {} target(s) failed", failed, result.len());
  }
  Ok(())
}

/// Platforms and arches from the arguments, each defaulting to the host.
fn build_matrix(args: &BinaryArgs) -> Result<BuildMatrix> {
  let (platforms, arches) = if args.platforms.is_empty() || args.arches.is_empty() {
    let host = BuildTarget::host().context("Cannot determine host target, pass --platforms and --arches")?;
    (
      or_host(&args.platforms, host.platform()),
      or_host(&args.arches, host.arch()),
    )
  } else {
    (args.platforms.clone(), args.arches.clone())
  };

  BuildMatrix::new(platforms, arches).context("Invalid build matrix")
}

fn or_host(values: &[String], host: &str) -> Vec<String> {
  if values.is_empty() {
    vec![host.to_string()]
  } else {
    values.to_vec()
  }
}

fn summaries(result: &MatrixResult) -> Vec<TargetSummary> {
  result
    .outcomes
    .iter()
    .map(|outcome| TargetSummary {
      target: outcome.target.to_string(),
      archive: outcome.result.as_ref().ok().cloned(),
      error: outcome.result.as_ref().err().map(|e| e.to_string()),
    })
    .collect()
}

fn print_summary(result: &MatrixResult) {
  println!();
  for (target, archive) in result.succeeded() {
    let size = file_size(archive).unwrap_or_else(|| "?".to_string());
    report(
      Status::Done,
      &format!("{target} {ARROW} {} ({size})", archive.display()),
    );
  }
  for (target, error) in result.failed() {
    report(Status::Failed, &format!("{target}: {error}"));
  }
  println!();
  field("Succeeded", result.succeeded().count());
  field("Failed", result.failed().count());
}
