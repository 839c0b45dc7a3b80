//! Options, errors and results of a matrix build.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::archive::{ArchiveError, ArchiveOptions};
use crate::build::{BuildError, BuildLayout};
use crate::platform::BuildTarget;
use crate::util::fs::FsError;

/// Why one target's job failed.
#[derive(Debug, Error)]
pub enum JobError {
  /// Compiling the binary failed.
  #[error("build failed: {0}")]
  Build(#[from] BuildError),

  /// Rendering the readme or writing the zip failed.
  #[error("packaging failed: {0}")]
  Package(#[from] ArchiveError),

  /// The output directory could not be created.
  #[error("output directory: {0}")]
  Output(#[source] FsError),

  /// The archive was written but the build directory could not be removed.
  #[error("cleanup failed: {0}")]
  Cleanup(#[source] FsError),

  /// The job's task panicked or was cancelled.
  #[error("job aborted: {0}")]
  Panicked(String),
}

/// The outcome of a single target.
#[derive(Debug)]
pub struct TargetOutcome {
  pub target: BuildTarget,
  /// The archive path on success.
  pub result: Result<PathBuf, JobError>,
}

impl TargetOutcome {
  pub fn is_success(&self) -> bool {
    self.result.is_ok()
  }
}

/// Result of building the whole matrix, one outcome per target in matrix order.
#[derive(Debug, Default)]
pub struct MatrixResult {
  pub outcomes: Vec<TargetOutcome>,
}

impl MatrixResult {
  /// Returns true if every target produced an archive.
  pub fn is_success(&self) -> bool {
    self.outcomes.iter().all(TargetOutcome::is_success)
  }

  pub fn succeeded(&self) -> impl Iterator<Item = (&BuildTarget, &Path)> {
    self
      .outcomes
      .iter()
      .filter_map(|o| o.result.as_ref().ok().map(|p| (&o.target, p.as_path())))
  }

  pub fn failed(&self) -> impl Iterator<Item = (&BuildTarget, &JobError)> {
    self
      .outcomes
      .iter()
      .filter_map(|o| o.result.as_ref().err().map(|e| (&o.target, e)))
  }

  pub fn len(&self) -> usize {
    self.outcomes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.outcomes.is_empty()
  }
}

/// Configuration for a matrix build.
#[derive(Debug, Clone)]
pub struct MatrixOptions {
  pub layout: BuildLayout,
  /// Shared by every target, including the run's single timestamp.
  pub archive: ArchiveOptions,
  /// Maximum number of targets building at once. Zero is treated as one.
  pub parallelism: usize,
}

impl MatrixOptions {
  pub fn new(
    bin_name: &str,
    work_dir: impl Into<PathBuf>,
    output_dir: impl Into<PathBuf>,
    templates_dir: impl Into<PathBuf>,
  ) -> Self {
    Self {
      layout: BuildLayout::new(work_dir, bin_name),
      archive: ArchiveOptions::new(bin_name, output_dir, templates_dir),
      parallelism: num_cpus(),
    }
  }

  pub fn with_parallelism(mut self, parallelism: usize) -> Self {
    self.parallelism = parallelism;
    self
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
