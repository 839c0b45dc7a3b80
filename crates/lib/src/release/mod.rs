//! Downstream release pipelines.
//!
//! Each pipeline is a fixed, fail-fast sequence of steps: the first failing
//! step aborts the rest. They share the precondition checks in [`source`],
//! the installer lookup in [`discover`] and the node tooling in [`node`].

pub mod desktop;
pub mod discover;
pub mod formula;
pub mod node;
pub mod source;
pub mod webapp;

use std::path::PathBuf;

use semver::Version;
use thiserror::Error;

use crate::build::BuildError;
use crate::exec::CommandError;
use crate::util::fs::FsError;

pub use desktop::{DesktopOptions, build_desktop};
pub use discover::discover_installer;
pub use formula::{FormulaOptions, FormulaRelease, write_formula};
pub use webapp::{WebappOptions, WebappRelease, build_webapp};

/// Errors from a release pipeline.
#[derive(Debug, Error)]
pub enum ReleaseError {
  /// One or more required inputs were not supplied.
  #[error("required flags: {}", .0.join(" "))]
  MissingArgument(Vec<&'static str>),

  #[error(transparent)]
  Command(#[from] CommandError),

  #[error(transparent)]
  Fs(#[from] FsError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error("directory does not exist: {}", path.display())]
  PathMissing { path: PathBuf },

  #[error("file exists, must be a directory: {}", path.display())]
  NotADirectory { path: PathBuf },

  #[error("switch {} to branch {expected}, branch {found} is currently checked out", path.display())]
  WrongBranch {
    path: PathBuf,
    expected: String,
    found: String,
  },

  #[error("go {found} is too old, {required} or newer is required")]
  ToolchainTooOld { found: Version, required: Version },

  #[error("could not find a go version in `{output}`")]
  ToolchainVersion { output: String },

  #[error("environment variable {name} must be set to `{expected}`")]
  EnvNotSet { name: String, expected: String },

  #[error("no installer found in {} (looked for {})", dir.display(), suffixes.join(", "))]
  NoInstaller { dir: PathBuf, suffixes: Vec<String> },

  /// Refusing to publish a pre-release version.
  #[error("cannot publish a development version: \"{version}\"")]
  PreRelease { version: String },

  #[error("no version found in {} (expected a `{marker}` line)", path.display())]
  VersionNotFound { path: PathBuf, marker: String },

  #[error("cannot add {} to PATH: {reason}", entry.display())]
  SearchPath { entry: PathBuf, reason: String },

  #[error("failed to read {}: {source}", path.display())]
  Io { path: PathBuf, source: std::io::Error },

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },
}
