//! The per-target build step.
//!
//! Each target compiles into its own directory under the work dir, named
//! after the artifact it will become (`qri_linux_amd64/`). The directory is
//! owned by that target's job; whoever calls [`build_binary`] is responsible
//! for removing it, whether or not the build succeeded.

mod compiler;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::exec::CommandError;
use crate::platform::{BuildTarget, PlatformError};
use crate::util::fs::{self, FsError};

pub use compiler::{Compiler, GoCompiler};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Fs(#[from] FsError),

  #[error("compile failed: {0}")]
  Command(#[from] CommandError),

  #[error(transparent)]
  Platform(#[from] PlatformError),

  #[error("compiler reported success but produced no binary at {}", path.display())]
  MissingOutput { path: PathBuf },
}

/// Where per-target build directories live and what the binary is called.
#[derive(Debug, Clone)]
pub struct BuildLayout {
  pub work_dir: PathBuf,
  pub bin_name: String,
}

impl BuildLayout {
  pub fn new(work_dir: impl Into<PathBuf>, bin_name: impl Into<String>) -> Self {
    Self {
      work_dir: work_dir.into(),
      bin_name: bin_name.into(),
    }
  }

  /// `<work_dir>/<bin>_<platform>_<arch>`
  pub fn build_dir(&self, target: &BuildTarget) -> PathBuf {
    self.work_dir.join(target.artifact_stem(&self.bin_name))
  }

  /// The binary inside [`BuildLayout::build_dir`].
  pub fn binary_path(&self, target: &BuildTarget) -> PathBuf {
    self.build_dir(target).join(target.binary_file_name(&self.bin_name))
  }
}

/// Compile one target into a fresh build directory and return that directory.
///
/// A directory left over from an earlier run is removed first. On failure the
/// (possibly half-populated) directory is left for the caller to clean up.
pub async fn build_binary<C: Compiler>(
  compiler: &C,
  target: &BuildTarget,
  layout: &BuildLayout,
) -> Result<PathBuf, BuildError> {
  let dir = layout.build_dir(target);

  if fs::exists(&dir).await? {
    warn!(target = %target, path = %dir.display(), "removing stale build directory");
    fs::remove_tree(&dir).await?;
  }
  fs::ensure_dir(&dir).await?;

  let binary = layout.binary_path(target);
  info!(target = %target, binary = %binary.display(), "building");
  compiler.compile(target, &binary).await?;

  if !fs::exists(&binary).await? {
    return Err(BuildError::MissingOutput { path: binary });
  }

  Ok(dir)
}

/// Build the primary binary for the host into `<source>/build/`.
///
/// Used by the desktop pipeline, which ships only a host binary. Returns the
/// path of the binary.
pub async fn build_host_binary<C: Compiler>(compiler: &C, source: &Path, bin_name: &str) -> Result<PathBuf, BuildError> {
  let target = BuildTarget::host()?;
  let build_dir = source.join("build");
  fs::ensure_dir(&build_dir).await?;

  let binary = build_dir.join(target.binary_file_name(bin_name));
  info!(target = %target, binary = %binary.display(), "building host binary");
  compiler.compile(&target, &binary).await?;

  if !fs::exists(&binary).await? {
    return Err(BuildError::MissingOutput { path: binary });
  }

  Ok(binary)
}
