//! Filesystem helpers used between build steps.
//!
//! Every error carries the path(s) it failed on, since the bare io error
//! ("No such file or directory") is useless in a release log.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::info;

#[derive(Debug, Error)]
pub enum FsError {
  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to move {} to {}: {source}", from.display(), to.display())]
  Move {
    from: PathBuf,
    to: PathBuf,
    source: std::io::Error,
  },

  #[error("failed to remove {}: {source}", path.display())]
  Remove { path: PathBuf, source: std::io::Error },

  #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
  Copy {
    from: PathBuf,
    to: PathBuf,
    source: std::io::Error,
  },

  #[error("failed to set permissions on {}: {source}", path.display())]
  Permissions { path: PathBuf, source: std::io::Error },

  #[error("failed to stat {}: {source}", path.display())]
  Stat { path: PathBuf, source: std::io::Error },

  #[error("failed to resolve {}: {source}", path.display())]
  Resolve { path: PathBuf, source: std::io::Error },
}

/// Whether `path` exists. Errors other than "not found" are reported, not
/// treated as absence.
pub async fn exists(path: &Path) -> Result<bool, FsError> {
  fs::try_exists(path).await.map_err(|source| FsError::Stat {
    path: path.to_path_buf(),
    source,
  })
}

/// `path` made absolute against the current directory, without touching the
/// filesystem.
pub fn absolute(path: &Path) -> Result<PathBuf, FsError> {
  std::path::absolute(path).map_err(|source| FsError::Resolve {
    path: path.to_path_buf(),
    source,
  })
}

/// Create `path` and any missing parents.
pub async fn ensure_dir(path: &Path) -> Result<(), FsError> {
  fs::create_dir_all(path).await.map_err(|source| FsError::CreateDir {
    path: path.to_path_buf(),
    source,
  })
}

/// Move `from` to `to`, creating the parents of `to` first.
///
/// This is a rename, so it is atomic when both paths share a filesystem and
/// fails otherwise.
pub async fn move_tree(from: &Path, to: &Path) -> Result<(), FsError> {
  info!(from = %from.display(), to = %to.display(), "move");

  if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
    ensure_dir(parent).await?;
  }

  fs::rename(from, to).await.map_err(|source| FsError::Move {
    from: from.to_path_buf(),
    to: to.to_path_buf(),
    source,
  })
}

/// Recursively delete `path`. A path that doesn't exist is not an error.
pub async fn remove_tree(path: &Path) -> Result<(), FsError> {
  info!(path = %path.display(), "remove");

  let metadata = match fs::symlink_metadata(path).await {
    Ok(m) => m,
    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
    Err(source) => {
      return Err(FsError::Remove {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  let result = if metadata.is_dir() {
    fs::remove_dir_all(path).await
  } else {
    fs::remove_file(path).await
  };

  match result {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
    Err(source) => Err(FsError::Remove {
      path: path.to_path_buf(),
      source,
    }),
  }
}

/// Stream the bytes of `from` into `to`, creating or truncating `to`.
///
/// A failure part way through leaves a partial `to` behind.
pub async fn copy_file(from: &Path, to: &Path) -> Result<u64, FsError> {
  info!(from = %from.display(), to = %to.display(), "copy");

  let copy_err = |source| FsError::Copy {
    from: from.to_path_buf(),
    to: to.to_path_buf(),
    source,
  };

  let mut reader = fs::File::open(from).await.map_err(copy_err)?;
  let mut writer = fs::File::create(to).await.map_err(copy_err)?;
  let copied = tokio::io::copy(&mut reader, &mut writer).await.map_err(copy_err)?;
  writer.sync_all().await.map_err(copy_err)?;
  Ok(copied)
}

/// Mark `path` as executable (0755). No-op where unix modes don't exist.
#[cfg(unix)]
pub async fn set_executable(path: &Path) -> Result<(), FsError> {
  use std::os::unix::fs::PermissionsExt;

  fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
    .await
    .map_err(|source| FsError::Permissions {
      path: path.to_path_buf(),
      source,
    })
}

#[cfg(not(unix))]
pub async fn set_executable(_path: &Path) -> Result<(), FsError> {
  Ok(())
}
