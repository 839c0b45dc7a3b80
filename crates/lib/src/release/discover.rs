//! Finding the installer a bundler left in its output folder.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info};
use walkdir::WalkDir;

use super::ReleaseError;

/// Find the installer in `dir` whose file name ends in one of `suffixes`.
///
/// Bundlers leave older installers next to the new one, so when several files
/// match, the most recently modified wins. No match is an error.
pub fn discover_installer(dir: &Path, suffixes: &[&str]) -> Result<PathBuf, ReleaseError> {
  let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();

  let walker = WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name();
  for entry in walker {
    let entry = entry.map_err(|e| ReleaseError::Io {
      path: dir.to_path_buf(),
      source: e.into(),
    })?;
    if !entry.file_type().is_file() {
      continue;
    }

    let name = entry.file_name().to_string_lossy();
    if !suffixes.iter().any(|suffix| name.ends_with(suffix)) {
      continue;
    }

    let modified = entry
      .metadata()
      .map_err(|e| ReleaseError::Io {
        path: entry.path().to_path_buf(),
        source: e.into(),
      })?
      .modified()
      .map_err(|source| ReleaseError::Io {
        path: entry.path().to_path_buf(),
        source,
      })?;

    debug!(installer = %entry.path().display(), "candidate");
    candidates.push((modified, entry.into_path()));
  }

  let count = candidates.len();
  let (_, newest) = candidates
    .into_iter()
    .max_by_key(|(modified, _)| *modified)
    .ok_or_else(|| ReleaseError::NoInstaller {
      dir: dir.to_path_buf(),
      suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
    })?;

  info!(installer = %newest.display(), candidates = count, "found installer");
  Ok(newest)
}
