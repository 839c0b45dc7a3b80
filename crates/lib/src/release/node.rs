//! Node tooling shared by the desktop and webapp pipelines.

use std::path::{Path, PathBuf};

use super::ReleaseError;
use crate::consts::NODE_OPTIONS;
use crate::exec::CommandSpec;

/// `<project>/node_modules/.bin`, where a project's locally installed tools live.
pub fn local_bin_dir(project: &Path) -> PathBuf {
  project.join("node_modules").join(".bin")
}

/// `PATH` with the project's local tool directory in front of `inherited`.
pub fn search_path(project: &Path, inherited: Option<&std::ffi::OsStr>) -> Result<String, ReleaseError> {
  let bin = local_bin_dir(project);
  let mut entries = vec![bin.clone()];
  if let Some(inherited) = inherited {
    entries.extend(std::env::split_paths(inherited));
  }

  let joined = std::env::join_paths(entries).map_err(|e| ReleaseError::SearchPath {
    entry: bin.clone(),
    reason: e.to_string(),
  })?;
  joined.into_string().map_err(|_| ReleaseError::SearchPath {
    entry: bin,
    reason: "PATH is not valid unicode".to_string(),
  })
}

/// A production webpack build of `config` run from `project`.
///
/// `large_heap` raises node's heap limit, which the renderer and webapp
/// bundles need.
pub fn webpack(project: &Path, config: &str, large_heap: bool) -> Result<CommandSpec, ReleaseError> {
  let path = search_path(project, std::env::var_os("PATH").as_deref())?;
  let command = CommandSpec::new("node")
    .args(["--trace-warnings", "--require", "@babel/register"])
    .arg(Path::new("node_modules").join("webpack").join("bin").join("webpack"))
    .args(["--config", config, "--colors"])
    .current_dir(project)
    .env("PATH", path)
    .env("NODE_ENV", "production");

  Ok(if large_heap {
    command.env("NODE_OPTIONS", NODE_OPTIONS)
  } else {
    command
  })
}
