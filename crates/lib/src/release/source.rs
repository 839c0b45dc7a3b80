//! Preconditions on source trees and the toolchain.

use std::io::ErrorKind;
use std::path::Path;

use semver::Version;
use tracing::info;

use super::ReleaseError;
use crate::consts::{MIN_GO_VERSION, RELEASE_BRANCH};
use crate::exec::CommandSpec;

/// Fail unless `path` exists and is a directory.
pub async fn require_dir(path: &Path) -> Result<(), ReleaseError> {
  match tokio::fs::metadata(path).await {
    Ok(m) if m.is_dir() => Ok(()),
    Ok(_) => Err(ReleaseError::NotADirectory {
      path: path.to_path_buf(),
    }),
    Err(e) if e.kind() == ErrorKind::NotFound => Err(ReleaseError::PathMissing {
      path: path.to_path_buf(),
    }),
    Err(source) => Err(ReleaseError::Io {
      path: path.to_path_buf(),
      source,
    }),
  }
}

/// Pull the toolchain version out of `go version` output.
///
/// `go version go1.12.5 darwin/amd64` yields 1.12.5. Missing minor or patch
/// components count as zero, and a pre-release tail (`go1.13beta1`) is
/// ignored.
pub fn parse_go_version(output: &str) -> Result<Version, ReleaseError> {
  let not_found = || ReleaseError::ToolchainVersion {
    output: output.trim().to_string(),
  };

  let token = output
    .split_whitespace()
    .filter_map(|word| word.strip_prefix("go"))
    .find(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
    .ok_or_else(not_found)?;

  let numeric: String = token.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
  let mut parts = numeric.split('.').filter(|p| !p.is_empty()).map(str::parse::<u64>);

  let mut next = || parts.next().transpose().map_err(|_| not_found());
  let major = next()?.ok_or_else(not_found)?;
  let minor = next()?.unwrap_or(0);
  let patch = next()?.unwrap_or(0);

  Ok(Version::new(major, minor, patch))
}

/// Fail if `found` is older than the minimum supported toolchain.
pub fn require_go_version(found: &Version) -> Result<(), ReleaseError> {
  if *found < MIN_GO_VERSION {
    return Err(ReleaseError::ToolchainTooOld {
      found: found.clone(),
      required: MIN_GO_VERSION,
    });
  }
  Ok(())
}

/// Check the installed go toolchain is new enough.
pub async fn check_toolchain() -> Result<Version, ReleaseError> {
  let output = CommandSpec::new("go").arg("version").quiet().output().await?;
  let version = parse_go_version(&output)?;
  require_go_version(&version)?;
  info!(version = %version, "go toolchain");
  Ok(version)
}

/// Fail unless environment variable `name` is exactly `expected`.
pub fn require_env(name: &str, expected: &str) -> Result<(), ReleaseError> {
  match std::env::var(name) {
    Ok(value) if value == expected => Ok(()),
    _ => Err(ReleaseError::EnvNotSet {
      name: name.to_string(),
      expected: expected.to_string(),
    }),
  }
}

/// The checked-out branch from `git branch` output (the `* ` line).
pub fn parse_current_branch(output: &str) -> Option<String> {
  output
    .lines()
    .find_map(|line| line.strip_prefix("* "))
    .map(|name| name.trim().to_string())
    .filter(|name| !name.is_empty())
}

/// The branch checked out in `repo`.
pub async fn current_branch(repo: &Path) -> Result<Option<String>, ReleaseError> {
  let output = CommandSpec::new("git")
    .arg("branch")
    .current_dir(repo)
    .quiet()
    .output()
    .await?;
  Ok(parse_current_branch(&output))
}

/// Fail unless `repo` has the release branch checked out.
pub fn require_release_branch(repo: &Path, branch: Option<&str>) -> Result<(), ReleaseError> {
  match branch {
    Some(RELEASE_BRANCH) => Ok(()),
    other => Err(ReleaseError::WrongBranch {
      path: repo.to_path_buf(),
      expected: RELEASE_BRANCH.to_string(),
      found: other.unwrap_or("(none)").to_string(),
    }),
  }
}

/// Make sure `repo` is on the release branch, then pull from its origin.
pub async fn update_source(repo: &Path) -> Result<(), ReleaseError> {
  info!(repo = %repo.display(), "updating source");
  let branch = current_branch(repo).await?;
  require_release_branch(repo, branch.as_deref())?;
  CommandSpec::new("git").arg("pull").current_dir(repo).run().await?;
  Ok(())
}
