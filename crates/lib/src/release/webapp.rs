//! Browser bundle pipeline: webpack the frontend, move the bundle into the
//! output folder, optionally publish it to IPFS.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use super::{ReleaseError, node, source};
use crate::consts::WEBPACK_WEBAPP_CONFIG;
use crate::exec::CommandSpec;
use crate::util::fs;

#[derive(Debug, Clone)]
pub struct WebappOptions {
  /// Frontend source tree.
  pub frontend: PathBuf,
  /// Parent of the final `web/` bundle directory.
  pub output: PathBuf,
  /// Build the read-only variant of the app.
  pub readonly: bool,
  /// API endpoint baked into the bundle instead of the frontend's default.
  pub api_url: Option<String>,
  /// Add the bundle to IPFS once it's in place.
  pub publish: bool,
}

impl WebappOptions {
  pub fn new(frontend: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
    Self {
      frontend: frontend.into(),
      output: output.into(),
      readonly: false,
      api_url: None,
      publish: false,
    }
  }

  /// Where webpack leaves the bundle.
  pub fn dist_dir(&self) -> PathBuf {
    self.frontend.join("dist").join("web")
  }

  /// Where the bundle ends up.
  pub fn bundle_dir(&self) -> PathBuf {
    self.output.join("web")
  }
}

/// A finished browser bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebappRelease {
  pub dir: PathBuf,
  /// Root content identifier, when published.
  pub cid: Option<String>,
}

/// The webpack invocation for the webapp bundle.
pub fn webapp_command(options: &WebappOptions) -> Result<CommandSpec, ReleaseError> {
  let mut command = node::webpack(&options.frontend, WEBPACK_WEBAPP_CONFIG, true)?;
  if options.readonly {
    command = command.env("READONLY", "true");
  }
  if let Some(url) = &options.api_url {
    command = command.env("API_URL", url.as_str());
  }
  Ok(command)
}

/// Build the webapp and return where the bundle was placed.
pub async fn build_webapp(options: &WebappOptions) -> Result<WebappRelease, ReleaseError> {
  source::require_dir(&options.frontend).await?;

  info!(frontend = %options.frontend.display(), readonly = options.readonly, "building webapp");
  webapp_command(options)?.run().await?;

  let dir = install_bundle(options).await?;

  let cid = if options.publish {
    let cid = ipfs_add(&dir).await?;
    info!(cid = %cid, "published webapp");
    Some(cid)
  } else {
    None
  };

  Ok(WebappRelease { dir, cid })
}

/// Replace any previous bundle in the output folder with the fresh one.
pub async fn install_bundle(options: &WebappOptions) -> Result<PathBuf, ReleaseError> {
  let dist = options.dist_dir();
  source::require_dir(&dist).await?;

  let bundle = options.bundle_dir();
  fs::remove_tree(&bundle).await?;
  fs::move_tree(&dist, &bundle).await?;
  Ok(bundle)
}

/// Add `path` recursively to IPFS and return the root CID.
pub async fn ipfs_add(path: &Path) -> Result<String, ReleaseError> {
  let output = CommandSpec::new("ipfs").args(["add", "-rQ"]).arg(path).output().await?;
  Ok(output.trim().to_string())
}
