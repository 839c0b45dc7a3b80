//! Desktop installer pipeline.
//!
//! Builds the qri binary for the host, embeds it into the electron desktop
//! app as its backend, runs the app's bundlers and electron-builder, then
//! moves the produced installer into the output folder.

use std::path::{Path, PathBuf};

use tracing::info;

use super::node::{self, search_path};
use super::{ReleaseError, discover, source};
use crate::build::{self, Compiler};
use crate::consts::{BIN_NAME, INSTALLER_SUFFIXES, WEBPACK_MAIN_CONFIG, WEBPACK_RENDERER_CONFIG};
use crate::exec::CommandSpec;
use crate::util::fs;

/// Inputs of the desktop pipeline.
#[derive(Debug, Clone)]
pub struct DesktopOptions {
  /// qri source tree.
  pub qri: PathBuf,
  /// Desktop app source tree.
  pub desktop: PathBuf,
  /// Where the installer ends up.
  pub output: PathBuf,
  /// Skip the branch check and `git pull` of both trees.
  pub skip_update: bool,
  pub bin_name: String,
}

impl DesktopOptions {
  pub fn new(qri: impl Into<PathBuf>, desktop: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
    Self {
      qri: qri.into(),
      desktop: desktop.into(),
      output: output.into(),
      skip_update: false,
      bin_name: BIN_NAME.to_string(),
    }
  }

  /// The folder electron-builder writes installers to.
  pub fn release_dir(&self) -> PathBuf {
    self.desktop.join("release")
  }
}

/// Build the desktop installer and return its final path.
pub async fn build_desktop<C: Compiler>(compiler: &C, options: &DesktopOptions) -> Result<PathBuf, ReleaseError> {
  source::require_dir(&options.qri).await?;
  source::require_dir(&options.desktop).await?;

  info!("ensuring valid go version and go modules support");
  source::check_toolchain().await?;
  source::require_env("GO111MODULE", "on")?;

  if options.skip_update {
    info!("skipping source update");
  } else {
    source::update_source(&options.qri).await?;
    source::update_source(&options.desktop).await?;
  }

  let binary = build::build_host_binary(compiler, &options.qri, &options.bin_name).await?;
  install_backend(&binary, &options.desktop).await?;

  build_electron(&options.desktop).await?;

  collect_installer(&options.release_dir(), &options.output).await
}

/// Copy the built binary into `<desktop>/backend/` and make it executable.
///
/// The host build already carries the `.exe` suffix on windows, so the file
/// name is kept as is.
pub async fn install_backend(binary: &Path, desktop: &Path) -> Result<PathBuf, ReleaseError> {
  let name = binary.file_name().ok_or_else(|| ReleaseError::PathMissing {
    path: binary.to_path_buf(),
  })?;
  let backend_dir = desktop.join("backend");
  let target = backend_dir.join(name);

  fs::ensure_dir(&backend_dir).await?;
  fs::copy_file(binary, &target).await?;
  fs::set_executable(&target).await?;

  info!(backend = %target.display(), "installed backend binary");
  Ok(target)
}

/// Install dependencies, bundle main and renderer, then package the app.
pub async fn build_electron(desktop: &Path) -> Result<(), ReleaseError> {
  info!(desktop = %desktop.display(), "building desktop app installer");
  yarn_install(desktop).run().await?;

  let main = node::webpack(desktop, WEBPACK_MAIN_CONFIG, false)?;
  let renderer = node::webpack(desktop, WEBPACK_RENDERER_CONFIG, true)?;
  tokio::try_join!(main.run(), renderer.run())?;

  electron_builder(desktop)?.run().await?;
  Ok(())
}

pub fn yarn_install(desktop: &Path) -> CommandSpec {
  CommandSpec::new("yarn").arg("install").current_dir(desktop)
}

/// electron-builder resolved from the project's own `node_modules/.bin`.
pub fn electron_builder(desktop: &Path) -> Result<CommandSpec, ReleaseError> {
  let path = search_path(desktop, std::env::var_os("PATH").as_deref())?;
  Ok(
    CommandSpec::new("electron-builder")
      .args(["build", "--publish", "never"])
      .current_dir(desktop)
      .env("PATH", path),
  )
}

/// Move the newest installer in `release_dir` into `output`.
pub async fn collect_installer(release_dir: &Path, output: &Path) -> Result<PathBuf, ReleaseError> {
  let installer = discover::discover_installer(release_dir, INSTALLER_SUFFIXES)?;
  let name = installer.file_name().ok_or_else(|| ReleaseError::PathMissing {
    path: installer.clone(),
  })?;
  let destination = output.join(name);

  fs::remove_tree(&destination).await?;
  fs::move_tree(&installer, &destination).await?;

  info!(installer = %destination.display(), "release installer ready");
  Ok(destination)
}
