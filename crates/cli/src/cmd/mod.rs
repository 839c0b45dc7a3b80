mod app;
mod binary;
mod bundle;
mod formula;

use std::path::{Path, PathBuf};

pub use app::{AppArgs, cmd_app};
pub use binary::{BinaryArgs, cmd_binary};
pub use bundle::{BundleArgs, cmd_bundle};
pub use formula::{FormulaArgs, cmd_formula};

/// Canonical form of `path` when it exists, without `\\?\` on windows.
fn resolve_path(path: &Path) -> PathBuf {
  dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
  use anyhow::Context;
  tokio::runtime::Runtime::new().context("Failed to create async runtime")
}
