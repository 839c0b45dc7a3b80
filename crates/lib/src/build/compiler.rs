//! Toolchains that turn the primary source tree into a binary.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::build::BuildError;
use crate::exec::CommandSpec;
use crate::platform::BuildTarget;
use crate::util::fs;

/// Environment variables forwarded from the invoking shell to `go build`.
const FORWARDED_GO_VARS: &[&str] = &["GOPATH", "GOCACHE", "GOMODCACHE", "GOFLAGS", "GOPROXY"];

/// Compiles the primary binary for one target into a given output file.
pub trait Compiler: Send + Sync + 'static {
  fn compile(&self, target: &BuildTarget, output: &Path) -> impl Future<Output = Result<(), BuildError>> + Send;
}

/// `go build` cross-compilation via `GOOS`/`GOARCH`.
///
/// The build runs from inside the source tree so module mode finds its
/// `go.mod`; the output path is made absolute for that reason.
#[derive(Debug, Clone)]
pub struct GoCompiler {
  program: String,
  source: PathBuf,
  env: BTreeMap<String, String>,
}

impl GoCompiler {
  /// A compiler for `source` that only sets `GO111MODULE=on`.
  pub fn new(source: impl Into<PathBuf>) -> Self {
    Self {
      program: "go".to_string(),
      source: source.into(),
      env: BTreeMap::from([("GO111MODULE".to_string(), "on".to_string())]),
    }
  }

  /// A compiler for `source` that forwards the invoking shell's module and
  /// cache settings (`GOPATH`, `GO111MODULE`, `GOFLAGS`, ...).
  pub fn from_env(source: impl Into<PathBuf>) -> Self {
    let mut compiler = Self::new(source);
    for key in FORWARDED_GO_VARS.iter().chain(std::iter::once(&"GO111MODULE")) {
      if let Ok(value) = std::env::var(key) {
        compiler.env.insert(key.to_string(), value);
      }
    }
    compiler
  }

  /// Use a different `go` executable.
  pub fn with_program(mut self, program: impl Into<String>) -> Self {
    self.program = program.into();
    self
  }

  pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  /// The exact invocation used for `target`.
  pub fn command(&self, target: &BuildTarget, output: &Path) -> Result<CommandSpec, BuildError> {
    let output = fs::absolute(output)?;
    Ok(
      CommandSpec::new(&self.program)
        .args(["build", "-o"])
        .arg(output)
        .arg(".")
        .current_dir(&self.source)
        .envs(self.env.iter().map(|(k, v)| (k.clone(), v.clone())))
        .env("GOOS", target.platform())
        .env("GOARCH", target.arch()),
    )
  }
}

impl Compiler for GoCompiler {
  async fn compile(&self, target: &BuildTarget, output: &Path) -> Result<(), BuildError> {
    self.command(target, output)?.run().await?;
    Ok(())
  }
}
