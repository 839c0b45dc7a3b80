//! Test utilities for qri-build-lib.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use crate::build::{BuildError, Compiler};
use crate::exec::CommandError;
use crate::platform::BuildTarget;

/// A `Compiler` that writes a marker file instead of running a toolchain.
///
/// Tracks how many compiles ran and the peak number running at once so
/// orchestration tests can check fan-out and concurrency limits.
#[derive(Debug, Default)]
pub struct FakeCompiler {
  failing_platforms: Vec<String>,
  panicking_platforms: Vec<String>,
  silent: bool,
  delay: Duration,
  calls: AtomicUsize,
  running: AtomicUsize,
  peak: AtomicUsize,
}

impl FakeCompiler {
  /// Fails every target whose platform is in `platforms`.
  pub fn failing(platforms: &[&str]) -> Self {
    Self {
      failing_platforms: platforms.iter().map(|p| p.to_string()).collect(),
      ..Self::default()
    }
  }

  /// Panics mid-build for every target whose platform is in `platforms`.
  pub fn panicking(platforms: &[&str]) -> Self {
    Self {
      panicking_platforms: platforms.iter().map(|p| p.to_string()).collect(),
      ..Self::default()
    }
  }

  /// Succeeds without writing a binary.
  pub fn silent() -> Self {
    Self {
      silent: true,
      ..Self::default()
    }
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn peak(&self) -> usize {
    self.peak.load(Ordering::SeqCst)
  }
}

impl Compiler for FakeCompiler {
  async fn compile(&self, target: &BuildTarget, output: &Path) -> Result<(), BuildError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
    self.peak.fetch_max(now, Ordering::SeqCst);

    if !self.delay.is_zero() {
      tokio::time::sleep(self.delay).await;
    }
    self.running.fetch_sub(1, Ordering::SeqCst);

    if self.panicking_platforms.iter().any(|p| p == target.platform()) {
      panic!("compiler crashed building {target}");
    }
    if self.failing_platforms.iter().any(|p| p == target.platform()) {
      return Err(BuildError::Command(CommandError::Failed {
        command: format!("fake build {target}"),
        code: Some(2),
      }));
    }
    if !self.silent {
      tokio::fs::write(output, format!("binary for {target}")).await.unwrap();
    }
    Ok(())
  }
}

/// Write `content` to `path` and backdate its mtime by `age`.
///
/// Lets discovery tests order files deterministically without sleeping.
pub fn write_aged(path: &Path, content: &str, age: Duration) {
  std::fs::write(path, content).unwrap();
  let file = std::fs::File::options().write(true).open(path).unwrap();
  file.set_modified(SystemTime::now() - age).unwrap();
}

/// Write a readme template named `name` into `dir`.
pub fn write_template(dir: &Path, name: &str, content: &str) {
  std::fs::create_dir_all(dir).unwrap();
  std::fs::write(dir.join(name), content).unwrap();
}
