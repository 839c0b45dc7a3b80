//! CLI smoke tests for qri-build.
//!
//! None of these need go, git, yarn or ipfs: they cover argument handling,
//! the environment fallbacks, the formula pipeline end to end, and the exit
//! status of pipelines that fail before or at their first external tool.

use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
  "QRI_BUILD_PLATFORM",
  "QRI_BUILD_ARCH",
  "QRI_BUILD_QRI",
  "QRI_BUILD_TEMPLATES",
  "QRI_BUILD_OUTPUT",
  "QRI_BUILD_JOBS",
  "QRI_BUILD_FRONTEND",
  "QRI_BUILD_DESKTOP",
  "QRI_BUILD_API_URL",
  "QRI_BUILD_ZIP",
  "QRI_BUILD_HOMEBREW_TAP",
];

/// Get a Command for the qri-build binary with none of its env vars inherited.
fn qri_build_cmd() -> Command {
  let mut cmd = cargo_bin_cmd!("qri-build");
  for var in ENV_VARS {
    cmd.env_remove(var);
  }
  cmd
}

/// A qri checkout with only the version file, a release zip and a tap.
struct FormulaFixture {
  temp: TempDir,
}

impl FormulaFixture {
  fn new(version: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let version_dir = temp.path().join("qri").join("version");
    std::fs::create_dir_all(&version_dir).unwrap();
    std::fs::write(
      version_dir.join("version.go"),
      format!("package version\n\n// String is the version\nconst String = \"{version}\"\n"),
    )
    .unwrap();
    std::fs::write(temp.path().join("qri_darwin_amd64.zip"), b"release").unwrap();
    std::fs::create_dir_all(temp.path().join("homebrew-qri")).unwrap();
    Self { temp }
  }

  fn path(&self, name: &str) -> std::path::PathBuf {
    self.temp.path().join(name)
  }

  fn formula(&self) -> std::path::PathBuf {
    self.path("homebrew-qri").join("qri.rb")
  }
}

fn formula_cmd(fx: &FormulaFixture) -> Command {
  let mut cmd = qri_build_cmd();
  cmd
    .arg("package-formula")
    .arg("--src")
    .arg(fx.path("qri"))
    .arg("--zip")
    .arg(fx.path("qri_darwin_amd64.zip"))
    .arg("--tap")
    .arg(fx.path("homebrew-qri"));
  cmd
}

fn dir_is_empty(path: &Path) -> bool {
  std::fs::read_dir(path).map(|mut d| d.next().is_none()).unwrap_or(true)
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  qri_build_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"))
    .stdout(predicate::str::contains("primary-binary"));
}

#[test]
fn version_flag_works() {
  qri_build_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("qri-build"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &[
    "primary-binary",
    "browser-bundle",
    "embedded-app",
    "package-formula",
    "qri",
    "webapp",
    "desktop",
    "homebrew",
  ] {
    qri_build_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

#[test]
fn unknown_subcommand_fails() {
  qri_build_cmd().arg("electron").assert().failure();
}

// =============================================================================
// package-formula
// =============================================================================

#[test]
#[serial]
fn formula_written_for_release_version() {
  let fx = FormulaFixture::new("0.9.1");

  formula_cmd(&fx)
    .assert()
    .success()
    .stdout(predicate::str::contains("Wrote version 0.9.1 formula"));

  let formula = std::fs::read_to_string(fx.formula()).unwrap();
  assert!(formula.contains("version \"0.9.1\""));
  assert!(formula.contains("/v0.9.1/qri_darwin_amd64.zip"));
}

#[test]
#[serial]
fn formula_refuses_dev_version() {
  let fx = FormulaFixture::new("0.9.2-dev");

  formula_cmd(&fx)
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot publish a development version"));

  assert!(!fx.formula().exists());
}

#[test]
#[serial]
fn formula_dev_version_with_override() {
  let fx = FormulaFixture::new("0.9.2-dev");

  formula_cmd(&fx).arg("--ignore-dev-restriction").assert().success();

  assert!(fx.formula().exists());
}

#[test]
#[serial]
fn formula_requires_zip() {
  let fx = FormulaFixture::new("0.9.1");

  qri_build_cmd()
    .arg("homebrew")
    .arg("--src")
    .arg(fx.path("qri"))
    .arg("--tap")
    .arg(fx.path("homebrew-qri"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("--zip <path to zip release>"));
}

#[test]
#[serial]
fn formula_reads_environment() {
  let fx = FormulaFixture::new("0.9.1");

  qri_build_cmd()
    .arg("package-formula")
    .env("QRI_BUILD_QRI", fx.path("qri"))
    .env("QRI_BUILD_ZIP", fx.path("qri_darwin_amd64.zip"))
    .env("QRI_BUILD_HOMEBREW_TAP", fx.path("homebrew-qri"))
    .arg("--format")
    .arg("json")
    .assert()
    .success()
    .stdout(predicate::str::contains("\"version\": \"0.9.1\""));

  assert!(fx.formula().exists());
}

#[test]
#[serial]
fn formula_flags_override_environment() {
  let fx = FormulaFixture::new("0.9.1");

  formula_cmd(&fx)
    .env("QRI_BUILD_ZIP", fx.path("missing.zip"))
    .env("QRI_BUILD_HOMEBREW_TAP", fx.path("no-such-tap"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Wrote version 0.9.1 formula"));

  assert!(fx.formula().exists());
}

#[test]
#[serial]
fn formula_tap_defaults_under_gopath() {
  let fx = FormulaFixture::new("0.9.1");
  let gopath = fx.path("gopath");
  let tap = gopath.join("src/github.com/qri-io/homebrew-qri");
  std::fs::create_dir_all(&tap).unwrap();

  qri_build_cmd()
    .arg("package-formula")
    .arg("--src")
    .arg(fx.path("qri"))
    .arg("--zip")
    .arg(fx.path("qri_darwin_amd64.zip"))
    .env("GOPATH", &gopath)
    .assert()
    .success();

  assert!(tap.join("qri.rb").exists());
}

// =============================================================================
// primary-binary
// =============================================================================

#[test]
#[serial]
fn primary_binary_fails_when_toolchain_missing() {
  let temp = TempDir::new().unwrap();
  let empty_path = temp.path().join("bin");
  let work = temp.path().join("work");
  let out = temp.path().join("out");
  std::fs::create_dir_all(&empty_path).unwrap();
  std::fs::create_dir_all(&work).unwrap();

  qri_build_cmd()
    .arg("primary-binary")
    .args(["--platforms", "linux,darwin", "--arches", "amd64"])
    .arg("--work-dir")
    .arg(&work)
    .arg("--output")
    .arg(&out)
    .env("PATH", &empty_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("2 of 2 target(s) failed"));

  assert!(dir_is_empty(&work), "build directories left behind");
  assert!(dir_is_empty(&out), "no archive expected");
}

#[test]
#[serial]
fn primary_binary_json_reports_each_target() {
  let temp = TempDir::new().unwrap();
  let empty_path = temp.path().join("bin");
  std::fs::create_dir_all(&empty_path).unwrap();

  qri_build_cmd()
    .args(["qri", "--format", "json", "--arches", "386"])
    .arg("--work-dir")
    .arg(temp.path())
    .arg("--output")
    .arg(temp.path())
    .env("QRI_BUILD_PLATFORM", "windows,linux")
    .env("PATH", &empty_path)
    .assert()
    .failure()
    .stdout(predicate::str::contains("\"target\": \"windows/386\""))
    .stdout(predicate::str::contains("\"target\": \"linux/386\""));
}

// =============================================================================
// browser-bundle & embedded-app
// =============================================================================

#[test]
#[serial]
fn browser_bundle_missing_frontend_fails() {
  let temp = TempDir::new().unwrap();

  qri_build_cmd()
    .arg("browser-bundle")
    .arg("--frontend")
    .arg(temp.path().join("frontend"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("directory does not exist"));
}

#[test]
fn embedded_app_requires_desktop_path() {
  qri_build_cmd()
    .args(["embedded-app", "--qri", "qri"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--desktop"));
}

#[test]
#[serial]
fn embedded_app_missing_source_fails() {
  let temp = TempDir::new().unwrap();

  qri_build_cmd()
    .arg("desktop")
    .arg("--qri")
    .arg(temp.path().join("qri"))
    .arg("--desktop")
    .arg(temp.path())
    .arg("--skip-update")
    .assert()
    .failure()
    .stderr(predicate::str::contains("directory does not exist"));
}
