//! Homebrew formula for a released qri zip.

use std::path::{Path, PathBuf};

use semver::Version;
use serde::Serialize;
use tracing::info;

use super::{ReleaseError, source};
use crate::consts::{DEFAULT_TAP, FORMULA_FILE, VERSION_MARKER, VERSION_SOURCE};
use crate::util::hash::{ContentHash, hash_file};

const FORMULA_TEMPLATE: &str = r##"
class Qri < Formula
  desc "Global dataset version control system built on the distributed web"
  homepage "https://qri.io/"
  url "https://github.com/qri-io/qri/releases/download/v$VERSION/$ZIPFILE"
  version "$VERSION"
  sha256 "$SHA256"

  def install
    bin.install "qri"
  end

  test do
    system "#{bin}/qri", "version"
  end
end
"##;

#[derive(Debug, Clone)]
pub struct FormulaOptions {
  /// qri source tree, read for the version number.
  pub src: Option<PathBuf>,
  /// The release zip the formula points at.
  pub zip: Option<PathBuf>,
  /// Checkout of the homebrew tap the formula is written into.
  pub tap: PathBuf,
  /// Allow publishing a pre-release version.
  pub ignore_dev_restriction: bool,
}

impl FormulaOptions {
  pub fn new(src: Option<PathBuf>, zip: Option<PathBuf>) -> Self {
    Self {
      src,
      zip,
      tap: default_tap(),
      ignore_dev_restriction: false,
    }
  }
}

/// `$GOPATH/src/github.com/qri-io/homebrew-qri`.
pub fn default_tap() -> PathBuf {
  std::env::var_os("GOPATH")
    .map(PathBuf::from)
    .unwrap_or_default()
    .join(DEFAULT_TAP)
}

/// A written formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormulaRelease {
  pub path: PathBuf,
  pub version: String,
}

/// The quoted value on the first line of `code` containing `const String`.
pub fn parse_version(code: &str) -> Option<String> {
  let line = code.lines().find(|line| line.contains(VERSION_MARKER))?;
  let start = line.find('"')? + 1;
  let len = line[start..].find('"')?;
  let version = line[start..start + len].trim();
  (!version.is_empty()).then(|| version.to_string())
}

/// True for semver pre-releases (`0.9.1-dev`) and anything else carrying a
/// `-dev` marker.
pub fn is_prerelease(version: &str) -> bool {
  match Version::parse(version.trim_start_matches('v')) {
    Ok(v) => !v.pre.is_empty(),
    Err(_) => version.contains("-dev"),
  }
}

/// Refuse pre-release versions unless explicitly allowed.
pub fn check_release_version(version: &str, ignore_dev_restriction: bool) -> Result<(), ReleaseError> {
  if is_prerelease(version) && !ignore_dev_restriction {
    return Err(ReleaseError::PreRelease {
      version: version.to_string(),
    });
  }
  Ok(())
}

pub fn render_formula(version: &str, zip_name: &str, sha256: &ContentHash) -> String {
  FORMULA_TEMPLATE
    .replace("$VERSION", version)
    .replace("$ZIPFILE", zip_name)
    .replace("$SHA256", &sha256.0)
}

/// Render the formula for `options.zip` and write it into the tap.
pub async fn write_formula(options: &FormulaOptions) -> Result<FormulaRelease, ReleaseError> {
  let (src, zip) = match (&options.src, &options.zip) {
    (Some(src), Some(zip)) => (src, zip),
    (src, zip) => {
      let mut missing = Vec::new();
      if src.is_none() {
        missing.push("--src <path to qri source>");
      }
      if zip.is_none() {
        missing.push("--zip <path to zip release>");
      }
      return Err(ReleaseError::MissingArgument(missing));
    }
  };

  source::require_dir(&options.tap).await?;

  let version_file = src.join(VERSION_SOURCE);
  let code = tokio::fs::read_to_string(&version_file)
    .await
    .map_err(|source| ReleaseError::Io {
      path: version_file.clone(),
      source,
    })?;
  let version = parse_version(&code).ok_or_else(|| ReleaseError::VersionNotFound {
    path: version_file.clone(),
    marker: VERSION_MARKER.to_string(),
  })?;
  check_release_version(&version, options.ignore_dev_restriction)?;

  let sha256 = hash_zip(zip).await?;
  let zip_name = zip
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .ok_or_else(|| ReleaseError::PathMissing { path: zip.clone() })?;

  let content = render_formula(&version, &zip_name, &sha256);
  let path = options.tap.join(FORMULA_FILE);
  tokio::fs::write(&path, content)
    .await
    .map_err(|source| ReleaseError::Write {
      path: path.clone(),
      source,
    })?;

  info!(version = %version, formula = %path.display(), sha256 = %sha256, "wrote formula");
  Ok(FormulaRelease { path, version })
}

async fn hash_zip(zip: &Path) -> Result<ContentHash, ReleaseError> {
  let owned = zip.to_path_buf();
  tokio::task::spawn_blocking(move || hash_file(&owned))
    .await
    .map_err(|e| ReleaseError::Io {
      path: zip.to_path_buf(),
      source: std::io::Error::other(e),
    })?
    .map_err(|source| ReleaseError::Io {
      path: zip.to_path_buf(),
      source,
    })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::hash::hash_bytes;
  use tempfile::TempDir;

  const VERSION_GO: &str = "package version\n\n// String is the current version\nconst String = \"0.9.1\"\n";

  struct Fixture {
    temp: TempDir,
    options: FormulaOptions,
  }

  impl Fixture {
    fn new(version_go: &str) -> Self {
      let temp = TempDir::new().unwrap();
      let src = temp.path().join("qri");
      std::fs::create_dir_all(src.join("version")).unwrap();
      std::fs::write(src.join(VERSION_SOURCE), version_go).unwrap();
      let zip = temp.path().join("qri_darwin_amd64.zip");
      std::fs::write(&zip, b"zip bytes").unwrap();
      let tap = temp.path().join("homebrew-qri");
      std::fs::create_dir_all(&tap).unwrap();

      let options = FormulaOptions {
        src: Some(src),
        zip: Some(zip),
        tap,
        ignore_dev_restriction: false,
      };
      Self { temp, options }
    }
  }

  #[test]
  fn version_from_source_line() {
    assert_eq!(parse_version(VERSION_GO).as_deref(), Some("0.9.1"));
    assert_eq!(
      parse_version("const String = \"0.9.2-dev\" // bumped").as_deref(),
      Some("0.9.2-dev")
    );
    assert_eq!(parse_version("const Other = \"1.0.0\""), None);
    assert_eq!(parse_version("const String = 3"), None);
    assert_eq!(parse_version("const String = \"\""), None);
  }

  #[test]
  fn dev_versions_need_override() {
    assert!(matches!(
      check_release_version("1.2.3-dev", false),
      Err(ReleaseError::PreRelease { .. })
    ));
    assert!(check_release_version("1.2.3-dev", true).is_ok());
    assert!(check_release_version("1.2.3", false).is_ok());
    assert!(check_release_version("0.9.0-rc1", false).is_err());
    assert!(check_release_version("v0.9-dev", false).is_err());
  }

  #[test]
  fn render_substitutes_all_values() {
    let sha = hash_bytes(b"zip bytes");
    let formula = render_formula("0.9.1", "qri_darwin_amd64.zip", &sha);

    assert!(formula.contains(
      "url \"https://github.com/qri-io/qri/releases/download/v0.9.1/qri_darwin_amd64.zip\""
    ));
    assert!(formula.contains("version \"0.9.1\""));
    assert!(formula.contains(&format!("sha256 \"{sha}\"")));
    assert!(formula.contains("system \"#{bin}/qri\", \"version\""));
    assert!(!formula.contains('$'));
  }

  #[tokio::test]
  async fn writes_formula_into_tap() {
    let fx = Fixture::new(VERSION_GO);

    let release = write_formula(&fx.options).await.unwrap();

    assert_eq!(release.path, fx.temp.path().join("homebrew-qri").join("qri.rb"));
    assert_eq!(release.version, "0.9.1");
    let written = std::fs::read_to_string(&release.path).unwrap();
    assert!(written.contains(&hash_bytes(b"zip bytes").to_string()));
    assert!(written.contains("/v0.9.1/qri_darwin_amd64.zip"));
  }

  #[tokio::test]
  async fn dev_version_refused_without_writing() {
    let fx = Fixture::new("const String = \"0.9.2-dev\"\n");

    let err = write_formula(&fx.options).await.unwrap_err();

    assert_eq!(err.to_string(), "cannot publish a development version: \"0.9.2-dev\"");
    assert!(!fx.options.tap.join(FORMULA_FILE).exists());
  }

  #[tokio::test]
  async fn dev_version_allowed_with_override() {
    let mut fx = Fixture::new("const String = \"0.9.2-dev\"\n");
    fx.options.ignore_dev_restriction = true;

    let release = write_formula(&fx.options).await.unwrap();
    assert_eq!(release.version, "0.9.2-dev");
  }

  #[tokio::test]
  async fn missing_arguments_are_named() {
    let options = FormulaOptions::new(None, None);
    let err = write_formula(&options).await.unwrap_err();
    assert_eq!(
      err.to_string(),
      "required flags: --src <path to qri source> --zip <path to zip release>"
    );

    let options = FormulaOptions::new(Some(PathBuf::from("qri")), None);
    let err = write_formula(&options).await.unwrap_err();
    assert_eq!(err.to_string(), "required flags: --zip <path to zip release>");
  }

  #[tokio::test]
  async fn tap_must_be_directory() {
    let mut fx = Fixture::new(VERSION_GO);
    fx.options.tap = fx.temp.path().join("qri_darwin_amd64.zip");

    let err = write_formula(&fx.options).await.unwrap_err();
    assert!(matches!(err, ReleaseError::NotADirectory { .. }));
  }

  #[tokio::test]
  async fn missing_version_line_is_error() {
    let fx = Fixture::new("package version\n");

    let err = write_formula(&fx.options).await.unwrap_err();
    assert!(matches!(err, ReleaseError::VersionNotFound { .. }));
  }

  #[tokio::test]
  async fn missing_zip_is_io_error() {
    let mut fx = Fixture::new(VERSION_GO);
    fx.options.zip = Some(fx.temp.path().join("nope.zip"));

    let err = write_formula(&fx.options).await.unwrap_err();
    assert!(matches!(err, ReleaseError::Io { .. }));
  }
}
