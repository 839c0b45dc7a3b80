//! Build targets and the platform x architecture matrix.

use std::fmt;

use thiserror::Error;

const WINDOWS: &str = "windows";

/// The `GOOS` name of the running platform.
pub fn host_os() -> Option<&'static str> {
  match std::env::consts::OS {
    "linux" => Some("linux"),
    "macos" => Some("darwin"),
    "windows" => Some(WINDOWS),
    "freebsd" => Some("freebsd"),
    _ => None,
  }
}

/// The `GOARCH` name of the running architecture.
pub fn host_arch() -> Option<&'static str> {
  match std::env::consts::ARCH {
    "x86_64" => Some("amd64"),
    "x86" => Some("386"),
    "aarch64" => Some("arm64"),
    "arm" => Some("arm"),
    _ => None,
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
  #[error("build target has an empty {0}")]
  EmptyComponent(&'static str),

  #[error("build matrix has no {0}")]
  EmptyAxis(&'static str),

  #[error("unsupported host platform: {os}/{arch}")]
  UnsupportedHost { os: String, arch: String },
}

/// One (platform, architecture) pair to cross-compile for, e.g. `darwin/amd64`.
///
/// Both parts are opaque to this crate; they are handed to the toolchain as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildTarget {
  platform: String,
  arch: String,
}

impl BuildTarget {
  pub fn new(platform: impl Into<String>, arch: impl Into<String>) -> Result<Self, PlatformError> {
    let platform = platform.into().trim().to_string();
    let arch = arch.into().trim().to_string();
    if platform.is_empty() {
      return Err(PlatformError::EmptyComponent("platform"));
    }
    if arch.is_empty() {
      return Err(PlatformError::EmptyComponent("architecture"));
    }
    Ok(Self { platform, arch })
  }

  /// The target matching the machine we're running on.
  pub fn host() -> Result<Self, PlatformError> {
    match (host_os(), host_arch()) {
      (Some(os), Some(arch)) => Ok(Self {
        platform: os.to_string(),
        arch: arch.to_string(),
      }),
      _ => Err(PlatformError::UnsupportedHost {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
      }),
    }
  }

  pub fn platform(&self) -> &str {
    &self.platform
  }

  pub fn arch(&self) -> &str {
    &self.arch
  }

  /// `<bin>_<platform>_<arch>`, the stem shared by build dirs and archives.
  pub fn artifact_stem(&self, bin_name: &str) -> String {
    format!("{}_{}_{}", bin_name, self.platform, self.arch)
  }

  /// The file name a binary called `bin_name` gets on this target.
  pub fn binary_file_name(&self, bin_name: &str) -> String {
    if self.platform == WINDOWS && !bin_name.ends_with(".exe") {
      format!("{bin_name}.exe")
    } else {
      bin_name.to_string()
    }
  }
}

impl fmt::Display for BuildTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.platform, self.arch)
  }
}

/// The platforms and architectures a release is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMatrix {
  platforms: Vec<String>,
  arches: Vec<String>,
}

impl BuildMatrix {
  /// Entries are trimmed, blanks dropped and duplicates removed (first wins).
  pub fn new<P, A>(platforms: P, arches: A) -> Result<Self, PlatformError>
  where
    P: IntoIterator,
    P::Item: AsRef<str>,
    A: IntoIterator,
    A::Item: AsRef<str>,
  {
    let platforms = normalize(platforms);
    let arches = normalize(arches);
    if platforms.is_empty() {
      return Err(PlatformError::EmptyAxis("platforms"));
    }
    if arches.is_empty() {
      return Err(PlatformError::EmptyAxis("architectures"));
    }
    Ok(Self { platforms, arches })
  }

  pub fn platforms(&self) -> &[String] {
    &self.platforms
  }

  pub fn arches(&self) -> &[String] {
    &self.arches
  }

  /// Number of targets in the product.
  pub fn len(&self) -> usize {
    self.platforms.len() * self.arches.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Every (platform, arch) combination, platform-major.
  pub fn targets(&self) -> Vec<BuildTarget> {
    self
      .platforms
      .iter()
      .flat_map(|platform| {
        self.arches.iter().map(move |arch| BuildTarget {
          platform: platform.clone(),
          arch: arch.clone(),
        })
      })
      .collect()
  }
}

fn normalize<I>(values: I) -> Vec<String>
where
  I: IntoIterator,
  I::Item: AsRef<str>,
{
  let mut out: Vec<String> = Vec::new();
  for value in values {
    let value = value.as_ref().trim();
    if !value.is_empty() && !out.iter().any(|v| v == value) {
      out.push(value.to_string());
    }
  }
  out
}
