//! Names and defaults shared across the build pipeline.

/// Name of the primary binary and the prefix of every artifact derived from it.
pub const BIN_NAME: &str = "qri";

/// Readme template looked up in the templates directory for each archive.
pub const README_TEMPLATE: &str = "qri_readme.md";

/// Name the rendered readme gets inside an archive.
pub const README_ENTRY: &str = "readme.md";

/// Oldest Go toolchain the primary binary can be built with.
pub const MIN_GO_VERSION: semver::Version = semver::Version::new(1, 12, 0);

/// Branch both source trees must have checked out before a desktop release.
pub const RELEASE_BRANCH: &str = "master";

/// Source file (relative to the primary repo) holding the version constant.
pub const VERSION_SOURCE: &str = "version/version.go";

/// Marker that identifies a line in `VERSION_SOURCE` carrying the version.
pub const VERSION_MARKER: &str = "const String";

/// File name of the rendered homebrew formula inside the tap.
pub const FORMULA_FILE: &str = "qri.rb";

/// Tap location relative to `$GOPATH` when none is given.
pub const DEFAULT_TAP: &str = "src/github.com/qri-io/homebrew-qri";

/// Installer extensions electron-builder produces across platforms.
pub const INSTALLER_SUFFIXES: &[&str] = &[".dmg", ".exe", ".AppImage", ".deb"];

/// Webpack configs of the desktop app's two bundles and the webapp.
pub const WEBPACK_MAIN_CONFIG: &str = "webpack.config.main.prod.js";
pub const WEBPACK_RENDERER_CONFIG: &str = "webpack.config.renderer.prod.js";
pub const WEBPACK_WEBAPP_CONFIG: &str = "webpack.config.webapp.prod.js";

/// Heap size the large renderer and webapp bundles need.
pub const NODE_OPTIONS: &str = "--max_old_space_size=10000";

pub const ENV_PLATFORM: &str = "QRI_BUILD_PLATFORM";
pub const ENV_ARCH: &str = "QRI_BUILD_ARCH";
pub const ENV_QRI: &str = "QRI_BUILD_QRI";
pub const ENV_TEMPLATES: &str = "QRI_BUILD_TEMPLATES";
pub const ENV_OUTPUT: &str = "QRI_BUILD_OUTPUT";
pub const ENV_JOBS: &str = "QRI_BUILD_JOBS";
pub const ENV_FRONTEND: &str = "QRI_BUILD_FRONTEND";
pub const ENV_DESKTOP: &str = "QRI_BUILD_DESKTOP";
pub const ENV_API_URL: &str = "QRI_BUILD_API_URL";
pub const ENV_ZIP: &str = "QRI_BUILD_ZIP";
pub const ENV_HOMEBREW_TAP: &str = "QRI_BUILD_HOMEBREW_TAP";
