//! Zip packaging of a built binary plus its rendered readme.
//!
//! Every archive of a run carries the same [`BuildStamp`] on both entries, so
//! the archives differ only by their binaries. The zip writer records Unix as
//! the creating system, which is what makes `unzip` restore the 0755 mode on
//! the binary.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime, Timelike, Utc};
use thiserror::Error;
use tracing::{info, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::consts::{README_ENTRY, README_TEMPLATE};
use crate::platform::BuildTarget;
use crate::template::{TemplateError, TemplateSet};

const BINARY_MODE: u32 = 0o755;
const README_MODE: u32 = 0o644;

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("failed to create archive {}: {source}", path.display())]
  CreateArchive { path: PathBuf, source: std::io::Error },

  #[error("failed to read binary {}: {source}", path.display())]
  ReadBinary { path: PathBuf, source: std::io::Error },

  #[error("readme: {0}")]
  Template(#[from] TemplateError),

  #[error("failed to write {entry} into archive: {source}")]
  WriteEntry { entry: String, source: ZipError },

  #[error("failed to finish archive {}: {source}", path.display())]
  Finish { path: PathBuf, source: ZipError },
}

/// The modification time stamped on every entry of a run's archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStamp(zip::DateTime);

impl BuildStamp {
  /// The current UTC time. Falls back to the zip epoch (1980-01-01) if the
  /// clock is outside what zip can represent.
  pub fn now() -> Self {
    Self::from_naive(Utc::now().naive_utc()).unwrap_or_else(|| {
      warn!("system clock outside zip date range, using 1980-01-01");
      Self(zip::DateTime::default())
    })
  }

  /// `None` if `at` is outside the zip range (1980..=2107).
  pub fn from_naive(at: NaiveDateTime) -> Option<Self> {
    let year = u16::try_from(at.year()).ok()?;
    zip::DateTime::from_date_and_time(
      year,
      at.month() as u8,
      at.day() as u8,
      at.hour() as u8,
      at.minute() as u8,
      at.second() as u8,
    )
    .ok()
    .map(Self)
  }

  pub fn to_zip(self) -> zip::DateTime {
    self.0
  }
}

/// Everything about packaging that is shared by all targets of a run.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
  pub bin_name: String,
  pub output_dir: PathBuf,
  pub templates_dir: PathBuf,
  pub readme_template: String,
  pub stamp: BuildStamp,
}

impl ArchiveOptions {
  pub fn new(bin_name: impl Into<String>, output_dir: impl Into<PathBuf>, templates_dir: impl Into<PathBuf>) -> Self {
    Self {
      bin_name: bin_name.into(),
      output_dir: output_dir.into(),
      templates_dir: templates_dir.into(),
      readme_template: README_TEMPLATE.to_string(),
      stamp: BuildStamp::now(),
    }
  }

  /// `<output_dir>/<bin>_<platform>_<arch>.zip`
  pub fn archive_path(&self, target: &BuildTarget) -> PathBuf {
    self
      .output_dir
      .join(format!("{}.zip", target.artifact_stem(&self.bin_name)))
  }
}

/// Values available to the readme template.
pub fn readme_context(target: &BuildTarget, bin_name: &str) -> BTreeMap<String, String> {
  BTreeMap::from([
    ("Name".to_string(), bin_name.to_string()),
    ("Platform".to_string(), target.platform().to_string()),
    ("Arch".to_string(), target.arch().to_string()),
  ])
}

/// Package the binary in `build_dir` for `target` and return the archive path.
///
/// The readme is rendered before the archive is created, so template problems
/// never leave a half-written zip behind. Any write failure removes the
/// partial archive.
pub fn package(build_dir: &Path, target: &BuildTarget, options: &ArchiveOptions) -> Result<PathBuf, ArchiveError> {
  let archive_path = options.archive_path(target);
  let binary_name = target.binary_file_name(&options.bin_name);
  let binary_path = build_dir.join(&binary_name);

  info!(
    archive = %archive_path.display(),
    binary = %binary_path.display(),
    templates = %options.templates_dir.display(),
    "compressing"
  );

  let binary = std::fs::read(&binary_path).map_err(|source| ArchiveError::ReadBinary {
    path: binary_path.clone(),
    source,
  })?;

  let templates = TemplateSet::load(&options.templates_dir)?;
  let readme = templates
    .get(&options.readme_template)?
    .render(&readme_context(target, &options.bin_name))?;

  let file = File::create(&archive_path).map_err(|source| ArchiveError::CreateArchive {
    path: archive_path.clone(),
    source,
  })?;

  let written = write_entries(file, &archive_path, options.stamp, &binary_name, &binary, &readme);

  if let Err(e) = written {
    if let Err(rm) = std::fs::remove_file(&archive_path) {
      warn!(archive = %archive_path.display(), error = %rm, "failed to remove partial archive");
    }
    return Err(e);
  }

  Ok(archive_path)
}

fn write_entries(
  file: File,
  archive_path: &Path,
  stamp: BuildStamp,
  binary_name: &str,
  binary: &[u8],
  readme: &str,
) -> Result<(), ArchiveError> {
  let mut zip = ZipWriter::new(file);
  write_entry(&mut zip, binary_name, entry_options(stamp, BINARY_MODE), binary)?;
  write_entry(&mut zip, README_ENTRY, entry_options(stamp, README_MODE), readme.as_bytes())?;

  let finish_err = |source| ArchiveError::Finish {
    path: archive_path.to_path_buf(),
    source,
  };
  let mut file = zip.finish().map_err(finish_err)?;
  file.flush().map_err(|e| finish_err(ZipError::Io(e)))?;
  Ok(())
}

fn entry_options(stamp: BuildStamp, mode: u32) -> SimpleFileOptions {
  SimpleFileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .last_modified_time(stamp.to_zip())
    .unix_permissions(mode)
}

fn write_entry(zip: &mut ZipWriter<File>, name: &str, options: SimpleFileOptions, data: &[u8]) -> Result<(), ArchiveError> {
  let entry_err = |source| ArchiveError::WriteEntry {
    entry: name.to_string(),
    source,
  };
  zip.start_file(name, options).map_err(entry_err)?;
  zip.write_all(data).map_err(|e| entry_err(ZipError::Io(e)))?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::write_template;
  use chrono::NaiveDate;
  use std::io::Read;
  use tempfile::TempDir;

  const README: &str = "# {{.Name}}\n\nBuilt for {{.Platform}} ({{.Arch}}).\n";

  fn fixed_stamp() -> BuildStamp {
    let at = NaiveDate::from_ymd_opt(2020, 5, 17).unwrap().and_hms_opt(12, 30, 10).unwrap();
    BuildStamp::from_naive(at).unwrap()
  }

  struct Fixture {
    temp: TempDir,
    options: ArchiveOptions,
  }

  impl Fixture {
    fn new() -> Self {
      let temp = TempDir::new().unwrap();
      let templates = temp.path().join("templates");
      let output = temp.path().join("out");
      std::fs::create_dir_all(&output).unwrap();
      write_template(&templates, README_TEMPLATE, README);

      let mut options = ArchiveOptions::new("qri", output, templates);
      options.stamp = fixed_stamp();
      Self { temp, options }
    }

    fn build_dir(&self, target: &BuildTarget) -> PathBuf {
      let dir = self.temp.path().join(target.artifact_stem("qri"));
      std::fs::create_dir_all(&dir).unwrap();
      std::fs::write(dir.join(target.binary_file_name("qri")), b"\x7fELF fake").unwrap();
      dir
    }
  }

  #[test]
  fn archive_has_binary_and_readme() {
    let fx = Fixture::new();
    let target = BuildTarget::new("linux", "amd64").unwrap();
    let build_dir = fx.build_dir(&target);

    let path = package(&build_dir, &target, &fx.options).unwrap();
    assert_eq!(path, fx.options.output_dir.join("qri_linux_amd64.zip"));

    let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
    assert_eq!(archive.len(), 2);

    let (bin_mode, bin_modified) = {
      let mut bin = archive.by_name("qri").unwrap();
      let mut data = Vec::new();
      bin.read_to_end(&mut data).unwrap();
      assert_eq!(data, b"\x7fELF fake");
      (bin.unix_mode().unwrap(), bin.last_modified())
    };

    let (readme_mode, readme_modified) = {
      let mut readme = archive.by_name(README_ENTRY).unwrap();
      let mut text = String::new();
      readme.read_to_string(&mut text).unwrap();
      assert_eq!(text, "# qri\n\nBuilt for linux (amd64).\n");
      (readme.unix_mode().unwrap(), readme.last_modified())
    };

    assert_eq!(bin_mode & 0o777, 0o755);
    assert_eq!(readme_mode & 0o777, 0o644);
    assert_eq!(bin_modified, readme_modified);
    assert_eq!(bin_modified, Some(fixed_stamp().to_zip()));
  }

  #[test]
  fn windows_archive_holds_exe() {
    let fx = Fixture::new();
    let target = BuildTarget::new("windows", "386").unwrap();
    let build_dir = fx.build_dir(&target);

    let path = package(&build_dir, &target, &fx.options).unwrap();

    let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
    assert!(archive.by_name("qri.exe").is_ok());
  }

  #[test]
  fn missing_binary_is_read_error() {
    let fx = Fixture::new();
    let target = BuildTarget::new("linux", "amd64").unwrap();
    let empty = fx.temp.path().join("empty");
    std::fs::create_dir_all(&empty).unwrap();

    let err = package(&empty, &target, &fx.options).unwrap_err();
    assert!(matches!(err, ArchiveError::ReadBinary { .. }));
  }

  #[test]
  fn missing_template_is_fatal_and_leaves_no_archive() {
    let mut fx = Fixture::new();
    fx.options.readme_template = "missing.md".to_string();
    let target = BuildTarget::new("darwin", "amd64").unwrap();
    let build_dir = fx.build_dir(&target);

    let err = package(&build_dir, &target, &fx.options).unwrap_err();

    assert!(matches!(err, ArchiveError::Template(TemplateError::NotFound { .. })));
    assert!(!fx.options.archive_path(&target).exists());
  }

  #[test]
  fn malformed_template_directory_is_fatal() {
    let fx = Fixture::new();
    write_template(&fx.options.templates_dir, "broken.md", "{{.Platform");
    let target = BuildTarget::new("linux", "amd64").unwrap();
    let build_dir = fx.build_dir(&target);

    let err = package(&build_dir, &target, &fx.options).unwrap_err();
    assert!(matches!(err, ArchiveError::Template(TemplateError::Parse { .. })));
  }

  #[test]
  fn missing_output_directory_is_create_error() {
    let mut fx = Fixture::new();
    fx.options.output_dir = fx.temp.path().join("does").join("not").join("exist");
    let target = BuildTarget::new("linux", "amd64").unwrap();
    let build_dir = fx.build_dir(&target);

    let err = package(&build_dir, &target, &fx.options).unwrap_err();
    assert!(matches!(err, ArchiveError::CreateArchive { .. }));
  }

  #[test]
  fn stamp_outside_zip_range_is_rejected() {
    let at = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    assert!(BuildStamp::from_naive(at).is_none());
  }
}
