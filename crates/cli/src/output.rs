//! Terminal reporting for release commands.
//!
//! Human-readable reports go to stdout, prefixed with a status mark that is
//! colored only when stdout is a terminal. Failures go to stderr. Library logs
//! are separate and always reach stderr through tracing.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

/// How a command reports its result.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  /// One pretty-printed JSON document on stdout.
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// The mark in front of a report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Done,
  Failed,
  Note,
}

impl Status {
  fn mark(self) -> &'static str {
    match self {
      Status::Done => "✓",
      Status::Failed => "✗",
      Status::Note => "•",
    }
  }
}

pub const ARROW: &str = "→";

/// Print one report line. Failed lines go to stderr.
pub fn report(status: Status, message: &str) {
  let mark = status.mark();
  match status {
    Status::Done => println!("{} {message}", mark.if_supports_color(Stream::Stdout, |s| s.green())),
    Status::Note => println!("{} {message}", mark.if_supports_color(Stream::Stdout, |s| s.blue())),
    Status::Failed => eprintln!(
      "{} {}",
      mark.if_supports_color(Stream::Stderr, |s| s.red()),
      message.if_supports_color(Stream::Stderr, |s| s.red())
    ),
  }
}

/// An indented `label: value` line under a report.
pub fn field(label: &str, value: impl std::fmt::Display) {
  println!("  {}: {value}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()));
}

pub fn emit_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
  println!("{json}");
  Ok(())
}

/// Human size of the file at `path`, e.g. `12.4 MB`. `None` if it can't be read.
pub fn file_size(path: &Path) -> Option<String> {
  let bytes = std::fs::metadata(path).ok()?.len();
  Some(human_size(bytes))
}

fn human_size(bytes: u64) -> String {
  const UNITS: [&str; 3] = ["KB", "MB", "GB"];
  if bytes < 1024 {
    return format!("{bytes} B");
  }
  let mut size = bytes as f64 / 1024.0;
  let mut unit = 0;
  while size >= 1024.0 && unit < UNITS.len() - 1 {
    size /= 1024.0;
    unit += 1;
  }
  format!("{size:.1} {}", UNITS[unit])
}

/// Wall time of a run: `850ms`, `4.2s` or `3m 07s`.
pub fn elapsed(duration: Duration) -> String {
  let secs = duration.as_secs();
  if secs >= 60 {
    format!("{}m {:02}s", secs / 60, secs % 60)
  } else if secs > 0 {
    format!("{:.1}s", duration.as_secs_f64())
  } else {
    format!("{}ms", duration.as_millis())
  }
}
