//! External command execution.
//!
//! Every tool the release pipeline drives (go, git, yarn, node, ipfs) runs
//! through [`CommandSpec`]. Arguments are always an explicit list, never a
//! formatted string split on spaces, so paths with spaces survive intact.
//!
//! Commands inherit the invoking environment. The overlay in
//! [`CommandSpec::env`] is layered on top of it and only replaces what it
//! names, `PATH` included.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
  /// The process could not be started (missing executable, bad cwd, ...).
  #[error("failed to start `{command}`: {source}")]
  Spawn { command: String, source: std::io::Error },

  /// The process ran and exited unsuccessfully.
  #[error("`{command}` failed with exit code {code:?}")]
  Failed { command: String, code: Option<i32> },
}

impl CommandError {
  /// The rendered command line that was attempted.
  pub fn command(&self) -> &str {
    match self {
      CommandError::Spawn { command, .. } | CommandError::Failed { command, .. } => command,
    }
  }
}

/// One external process invocation.
#[derive(Debug, Clone)]
pub struct CommandSpec {
  program: OsString,
  args: Vec<OsString>,
  cwd: Option<PathBuf>,
  env: BTreeMap<String, String>,
  quiet: bool,
}

impl CommandSpec {
  /// Start describing an invocation of `program`, resolved through `PATH`.
  pub fn new(program: impl AsRef<OsStr>) -> Self {
    Self {
      program: program.as_ref().to_os_string(),
      args: Vec::new(),
      cwd: None,
      env: BTreeMap::new(),
      quiet: false,
    }
  }

  pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
    self.args.push(arg.as_ref().to_os_string());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
  {
    self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
    self
  }

  /// Run in `dir` instead of the current directory.
  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// Add one variable to the environment overlay.
  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  /// Add every entry of `vars` to the environment overlay.
  pub fn envs<I, K, V>(mut self, vars: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    self.env.extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
    self
  }

  /// Don't echo the command line at info level. For output-parsing probes.
  pub fn quiet(mut self) -> Self {
    self.quiet = true;
    self
  }

  pub fn program(&self) -> &OsStr {
    &self.program
  }

  pub fn get_args(&self) -> &[OsString] {
    &self.args
  }

  pub fn get_current_dir(&self) -> Option<&Path> {
    self.cwd.as_deref()
  }

  pub fn env_overlay(&self) -> &BTreeMap<String, String> {
    &self.env
  }

  /// Render the command line for logs and error messages.
  ///
  /// Arguments containing whitespace (or empty ones) are single-quoted so the
  /// line can be pasted back into a shell.
  pub fn command_line(&self) -> String {
    std::iter::once(&self.program)
      .chain(self.args.iter())
      .map(|part| {
        let part = part.to_string_lossy();
        if part.is_empty() || part.chars().any(char::is_whitespace) {
          format!("'{part}'")
        } else {
          part.into_owned()
        }
      })
      .collect::<Vec<_>>()
      .join(" ")
  }

  fn prepare(&self) -> Command {
    let line = self.command_line();
    if self.quiet {
      debug!("$ {line}");
    } else {
      info!("$ {line}");
    }
    if let Some(dir) = &self.cwd {
      debug!(cwd = %dir.display(), "working directory");
    }

    let mut command = Command::new(&self.program);
    command.args(&self.args).envs(&self.env).stdin(Stdio::inherit()).stderr(Stdio::inherit());
    if let Some(dir) = &self.cwd {
      command.current_dir(dir);
    }
    command
  }

  /// Run to completion with stdout streamed to ours.
  pub async fn run(&self) -> Result<(), CommandError> {
    let status = self
      .prepare()
      .stdout(Stdio::inherit())
      .status()
      .await
      .map_err(|source| CommandError::Spawn {
        command: self.command_line(),
        source,
      })?;

    if !status.success() {
      return Err(CommandError::Failed {
        command: self.command_line(),
        code: status.code(),
      });
    }
    Ok(())
  }

  /// Run to completion and return everything written to stdout.
  ///
  /// Stderr still streams through so tool diagnostics stay visible.
  pub async fn output(&self) -> Result<String, CommandError> {
    let output = self
      .prepare()
      .stdout(Stdio::piped())
      .output()
      .await
      .map_err(|source| CommandError::Spawn {
        command: self.command_line(),
        source,
      })?;

    if !output.status.success() {
      return Err(CommandError::Failed {
        command: self.command_line(),
        code: output.status.code(),
      });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !stdout.is_empty() {
      debug!(stdout = %stdout.trim_end(), "command output");
    }
    Ok(stdout)
  }
}
