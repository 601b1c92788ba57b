//! External process invocation wrapper.
//!
//! Every shell-out in labctl routes through [`execute`] so that environment
//! overlays (ephemeral secrets), working-directory overrides, and failure
//! translation happen in exactly one place.

use crate::core::error::LabError;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Options for a single external invocation.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Working directory override; inherits the process cwd when `None`.
    pub cwd: Option<PathBuf>,
    /// Environment overlay applied on top of the inherited environment.
    /// Secrets reach child processes only through this map.
    pub env: BTreeMap<String, String>,
    /// When true (the default via [`ExecOptions::checked`]), a non-zero exit
    /// becomes `LabError::Exec`. When false the caller inspects `failed`.
    pub check: bool,
}

impl ExecOptions {
    pub fn checked() -> Self {
        ExecOptions {
            check: true,
            ..Default::default()
        }
    }

    pub fn unchecked() -> Self {
        ExecOptions {
            check: false,
            ..Default::default()
        }
    }

    pub fn with_env(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env = env.clone();
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// Captured result of one external invocation.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub failed: bool,
}

fn joined(command: &str, args: &[&str]) -> String {
    if args.is_empty() {
        command.to_string()
    } else {
        format!("{} {}", command, args.join(" "))
    }
}

/// Run `command args...`, capturing stdout/stderr/exit code.
///
/// A spawn failure (binary missing, permission denied) is always an error
/// regardless of `options.check`.
pub fn execute(
    command: &str,
    args: &[&str],
    options: &ExecOptions,
) -> Result<ExecOutput, LabError> {
    let mut cmd = Command::new(command);
    cmd.args(args);
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (k, v) in &options.env {
        cmd.env(k, v);
    }

    let output = cmd.output().map_err(|e| LabError::Exec {
        command: joined(command, args),
        stderr: e.to_string(),
    })?;

    let exit_code = output.status.code().unwrap_or(-1);
    let result = ExecOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code,
        failed: !output.status.success(),
    };

    if result.failed && options.check {
        return Err(LabError::Exec {
            command: joined(command, args),
            stderr: result.stderr.trim().to_string(),
        });
    }

    Ok(result)
}

/// Run a command and return its trimmed stdout. Always errs on failure.
pub fn capture_output(
    command: &str,
    args: &[&str],
    options: &ExecOptions,
) -> Result<String, LabError> {
    let mut opts = options.clone();
    opts.check = true;
    let out = execute(command, args, &opts)?;
    Ok(out.stdout.trim().to_string())
}

/// Run a command and parse its stdout as JSON.
pub fn capture_json<T: DeserializeOwned>(
    command: &str,
    args: &[&str],
    options: &ExecOptions,
) -> Result<T, LabError> {
    let stdout = capture_output(command, args, options)?;
    serde_json::from_str(&stdout).map_err(|e| {
        LabError::Parse(format!(
            "invalid JSON from `{}`: {}",
            joined(command, args),
            e
        ))
    })
}

/// Probe whether `name` resolves to a spawnable binary. Never errs: a
/// missing binary is `false`, not a failure (exit code is irrelevant).
pub fn command_exists(name: &str) -> bool {
    Command::new(name)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}
