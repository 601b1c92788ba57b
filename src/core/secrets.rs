//! Ephemeral-secret lifecycle manager.
//!
//! Lifecycle per process: `warn_if_stale → generate → load → (checks run) →
//! cleanup`. The resolved secrets live in one git-ignored file for exactly
//! the lifetime of the run: generation always starts from a deleted file,
//! cleanup is registered both for SIGINT and (via `Drop`) for normal exit,
//! and loaded values travel as an explicit environment overlay instead of
//! mutating global process state.

use crate::core::error::LabError;
use crate::core::exec::{self, ExecOptions};
use colored::Colorize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default secret-store injector binary (1Password CLI).
pub const DEFAULT_INJECTOR: &str = "op";

#[derive(Debug)]
pub struct SecretsManager {
    template_path: PathBuf,
    secrets_path: PathBuf,
    injector: String,
    generated: bool,
    loaded: bool,
}

impl SecretsManager {
    pub fn new(template_path: impl Into<PathBuf>, secrets_path: impl Into<PathBuf>) -> Self {
        SecretsManager {
            template_path: template_path.into(),
            secrets_path: secrets_path.into(),
            injector: DEFAULT_INJECTOR.to_string(),
            generated: false,
            loaded: false,
        }
    }

    /// Swap the injector binary (tests use a stub script).
    pub fn with_injector(mut self, injector: impl Into<String>) -> Self {
        self.injector = injector.into();
        self
    }

    pub fn secrets_path(&self) -> &Path {
        &self.secrets_path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// True iff the ephemeral file is already on disk — leftovers from a
    /// prior abnormal exit. Read-only.
    pub fn is_stale(&self) -> bool {
        self.secrets_path.is_file()
    }

    /// Non-fatal: `generate` overwrites regardless.
    pub fn warn_if_stale(&self) {
        if self.is_stale() {
            eprintln!(
                "{} stale secret file from a previous run: {} (will be regenerated)",
                "warning:".yellow().bold(),
                self.secrets_path.display()
            );
        }
    }

    /// Delete any leftover file, then materialize a fresh one via the
    /// store's template injection (`op inject -i <tpl> -o <file>`).
    ///
    /// Store unreachable / unauthenticated / unresolvable references all
    /// surface as `LabError::Generation` and abort startup; the old file is
    /// never merged with new content.
    pub fn generate(&mut self) -> Result<(), LabError> {
        if self.secrets_path.exists() {
            fs::remove_file(&self.secrets_path)?;
        }
        if let Some(parent) = self.secrets_path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !self.template_path.is_file() {
            return Err(LabError::Generation(format!(
                "missing secret template: {}",
                self.template_path.display()
            )));
        }

        let template = self.template_path.to_string_lossy().to_string();
        let output = self.secrets_path.to_string_lossy().to_string();
        exec::execute(
            &self.injector,
            &["inject", "-i", &template, "-o", &output],
            &ExecOptions::checked(),
        )
        .map_err(|e| LabError::Generation(e.to_string()))?;

        if !self.secrets_path.is_file() {
            return Err(LabError::Generation(format!(
                "injector reported success but produced no file: {}",
                self.secrets_path.display()
            )));
        }
        self.generated = true;
        Ok(())
    }

    /// Parse the generated file into an environment overlay.
    ///
    /// Contract: `generate` must have produced the file; a missing file is a
    /// `LabError::Load` and nothing is mutated.
    pub fn load(&mut self) -> Result<BTreeMap<String, String>, LabError> {
        if !self.secrets_path.is_file() {
            return Err(LabError::Load(format!(
                "ephemeral secret file not found (generate must run first): {}",
                self.secrets_path.display()
            )));
        }
        let content = fs::read_to_string(&self.secrets_path)?;
        let env = parse_env_lines(&content);
        self.loaded = true;
        Ok(env)
    }

    /// Best-effort delete. Errors are logged, never raised: cleanup must
    /// never be why a command exits non-zero.
    pub fn cleanup(&self) {
        if !self.secrets_path.exists() {
            return;
        }
        if let Err(e) = fs::remove_file(&self.secrets_path) {
            eprintln!(
                "{} could not remove {}: {}",
                "warning:".yellow().bold(),
                self.secrets_path.display(),
                e
            );
        }
    }

    /// Hand ownership of the generated file to the caller: `Drop` will no
    /// longer delete it. Used by the explicit `secrets generate` command,
    /// where the operator removes it later via `secrets cleanup`.
    pub fn persist(&mut self) {
        self.generated = false;
    }

    /// Trap SIGINT to delete the ephemeral file before terminating.
    /// Normal-exit cleanup rides on `Drop`; SIGTERM/SIGKILL remain an
    /// accepted gap.
    pub fn register_cleanup(&self) {
        let path = self.secrets_path.clone();
        let result = ctrlc::set_handler(move || {
            let _ = fs::remove_file(&path);
            std::process::exit(0);
        });
        if let Err(e) = result {
            eprintln!(
                "{} could not install interrupt handler: {}",
                "warning:".yellow().bold(),
                e
            );
        }
    }
}

impl Drop for SecretsManager {
    fn drop(&mut self) {
        // Only remove material this process created; a read-only inspection
        // of someone else's stale file must not destroy the evidence.
        if self.generated {
            self.cleanup();
        }
    }
}

/// Parse `KEY=value` lines: blanks and `#` comments skipped, split on the
/// first `=`, one pair of wrapping double quotes stripped.
pub fn parse_env_lines(content: &str) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        env.insert(key.trim().to_string(), value.to_string());
    }
    env
}

/// Composite startup helper: `warn_if_stale → generate → load →
/// register_cleanup`, returning the manager and the loaded overlay.
pub fn initialize_secrets(
    template_path: &Path,
    secrets_path: &Path,
) -> Result<(SecretsManager, BTreeMap<String, String>), LabError> {
    let mut manager = SecretsManager::new(template_path, secrets_path);
    manager.warn_if_stale();
    manager.generate()?;
    let env = manager.load()?;
    manager.register_cleanup();
    Ok((manager, env))
}
