//! Run context and configuration resolution.
//!
//! One [`RunContext`] is built per command invocation and handed read-only to
//! every check. It carries the resolved vault selection, the secret file
//! paths, a passthrough key/value bag merged from the process environment,
//! and the secrets environment overlay produced by the lifecycle manager.

use crate::core::error::LabError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const VAULTS_FILE: &str = "vaults.toml";
pub const TEMPLATE_FILE: &str = "secrets/secrets.tpl";
pub const SECRETS_FILE: &str = "secrets/.secrets.env";

/// Environment variable naming the active vault.
pub const ENV_VAULT: &str = "LABCTL_VAULT";
/// When set (non-empty), `LABCTL_VAULT` wins over the configured `active`.
pub const ENV_VAULT_OVERRIDE: &str = "LABCTL_VAULT_OVERRIDE";
/// Proxmox API endpoint, e.g. `https://pve.lab:8006`. Reaches checks through
/// the passthrough bag like every other `LABCTL_*` variable.
pub const ENV_PROXMOX_ENDPOINT: &str = "LABCTL_PROXMOX_ENDPOINT";

#[derive(Debug, Clone, Deserialize)]
pub struct VaultEntry {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// `vaults.toml`: a table of known vaults plus the configured active id.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct VaultsConfig {
    #[serde(default)]
    pub active: Option<String>,
    #[serde(default)]
    pub vaults: BTreeMap<String, VaultEntry>,
}

impl VaultsConfig {
    pub fn load(root: &Path) -> Result<Self, LabError> {
        let path = root.join(VAULTS_FILE);
        if !path.is_file() {
            return Err(LabError::Config(format!(
                "missing vault configuration: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(&path)?;
        let mut config: VaultsConfig = toml::from_str(&content)
            .map_err(|e| LabError::Config(format!("{}: {}", path.display(), e)))?;
        for (key, entry) in config.vaults.iter_mut() {
            if entry.id.is_empty() {
                entry.id = key.clone();
            }
        }
        Ok(config)
    }

    /// Resolve the active vault id.
    ///
    /// Precedence: `LABCTL_VAULT` when the override flag is set, then the
    /// configured `active` field, then plain `LABCTL_VAULT`, else a
    /// configuration error. `env_vault`/`override_set` are passed in by the
    /// caller so resolution stays testable without touching process state.
    pub fn resolve_active(
        &self,
        env_vault: Option<&str>,
        override_set: bool,
    ) -> Result<String, LabError> {
        if override_set {
            if let Some(v) = env_vault.filter(|v| !v.is_empty()) {
                return Ok(v.to_string());
            }
        }
        if let Some(active) = self.active.as_ref().filter(|a| !a.is_empty()) {
            return Ok(active.clone());
        }
        if let Some(v) = env_vault.filter(|v| !v.is_empty()) {
            return Ok(v.to_string());
        }
        Err(LabError::Config(format!(
            "no active vault: set `active` in {} or export {}",
            VAULTS_FILE, ENV_VAULT
        )))
    }
}

/// Per-invocation dependency bag passed to every check.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Project root (directory holding `vaults.toml`).
    pub root: PathBuf,
    /// Resolved secret-store vault id.
    pub vault: String,
    /// Declarative secret-reference template path.
    pub template_path: PathBuf,
    /// Derived ephemeral-secret-file path.
    pub secrets_path: PathBuf,
    /// Free-form passthrough pairs merged from the process environment
    /// (`LABCTL_*`). Open bag: new keys never break existing checks.
    pub extra: BTreeMap<String, String>,
    /// Secrets overlay loaded by the lifecycle manager; applied to every
    /// child process spawned through the exec wrapper.
    pub secrets_env: BTreeMap<String, String>,
    pub dry_run: bool,
    pub verbose: bool,
}

impl RunContext {
    /// Resolve configuration from `root` and the process environment.
    pub fn resolve(root: &Path, dry_run: bool, verbose: bool) -> Result<Self, LabError> {
        let config = VaultsConfig::load(root)?;
        let env_vault = std::env::var(ENV_VAULT).ok();
        let override_set = std::env::var(ENV_VAULT_OVERRIDE)
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        let vault = config.resolve_active(env_vault.as_deref(), override_set)?;

        let mut extra = BTreeMap::new();
        for (key, value) in std::env::vars() {
            if key.starts_with("LABCTL_") {
                extra.insert(key, value);
            }
        }

        Ok(RunContext {
            root: root.to_path_buf(),
            vault,
            template_path: root.join(TEMPLATE_FILE),
            secrets_path: root.join(SECRETS_FILE),
            extra,
            secrets_env: BTreeMap::new(),
            dry_run,
            verbose,
        })
    }

    /// Lookup in the passthrough bag, falling back to the secrets overlay.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .or_else(|| self.secrets_env.get(key))
            .map(|s| s.as_str())
    }

    /// Minimal context for unit tests: no config file required.
    pub fn for_tests() -> Self {
        RunContext {
            root: PathBuf::from("."),
            vault: "homelab".to_string(),
            template_path: PathBuf::from(TEMPLATE_FILE),
            secrets_path: PathBuf::from(SECRETS_FILE),
            extra: BTreeMap::new(),
            secrets_env: BTreeMap::new(),
            dry_run: true,
            verbose: false,
        }
    }
}
