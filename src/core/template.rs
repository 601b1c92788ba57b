//! Declarative secret-reference template parsing.
//!
//! The committed template never holds real values, only `op://` pointers:
//!
//! ```text
//! # Proxmox
//! PROXMOX_API_TOKEN="op://homelab/proxmox/api-token"
//! ```
//!
//! Each entry gets a [`SecretKind`] inferred from the referenced field name,
//! driving per-kind format validation and rotation hints through one closed
//! enum instead of string matching at every use site.

use crate::core::error::LabError;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

pub const REFERENCE_SCHEME: &str = "op://";

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SecretKind {
    ProxmoxApiToken,
    SshPublicKey,
    SshPrivateKey,
    TailscaleAuthKey,
    Password,
    Unknown,
}

impl SecretKind {
    /// Inference is by substring on the reference's field segment.
    pub fn infer(field: &str) -> Self {
        if field.contains("api-token") {
            SecretKind::ProxmoxApiToken
        } else if field.contains("public-key") {
            SecretKind::SshPublicKey
        } else if field.contains("private-key") {
            SecretKind::SshPrivateKey
        } else if field.contains("auth-key") {
            SecretKind::TailscaleAuthKey
        } else if field.contains("password") {
            SecretKind::Password
        } else {
            SecretKind::Unknown
        }
    }

    /// Short operator hint for rotating this kind of material.
    pub fn rotation_hint(self) -> &'static str {
        match self {
            SecretKind::ProxmoxApiToken => {
                "Rotate in the Proxmox UI (Datacenter → API Tokens), then update the store item"
            }
            SecretKind::SshPublicKey => {
                "Regenerate the keypair with ssh-keygen and update both key fields together"
            }
            SecretKind::SshPrivateKey => {
                "Regenerate the keypair with ssh-keygen and update both key fields together"
            }
            SecretKind::TailscaleAuthKey => {
                "Issue a fresh pre-auth key in the Tailscale admin console (they expire)"
            }
            SecretKind::Password => "Rotate at the owning service, then update the store item",
            SecretKind::Unknown => "No rotation guidance for this field; review it manually",
        }
    }

    /// Loose shape validation of a resolved value for this kind.
    pub fn plausible_value(self, value: &str) -> bool {
        match self {
            SecretKind::ProxmoxApiToken => value.contains('=') && value.contains('!'),
            SecretKind::SshPublicKey => value.starts_with("ssh-"),
            SecretKind::SshPrivateKey => value.contains("PRIVATE KEY"),
            SecretKind::TailscaleAuthKey => value.starts_with("tskey-"),
            SecretKind::Password | SecretKind::Unknown => !value.is_empty(),
        }
    }
}

/// One parsed template line: env name, store reference, inferred kind.
#[derive(Debug, Serialize, Clone)]
pub struct TemplateEntry {
    pub name: String,
    pub reference: String,
    pub kind: SecretKind,
}

impl TemplateEntry {
    /// A reference must carry at least vault/item/field after the scheme.
    pub fn validate_reference(&self) -> Result<(), LabError> {
        let Some(path) = self.reference.strip_prefix(REFERENCE_SCHEME) else {
            return Err(LabError::Validation(format!(
                "{}: reference does not start with {}",
                self.name, REFERENCE_SCHEME
            )));
        };
        let segments = path.split('/').filter(|s| !s.is_empty()).count();
        if segments < 3 {
            return Err(LabError::Validation(format!(
                "{}: reference needs vault/item/field, got {} segment(s): {}",
                self.name, segments, self.reference
            )));
        }
        Ok(())
    }
}

fn line_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^([A-Za-z_][A-Za-z0-9_]*)="(op://[^"]+)"$"#).expect("valid template regex")
    })
}

/// Parse template text into ordered entries.
///
/// Blank lines and `#` comments are ignored. Lines that do not match the
/// `NAME="op://..."` shape are excluded silently; reference-shape problems
/// (too few segments) are surfaced by [`TemplateEntry::validate_reference`],
/// which [`validate_template`] applies across the whole file.
pub fn parse_template(content: &str) -> Vec<TemplateEntry> {
    let mut entries = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(caps) = line_pattern().captures(line) {
            let reference = caps[2].to_string();
            let kind = SecretKind::infer(reference.rsplit('/').next().unwrap_or(""));
            entries.push(TemplateEntry {
                name: caps[1].to_string(),
                reference,
                kind,
            });
        }
    }
    entries
}

pub fn parse_template_file(path: &Path) -> Result<Vec<TemplateEntry>, LabError> {
    if !path.is_file() {
        return Err(LabError::Config(format!(
            "missing secret template: {}",
            path.display()
        )));
    }
    Ok(parse_template(&fs::read_to_string(path)?))
}

/// Validate every entry's reference shape, collecting all problems.
pub fn validate_template(entries: &[TemplateEntry]) -> Result<(), LabError> {
    let problems: Vec<String> = entries
        .iter()
        .filter_map(|e| e.validate_reference().err().map(|err| err.to_string()))
        .collect();
    if problems.is_empty() {
        Ok(())
    } else {
        Err(LabError::Validation(problems.join("; ")))
    }
}
