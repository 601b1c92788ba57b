//! Secrets lifecycle end-to-end: template → generate (stub injector) →
//! load → cleanup, plus the template round-trip properties.

use labctl::core::error::LabError;
use labctl::core::secrets::{self, SecretsManager};
use labctl::core::template::{self, SecretKind};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_stub_injector(dir: &Path) -> PathBuf {
    // Mimics `op inject -i <tpl> -o <out>`: resolves each reference to a
    // fixed value derived from its field name.
    let path = dir.join("stub-op");
    fs::write(
        &path,
        r##"#!/bin/sh
tpl=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -i) tpl="$2"; shift ;;
    -o) out="$2"; shift ;;
  esac
  shift
done
: > "$out"
while IFS= read -r line; do
  case "$line" in
    ''|'#'*) continue ;;
  esac
  name="${line%%=*}"
  ref="${line#*=}"
  field="${ref##*/}"
  field="${field%\"}"
  printf '%s=resolved-%s\n' "$name" "$field" >> "$out"
done < "$tpl"
"##,
    )
    .unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

const TEMPLATE: &str = r#"# lab credentials
PROXMOX_API_TOKEN="op://homelab/proxmox/api-token"
SSH_PRIVATE_KEY="op://homelab/lab-ssh/private-key"
TAILSCALE_AUTH_KEY="op://homelab/tailscale/auth-key"
"#;

#[test]
fn full_lifecycle_generate_load_cleanup() {
    let tmp = tempdir().unwrap();
    let injector = write_stub_injector(tmp.path());
    let template_path = tmp.path().join("secrets.tpl");
    fs::write(&template_path, TEMPLATE).unwrap();
    let secrets_path = tmp.path().join(".secrets.env");

    let mut manager = SecretsManager::new(&template_path, &secrets_path)
        .with_injector(injector.to_string_lossy().to_string());

    assert!(!manager.is_stale());
    manager.generate().unwrap();
    assert!(secrets_path.exists());

    let env = manager.load().unwrap();
    assert_eq!(env.len(), 3);
    assert_eq!(env["PROXMOX_API_TOKEN"], "resolved-api-token");
    assert_eq!(env["TAILSCALE_AUTH_KEY"], "resolved-auth-key");

    manager.cleanup();
    assert!(!secrets_path.exists());
    manager.cleanup(); // idempotent
}

#[test]
fn regenerate_fully_discards_previous_content() {
    let tmp = tempdir().unwrap();
    let injector = write_stub_injector(tmp.path());
    let template_path = tmp.path().join("secrets.tpl");
    fs::write(&template_path, "ONLY_KEY=\"op://v/i/password\"\n").unwrap();
    let secrets_path = tmp.path().join(".secrets.env");
    fs::write(&secrets_path, "LEFTOVER=stale-value\nOTHER=thing\n").unwrap();

    let mut manager = SecretsManager::new(&template_path, &secrets_path)
        .with_injector(injector.to_string_lossy().to_string());
    assert!(manager.is_stale());
    manager.generate().unwrap();
    let env = manager.load().unwrap();
    assert_eq!(env.len(), 1);
    assert!(!env.contains_key("LEFTOVER"));
    assert_eq!(env["ONLY_KEY"], "resolved-password");
}

#[test]
fn load_without_generate_errs_and_mutates_nothing() {
    let tmp = tempdir().unwrap();
    let mut manager = SecretsManager::new(
        tmp.path().join("secrets.tpl"),
        tmp.path().join(".secrets.env"),
    );
    match manager.load() {
        Err(LabError::Load(msg)) => assert!(msg.contains("generate")),
        Err(other) => panic!("expected Load error, got {:?}", other),
        Ok(_) => panic!("load unexpectedly succeeded"),
    }
    assert!(!manager.is_loaded());
}

#[test]
fn initialize_secrets_aborts_on_missing_template() {
    let tmp = tempdir().unwrap();
    let err = secrets::initialize_secrets(
        &tmp.path().join("absent.tpl"),
        &tmp.path().join(".secrets.env"),
    )
    .unwrap_err();
    assert!(matches!(err, LabError::Generation(_)));
    assert!(!tmp.path().join(".secrets.env").exists());
}

#[test]
fn template_round_trip_well_formed_lines() {
    let entries = template::parse_template(TEMPLATE);
    assert_eq!(entries.len(), 3);
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        ["PROXMOX_API_TOKEN", "SSH_PRIVATE_KEY", "TAILSCALE_AUTH_KEY"]
    );
    assert!(template::validate_template(&entries).is_ok());
}

#[test]
fn template_malformed_lines_excluded_but_shape_errors_flagged() {
    let content = concat!(
        "GOOD=\"op://vault/item/field\"\n",
        "UNQUOTED=op://vault/item/field\n",
        "SHALLOW=\"op://vault/item\"\n",
    );
    let entries = template::parse_template(content);
    // UNQUOTED doesn't match the line shape at all; SHALLOW parses but its
    // reference fails shape validation.
    assert_eq!(entries.len(), 2);
    assert!(template::validate_template(&entries).is_err());
}

#[test]
fn kind_inference_and_hints_follow_field_names() {
    let entries = template::parse_template(TEMPLATE);
    assert_eq!(entries[0].kind, SecretKind::ProxmoxApiToken);
    assert_eq!(entries[1].kind, SecretKind::SshPrivateKey);
    assert_eq!(entries[2].kind, SecretKind::TailscaleAuthKey);
    assert!(entries[2].kind.rotation_hint().contains("Tailscale"));
}

#[test]
fn quoted_values_are_unwrapped_once() {
    let env = secrets::parse_env_lines("A=\"quoted value\"\nB=\"\"\nC=\"nested \"inner\" quotes\"\n");
    assert_eq!(env["A"], "quoted value");
    assert_eq!(env["B"], "");
    assert_eq!(env["C"], "nested \"inner\" quotes");
}
