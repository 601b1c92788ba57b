//! Declarative-config validity checks: template shape, vault config, IaC.

use crate::core::check::{Check, Outcome};
use crate::core::context::VaultsConfig;
use crate::core::exec::{self, ExecOptions};
use crate::core::template;

/// Parse the committed reference template and validate every reference's
/// vault/item/field shape.
pub fn template_check() -> Check {
    Check::new(
        "template-shape",
        "Secret template well-formed",
        &["preflight", "secrets"],
        |ctx| {
            let entries = match template::parse_template_file(&ctx.template_path) {
                Ok(entries) => entries,
                Err(e) => return Ok(Outcome::fail("template unreadable").with_detail(e.to_string())),
            };
            if entries.is_empty() {
                return Ok(Outcome::warn("template contains no references"));
            }
            if let Err(e) = template::validate_template(&entries) {
                return Ok(Outcome::fail("malformed references").with_detail(e.to_string()));
            }
            Ok(Outcome::pass(format!("{} reference(s)", entries.len()))
                .with_payload(serde_json::json!({ "references": entries.len() })))
        },
    )
}

/// The resolved active vault should be one of the configured vaults.
pub fn vault_config_check() -> Check {
    Check::new(
        "vault-config",
        "Vault configuration consistent",
        &["preflight", "config"],
        |ctx| {
            let config = match VaultsConfig::load(&ctx.root) {
                Ok(config) => config,
                Err(e) => return Ok(Outcome::fail("vaults.toml unreadable").with_detail(e.to_string())),
            };
            if config.vaults.is_empty() {
                return Ok(Outcome::warn("no vaults declared in vaults.toml"));
            }
            if config.vaults.contains_key(&ctx.vault) {
                Ok(Outcome::pass(format!("active vault '{}' declared", ctx.vault)))
            } else {
                Ok(Outcome::warn(format!(
                    "active vault '{}' not declared in vaults.toml",
                    ctx.vault
                )))
            }
        },
    )
}

/// `tofu validate` over the infrastructure manifests, when present.
pub fn tofu_validate_check() -> Check {
    Check::new(
        "tofu-validate",
        "Infrastructure manifests valid",
        &["preflight", "config"],
        |ctx| {
            let infra = ctx.root.join("infra");
            if !infra.is_dir() {
                return Ok(Outcome::skip("no infra/ directory"));
            }
            let out = exec::execute(
                "tofu",
                &["validate", "-no-color"],
                &ExecOptions::unchecked().in_dir(&infra),
            )?;
            if out.failed {
                return Ok(Outcome::fail("tofu validate failed")
                    .with_detail(out.stderr.trim().to_string()));
            }
            Ok(Outcome::pass("manifests valid"))
        },
    )
}

pub fn checks() -> Vec<Check> {
    vec![template_check(), vault_config_check(), tofu_validate_check()]
}
