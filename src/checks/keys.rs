//! Key-material presence and shape checks over the loaded secrets overlay.

use crate::core::check::{Check, Outcome};
use crate::core::template::{self, SecretKind};

/// For every template reference with a known kind, the loaded overlay must
/// hold a value of plausible shape. Skips when no secrets were loaded
/// (validation-only runs don't generate material).
pub fn key_material_check() -> Check {
    Check::new(
        "key-material",
        "Credential material present and plausible",
        &["preflight", "secrets"],
        |ctx| {
            if ctx.secrets_env.is_empty() {
                return Ok(Outcome::skip("secrets not loaded for this run"));
            }
            let entries = match template::parse_template_file(&ctx.template_path) {
                Ok(entries) => entries,
                Err(e) => return Ok(Outcome::fail("template unreadable").with_detail(e.to_string())),
            };

            let mut missing: Vec<String> = Vec::new();
            let mut implausible: Vec<String> = Vec::new();
            for entry in &entries {
                match ctx.secrets_env.get(&entry.name) {
                    None => missing.push(entry.name.clone()),
                    Some(value) => {
                        if entry.kind != SecretKind::Unknown && !entry.kind.plausible_value(value) {
                            implausible.push(entry.name.clone());
                        }
                    }
                }
            }

            if !missing.is_empty() {
                return Ok(Outcome::fail(format!("{} value(s) missing", missing.len()))
                    .with_detail(missing.join("\n")));
            }
            if !implausible.is_empty() {
                return Ok(Outcome::warn(format!(
                    "{} value(s) look implausible for their kind",
                    implausible.len()
                ))
                .with_detail(implausible.join("\n")));
            }
            Ok(Outcome::pass(format!("{} value(s) resolved", entries.len())))
        },
    )
}

pub fn checks() -> Vec<Check> {
    vec![key_material_check()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::check::CheckStatus;
    use crate::core::context::RunContext;
    use tempfile::tempdir;

    fn ctx_with_template(lines: &str) -> (tempfile::TempDir, RunContext) {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("secrets.tpl");
        std::fs::write(&path, lines).unwrap();
        let mut ctx = RunContext::for_tests();
        ctx.template_path = path;
        (tmp, ctx)
    }

    #[test]
    fn test_skips_when_no_secrets_loaded() {
        let (_tmp, ctx) = ctx_with_template("A=\"op://v/i/password\"\n");
        let outcome = key_material_check().run(&ctx).unwrap();
        assert_eq!(outcome.status, CheckStatus::Skip);
    }

    #[test]
    fn test_fails_on_missing_value() {
        let (_tmp, mut ctx) = ctx_with_template("A=\"op://v/i/password\"\n");
        ctx.secrets_env
            .insert("OTHER".to_string(), "x".to_string());
        let outcome = key_material_check().run(&ctx).unwrap();
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert!(outcome.detail.unwrap().contains('A'));
    }

    #[test]
    fn test_warns_on_implausible_shape() {
        let (_tmp, mut ctx) = ctx_with_template("KEY=\"op://v/i/auth-key\"\n");
        ctx.secrets_env
            .insert("KEY".to_string(), "definitely-not-a-tskey".to_string());
        let outcome = key_material_check().run(&ctx).unwrap();
        assert_eq!(outcome.status, CheckStatus::Warn);
    }

    #[test]
    fn test_passes_on_plausible_values() {
        let (_tmp, mut ctx) = ctx_with_template("KEY=\"op://v/i/auth-key\"\n");
        ctx.secrets_env
            .insert("KEY".to_string(), "tskey-auth-abc123".to_string());
        let outcome = key_material_check().run(&ctx).unwrap();
        assert_eq!(outcome.status, CheckStatus::Pass);
    }
}
