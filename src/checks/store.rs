//! Secret-store (1Password CLI) reachability checks.

use crate::core::check::{Check, Outcome};
use crate::core::exec::{self, ExecOptions};

/// `op whoami` succeeds only with a live, authenticated session.
pub fn session_check() -> Check {
    Check::new(
        "op-session",
        "Secret store session active",
        &["smoke", "secrets"],
        |_ctx| {
            if !exec::command_exists("op") {
                return Ok(Outcome::fail("op not found on PATH"));
            }
            let out = exec::execute("op", &["whoami"], &ExecOptions::unchecked())?;
            if out.failed {
                return Ok(
                    Outcome::fail("not signed in to the secret store (run `op signin`)")
                        .with_detail(out.stderr.trim().to_string()),
                );
            }
            Ok(Outcome::pass(out.stdout.trim().to_string()))
        },
    )
}

/// The configured vault must actually exist in the store.
pub fn vault_check() -> Check {
    Check::new(
        "op-vault",
        "Active vault reachable",
        &["preflight", "secrets"],
        |ctx| {
            let out = exec::execute(
                "op",
                &["vault", "get", ctx.vault.as_str(), "--format=json"],
                &ExecOptions::unchecked(),
            )?;
            if out.failed {
                return Ok(Outcome::fail(format!("vault '{}' not reachable", ctx.vault))
                    .with_detail(out.stderr.trim().to_string()));
            }
            Ok(Outcome::pass(format!("vault '{}' found", ctx.vault)))
        },
    )
}

pub fn checks() -> Vec<Check> {
    vec![session_check(), vault_check()]
}
