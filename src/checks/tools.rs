//! Tool presence and version probes for the wrapped CLIs.

use crate::core::check::{Check, Outcome};
use crate::core::exec::{self, ExecOptions};

fn version_probe(id: &str, title: &str, binary: &'static str, args: &'static [&'static str]) -> Check {
    Check::new(id, title, &["smoke", "tools"], move |_ctx| {
        if !exec::command_exists(binary) {
            return Ok(Outcome::fail(format!("{} not found on PATH", binary)));
        }
        let out = exec::execute(binary, args, &ExecOptions::unchecked())?;
        if out.failed {
            return Ok(Outcome::warn(format!(
                "{} present but version probe exited {}",
                binary, out.exit_code
            ))
            .with_detail(out.stderr.trim().to_string()));
        }
        let version = out.stdout.lines().next().unwrap_or("").trim().to_string();
        Ok(Outcome::pass(version))
    })
}

pub fn checks() -> Vec<Check> {
    vec![
        version_probe("tofu-version", "OpenTofu available", "tofu", &["version"]),
        version_probe(
            "ansible-version",
            "Ansible available",
            "ansible-playbook",
            &["--version"],
        ),
        version_probe(
            "kubectl-version",
            "kubectl available",
            "kubectl",
            &["version", "--client"],
        ),
        version_probe("op-version", "1Password CLI available", "op", &["--version"]),
        version_probe(
            "tailscale-version",
            "Tailscale CLI available",
            "tailscale",
            &["version"],
        ),
    ]
}
