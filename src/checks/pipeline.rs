//! Provisioning pipeline steps wrapped as checks.
//!
//! Each step shells out to its collaborator with the secrets overlay applied
//! and honors `--dry-run` by substituting the tool's own no-op mode
//! (`tofu plan`, `ansible-playbook --check`, `kubectl --dry-run=client`).

use crate::core::check::{Check, Outcome};
use crate::core::exec::{self, ExecOptions};

pub fn tofu_plan() -> Check {
    Check::new("tofu-plan", "Plan infrastructure changes", &["provision"], |ctx| {
        let infra = ctx.root.join("infra");
        if !infra.is_dir() {
            return Ok(Outcome::skip("no infra/ directory"));
        }
        let opts = ExecOptions::unchecked()
            .with_env(&ctx.secrets_env)
            .in_dir(&infra);
        // -detailed-exitcode: 0 = no changes, 2 = changes pending.
        let out = exec::execute(
            "tofu",
            &["plan", "-no-color", "-detailed-exitcode"],
            &opts,
        )?;
        match out.exit_code {
            0 => Ok(Outcome::pass("no changes")),
            2 => Ok(Outcome::pass("changes pending")),
            _ => Ok(Outcome::fail("plan failed").with_detail(out.stderr.trim().to_string())),
        }
    })
}

pub fn tofu_apply() -> Check {
    Check::new("tofu-apply", "Apply infrastructure changes", &["provision"], |ctx| {
        if ctx.dry_run {
            return Ok(Outcome::skip("dry-run: apply not executed"));
        }
        let infra = ctx.root.join("infra");
        if !infra.is_dir() {
            return Ok(Outcome::skip("no infra/ directory"));
        }
        let opts = ExecOptions::unchecked()
            .with_env(&ctx.secrets_env)
            .in_dir(&infra);
        let out = exec::execute("tofu", &["apply", "-no-color", "-auto-approve"], &opts)?;
        if out.failed {
            return Ok(Outcome::fail("apply failed").with_detail(out.stderr.trim().to_string()));
        }
        Ok(Outcome::pass("infrastructure applied"))
    })
}

pub fn ansible_configure() -> Check {
    Check::new("ansible-site", "Configure nodes", &["configure"], |ctx| {
        let playbook_dir = ctx.root.join("ansible");
        if !playbook_dir.join("site.yml").is_file() {
            return Ok(Outcome::skip("no ansible/site.yml"));
        }
        let opts = ExecOptions::unchecked()
            .with_env(&ctx.secrets_env)
            .in_dir(&playbook_dir);
        let mut args = vec!["site.yml"];
        if ctx.dry_run {
            args.push("--check");
        }
        let out = exec::execute("ansible-playbook", &args, &opts)?;
        if out.failed {
            return Ok(Outcome::fail("playbook failed").with_detail(out.stderr.trim().to_string()));
        }
        Ok(Outcome::pass(if ctx.dry_run {
            "playbook check clean"
        } else {
            "nodes configured"
        }))
    })
}

pub fn kubectl_workloads() -> Check {
    Check::new("kubectl-apply", "Apply cluster workloads", &["workloads"], |ctx| {
        let manifests = ctx.root.join("cluster");
        if !manifests.is_dir() {
            return Ok(Outcome::skip("no cluster/ directory"));
        }
        let opts = ExecOptions::unchecked().with_env(&ctx.secrets_env);
        let path = manifests.to_string_lossy().to_string();
        let mut args = vec!["apply", "-k", path.as_str()];
        if ctx.dry_run {
            args.push("--dry-run=client");
        }
        let out = exec::execute("kubectl", &args, &opts)?;
        if out.failed {
            return Ok(Outcome::fail("apply failed").with_detail(out.stderr.trim().to_string()));
        }
        Ok(Outcome::pass(if ctx.dry_run {
            "manifests accepted (client dry-run)"
        } else {
            "workloads applied"
        }))
    })
}
