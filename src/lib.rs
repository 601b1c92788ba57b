//! labctl: home-lab provisioning behind check chains.
//!
//! **labctl is a single-binary control CLI for a home lab.** It fronts the
//! provisioning pipeline (OpenTofu → Ansible → Kubernetes workloads) with
//! ordered, tag-filterable check chains, and keeps every credential the
//! pipeline needs ephemeral: generated fresh from the secret store per run,
//! passed to child processes as an environment overlay, deleted on exit and
//! on interrupt.
//!
//! # Core model
//!
//! - **Check**: a named, tagged verification unit producing a
//!   pass/fail/warn/skip outcome.
//! - **Chain**: an ordered, filtered list of checks executed strictly
//!   sequentially; every filtered check runs even after a failure.
//! - **Orchestrator**: runs chains in declared order, halting after the
//!   first chain containing a failure — unless validating, where complete
//!   diagnostic output matters more than early exit.
//! - **Secrets lifecycle**: `warn_if_stale → generate → load → cleanup`,
//!   with cleanup wired to both normal exit and SIGINT.
//!
//! # Crate structure
//!
//! - [`core`]: engine machinery (check/chain/report, exec wrapper, secrets
//!   lifecycle, context/config resolution, terminal rendering)
//! - [`checks`]: thin collaborator checks over the wrapped CLIs and the
//!   chain registry

pub mod checks;
pub mod core;

mod cli;

use crate::cli::{Cli, Command, RunFlags, SecretsCommand, VaultCommand};
use crate::core::chain::{ChainFilter, ChainObserver, NoOpObserver, RunReport};
use crate::core::context::{RunContext, VaultsConfig, VAULTS_FILE};
use crate::core::error::LabError;
use crate::core::orchestrator::{self, Chain};
use crate::core::secrets::{initialize_secrets, SecretsManager};
use crate::core::template;
use crate::core::tui::{self, TerminalObserver};

use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Walk up from `start` to the first directory holding `vaults.toml`.
fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        if d.join(VAULTS_FILE).is_file() {
            return Some(d.to_path_buf());
        }
        dir = d.parent();
    }
    None
}

fn project_root() -> Result<PathBuf, LabError> {
    let cwd = std::env::current_dir()?;
    find_project_root(&cwd).ok_or_else(|| {
        LabError::Config(format!(
            "not inside a lab project (no {} found upward from {})",
            VAULTS_FILE,
            cwd.display()
        ))
    })
}

fn filter_from_flags(flags: &RunFlags) -> ChainFilter {
    ChainFilter {
        tags: flags.only_tags.clone(),
        from: flags.from.clone(),
        to: flags.to.clone(),
    }
}

/// Run `chains` and render the report; errs with `Validation` when any
/// executed check failed so the process exits non-zero.
fn run_and_report(
    chains: &[Chain],
    flags: &RunFlags,
    ctx: &RunContext,
) -> Result<(), LabError> {
    let filter = filter_from_flags(flags);
    let mut observer: Box<dyn ChainObserver> = if flags.json {
        Box::new(NoOpObserver)
    } else {
        Box::new(TerminalObserver::new(flags.verbose))
    };

    let reports = orchestrator::run_chains(chains, &filter, ctx, observer.as_mut())?;
    let run = RunReport::new(reports);

    if flags.json {
        println!("{}", serde_json::to_string_pretty(&run).map_err(|e| {
            LabError::Validation(e.to_string())
        })?);
    } else {
        println!();
        if run.has_failures() {
            println!(
                "{} {} of {} check(s) failed",
                "✗".bright_red().bold(),
                run.summary.failed,
                run.summary.total
            );
        } else {
            println!(
                "{} {} check(s), all good",
                "✓".bright_green().bold(),
                run.summary.total
            );
        }
    }

    if run.has_failures() {
        return Err(LabError::Validation(format!(
            "{} check(s) failed",
            run.summary.failed
        )));
    }
    Ok(())
}

fn run_check(flags: RunFlags) -> Result<(), LabError> {
    let root = project_root()?;
    // Validation-only: dry-run semantics, every chain executes, no secret
    // generation (material-dependent checks skip themselves).
    let ctx = RunContext::resolve(&root, true, flags.verbose)?;
    run_and_report(&checks::validation_chains(), &flags, &ctx)
}

fn run_up(flags: RunFlags, dry_run: bool) -> Result<(), LabError> {
    let root = project_root()?;
    let mut ctx = RunContext::resolve(&root, dry_run, flags.verbose)?;

    let (manager, secrets_env) = initialize_secrets(&ctx.template_path, &ctx.secrets_path)?;
    ctx.secrets_env = secrets_env;

    let result = run_and_report(&checks::orchestration_chains(), &flags, &ctx);
    manager.cleanup();
    result
}

fn run_secrets(command: SecretsCommand) -> Result<(), LabError> {
    let root = project_root()?;
    let ctx = RunContext::resolve(&root, true, false)?;

    match command {
        SecretsCommand::Status => {
            let manager = SecretsManager::new(&ctx.template_path, &ctx.secrets_path);
            if manager.is_stale() {
                println!(
                    "{} ephemeral file on disk: {} (stale — left by a previous run)",
                    "●".bright_yellow(),
                    ctx.secrets_path.display()
                );
            } else {
                println!("{} no ephemeral secret file on disk", "●".bright_green());
            }
        }
        SecretsCommand::Generate => {
            let mut manager = SecretsManager::new(&ctx.template_path, &ctx.secrets_path);
            manager.warn_if_stale();
            manager.generate()?;
            let env = manager.load()?;
            manager.persist();
            println!(
                "{} generated {} with {} value(s); remove with `labctl secrets cleanup`",
                "✓".bright_green().bold(),
                ctx.secrets_path.display(),
                env.len()
            );
        }
        SecretsCommand::Cleanup => {
            let manager = SecretsManager::new(&ctx.template_path, &ctx.secrets_path);
            manager.cleanup();
            println!("{} cleaned up", "✓".bright_green().bold());
        }
        SecretsCommand::Template { json } => {
            let entries = template::parse_template_file(&ctx.template_path)?;
            template::validate_template(&entries)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&entries)
                        .map_err(|e| LabError::Validation(e.to_string()))?
                );
            } else {
                tui::print_section(&format!("{} reference(s)", entries.len()));
                for entry in &entries {
                    println!("  {} → {}", entry.name.bold(), entry.reference);
                    println!("       {}", entry.kind.rotation_hint().bright_black());
                }
            }
        }
    }
    Ok(())
}

fn run_vault(command: VaultCommand) -> Result<(), LabError> {
    let root = project_root()?;
    let config = VaultsConfig::load(&root)?;
    let ctx = RunContext::resolve(&root, true, false)?;

    match command {
        VaultCommand::List => {
            for (id, entry) in &config.vaults {
                let marker = if *id == ctx.vault { "*" } else { " " };
                println!("{} {}  {}", marker.bright_green().bold(), id.bold(), entry.name);
            }
        }
        VaultCommand::Show { id } => {
            let id = id.unwrap_or_else(|| ctx.vault.clone());
            let entry = config
                .vaults
                .get(&id)
                .ok_or_else(|| LabError::NotFound(format!("vault '{}' not configured", id)))?;
            println!("id:          {}", entry.id);
            println!("name:        {}", entry.name);
            println!("description: {}", entry.description);
        }
    }
    Ok(())
}

pub fn run() -> Result<(), LabError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Check { flags } => run_check(flags),
        Command::Up { flags, dry_run } => run_up(flags, dry_run),
        Command::Secrets(secrets) => run_secrets(secrets.command),
        Command::Vault(vault) => run_vault(vault.command),
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_find_project_root_walks_upward() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join(VAULTS_FILE), "active = \"homelab\"\n").unwrap();
        let nested = tmp.path().join("infra/modules");
        std::fs::create_dir_all(&nested).unwrap();
        let found = find_project_root(&nested).unwrap();
        assert_eq!(
            found.canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_find_project_root_none_without_config() {
        let tmp = tempdir().unwrap();
        assert!(find_project_root(tmp.path()).is_none());
    }
}
