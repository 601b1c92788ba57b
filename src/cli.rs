//! CLI struct definitions for the labctl command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(
    name = "labctl",
    version = env!("CARGO_PKG_VERSION"),
    about = "Home-lab control CLI: preflight check chains in front of OpenTofu → Ansible → Kubernetes, with ephemeral credentials."
)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

/// Filter and output flags shared by the chain-running commands.
#[derive(clap::Args, Debug, Clone)]
pub(crate) struct RunFlags {
    /// Only run checks carrying at least one of these tags.
    #[clap(long = "only-tags", value_delimiter = ',')]
    pub only_tags: Vec<String>,
    /// First check id to run (inclusive; default: start of the run).
    #[clap(long)]
    pub from: Option<String>,
    /// Last check id to run (inclusive; default: end of the run).
    #[clap(long)]
    pub to: Option<String>,
    /// Emit the structured report instead of human output.
    #[clap(long)]
    pub json: bool,
    /// Print per-check timing information.
    #[clap(long, short = 'v')]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Run the validation chains (smoke, preflight) without mutating anything
    Check {
        #[clap(flatten)]
        flags: RunFlags,
    },
    /// Orchestrate the full pipeline: preflight → provision → configure → workloads
    Up {
        #[clap(flatten)]
        flags: RunFlags,
        /// Validate only: pipeline steps use their tools' no-op modes and
        /// chain failures never short-circuit the sequence.
        #[clap(long)]
        dry_run: bool,
    },
    /// Ephemeral-secret lifecycle
    Secrets(SecretsCli),
    /// Vault configuration inspection
    Vault(VaultCli),
    /// Print version
    Version,
}

#[derive(clap::Args, Debug)]
pub(crate) struct SecretsCli {
    #[clap(subcommand)]
    pub command: SecretsCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum SecretsCommand {
    /// Report staleness of the ephemeral secret file
    Status,
    /// Generate a fresh ephemeral secret file and leave it on disk
    Generate,
    /// Delete the ephemeral secret file if present
    Cleanup,
    /// Validate the reference template and show per-kind rotation hints
    Template {
        /// Emit entries as JSON.
        #[clap(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct VaultCli {
    #[clap(subcommand)]
    pub command: VaultCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum VaultCommand {
    /// List configured vaults and the active selection
    List,
    /// Show one vault's configuration
    Show {
        /// Vault id (defaults to the active vault).
        id: Option<String>,
    },
}
