//! Multi-chain orchestration with stop-on-first-failure.
//!
//! Chains run sequentially against one shared context. Outside dry-run mode
//! a chain containing any failed check halts the sequence; dry-run always
//! executes every chain so validation output stays complete.
//!
//! The id-range filter is resolved here, against the whole run: `--from` and
//! `--to` may name checks in different chains, so endpoints are looked up
//! across every chain in declared order before any chain executes.

use crate::core::chain::{self, ChainFilter, ChainObserver, ChainReport};
use crate::core::check::Check;
use crate::core::context::RunContext;
use crate::core::error::LabError;

/// A named chain: an ordered list of checks executed together.
pub struct Chain {
    pub name: String,
    pub checks: Vec<Check>,
}

impl Chain {
    pub fn new(name: impl Into<String>, checks: Vec<Check>) -> Self {
        Chain {
            name: name.into(),
            checks,
        }
    }
}

/// Resolve the run-level id range into one local filter per chain.
///
/// Endpoints are positioned in the flattened check sequence across all
/// chains. A chain wholly outside the resulting window yields `None` and is
/// skipped; a chain the window overlaps gets its endpoints clamped to its
/// own checks. An id found in no chain, or a start positioned after the end,
/// is a hard configuration error.
fn resolve_windows(
    chains: &[Chain],
    filter: &ChainFilter,
) -> Result<Vec<Option<ChainFilter>>, LabError> {
    if filter.from.is_none() && filter.to.is_none() {
        return Ok(chains.iter().map(|_| Some(filter.clone())).collect());
    }

    let flat: Vec<&str> = chains
        .iter()
        .flat_map(|c| c.checks.iter().map(|check| check.id.as_str()))
        .collect();
    let position = |id: &str| -> Result<usize, LabError> {
        flat.iter()
            .position(|candidate| *candidate == id)
            .ok_or_else(|| LabError::Config(format!("unknown check id in range filter: {}", id)))
    };

    let start = match filter.from.as_deref() {
        Some(id) => position(id)?,
        None => 0,
    };
    let end = match filter.to.as_deref() {
        Some(id) => position(id)?,
        None => flat.len().saturating_sub(1),
    };
    if start > end {
        return Err(LabError::Config(format!(
            "range filter out of order: --from {} comes after --to {}",
            filter.from.as_deref().unwrap_or("<start>"),
            filter.to.as_deref().unwrap_or("<end>")
        )));
    }

    let mut windows = Vec::with_capacity(chains.len());
    let mut offset = 0;
    for chain_def in chains {
        let first = offset;
        let next = offset + chain_def.checks.len();
        offset = next;
        if next <= start || first > end {
            windows.push(None);
            continue;
        }
        windows.push(Some(ChainFilter {
            tags: filter.tags.clone(),
            from: (start > first).then(|| flat[start].to_string()),
            to: (end + 1 < next).then(|| flat[end].to_string()),
        }));
    }
    Ok(windows)
}

/// Run `chains` in declared order, returning the (possibly partial) reports.
pub fn run_chains(
    chains: &[Chain],
    filter: &ChainFilter,
    ctx: &RunContext,
    observer: &mut dyn ChainObserver,
) -> Result<Vec<ChainReport>, LabError> {
    let windows = resolve_windows(chains, filter)?;
    let mut reports = Vec::with_capacity(chains.len());
    for (chain_def, window) in chains.iter().zip(windows) {
        let Some(local) = window else { continue };
        let report = chain::run_chain(&chain_def.name, &chain_def.checks, &local, ctx, observer)?;
        let halt = report.has_failures() && !ctx.dry_run;
        reports.push(report);
        if halt {
            break;
        }
    }
    Ok(reports)
}
