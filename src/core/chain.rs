//! Chain engine: filter an ordered check list, run it in order, report.
//!
//! Filtering is tag intersection first, then an inclusive id-range slice
//! over the tag-filtered list. Execution is strictly sequential; a failing
//! check never aborts the rest of its chain. The engine is presentation-free:
//! completed reports are emitted to a [`ChainObserver`] and the caller
//! decides how (or whether) to render them.

use crate::core::check::{Check, CheckReport, CheckStatus, Outcome};
use crate::core::context::RunContext;
use crate::core::error::LabError;
use crate::core::time;
use serde::Serialize;
use std::time::Instant;

/// Filter options for one chain run. Both filters are optional and compose:
/// tags narrow first, then the id range slices what remains.
#[derive(Debug, Clone, Default)]
pub struct ChainFilter {
    pub tags: Vec<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Observer for completed check reports. The terminal progress renderer
/// implements this; JSON mode and tests use [`NoOpObserver`].
pub trait ChainObserver {
    fn on_chain_start(&mut self, _chain: &str, _total: usize) {}
    fn on_check_complete(&mut self, _chain: &str, _report: &CheckReport) {}
    fn on_chain_complete(&mut self, _report: &ChainReport) {}
}

pub struct NoOpObserver;

impl ChainObserver for NoOpObserver {}

/// Aggregate over one chain's ordered check reports. The per-status counts
/// partition `checks`; `duration_ms` is the sum of per-check durations.
#[derive(Debug, Serialize, Clone)]
pub struct ChainReport {
    pub name: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warned: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub summary: String,
    pub checks: Vec<CheckReport>,
}

impl ChainReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Top-level report surface: all chain reports plus a run summary.
#[derive(Debug, Serialize, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub ts: String,
    pub chains: Vec<ChainReport>,
    pub summary: RunSummary,
}

#[derive(Debug, Serialize, Clone)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl RunReport {
    pub fn new(chains: Vec<ChainReport>) -> Self {
        let total = chains.iter().map(|c| c.total).sum();
        let passed = chains.iter().map(|c| c.passed).sum();
        let failed = chains.iter().map(|c| c.failed).sum();
        RunReport {
            run_id: time::new_run_id(),
            ts: time::now_epoch_z(),
            chains,
            summary: RunSummary {
                total,
                passed,
                failed,
            },
        }
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}

/// Keep checks whose tag set intersects `tags`; empty request keeps all.
/// Original order is preserved.
pub fn filter_by_tags<'a>(checks: &'a [Check], tags: &[String]) -> Vec<&'a Check> {
    if tags.is_empty() {
        return checks.iter().collect();
    }
    checks.iter().filter(|c| c.has_any_tag(tags)).collect()
}

/// Inclusive id-range slice over an already-filtered list.
///
/// An id that does not resolve, or a `from` positioned after `to`, is a hard
/// configuration error rather than a silent fallback to the full list.
pub fn filter_by_range<'a>(
    checks: Vec<&'a Check>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Vec<&'a Check>, LabError> {
    let position = |id: &str| -> Result<usize, LabError> {
        checks
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| LabError::Config(format!("unknown check id in range filter: {}", id)))
    };

    let start = match from {
        Some(id) => position(id)?,
        None => 0,
    };
    let end = match to {
        Some(id) => position(id)?,
        None => checks.len().saturating_sub(1),
    };

    if checks.is_empty() {
        return Ok(checks);
    }
    if start > end {
        return Err(LabError::Config(format!(
            "range filter out of order: --from {} comes after --to {}",
            from.unwrap_or("<start>"),
            to.unwrap_or("<end>")
        )));
    }

    Ok(checks[start..=end].to_vec())
}

fn synthesize_summary(failed: usize, warned: usize) -> String {
    if failed > 0 {
        format!("{} check(s) failed", failed)
    } else if warned > 0 {
        format!("{} check(s) warned", warned)
    } else {
        "all checks passed".to_string()
    }
}

/// Run `checks` through the filters against `ctx`, in order, and report.
///
/// Every filtered check runs even when an earlier one fails; an `Err`
/// escaping a check body is downgraded to a Fail report with message
/// "Exception" and the error text as detail.
pub fn run_chain(
    name: &str,
    checks: &[Check],
    filter: &ChainFilter,
    ctx: &RunContext,
    observer: &mut dyn ChainObserver,
) -> Result<ChainReport, LabError> {
    let selected = filter_by_tags(checks, &filter.tags);
    let selected = filter_by_range(selected, filter.from.as_deref(), filter.to.as_deref())?;

    observer.on_chain_start(name, selected.len());

    let mut reports: Vec<CheckReport> = Vec::with_capacity(selected.len());
    for check in &selected {
        let started = Instant::now();
        let outcome = match check.run(ctx) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::fail("Exception").with_detail(e.to_string()),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let report = CheckReport {
            id: check.id.clone(),
            title: check.title.clone(),
            tags: check.tags.clone(),
            ts: time::now_epoch_z(),
            duration_ms,
            outcome,
        };
        observer.on_check_complete(name, &report);
        reports.push(report);
    }

    let count = |status: CheckStatus| reports.iter().filter(|r| r.status() == status).count();
    let failed = count(CheckStatus::Fail);
    let warned = count(CheckStatus::Warn);

    let report = ChainReport {
        name: name.to_string(),
        total: reports.len(),
        passed: count(CheckStatus::Pass),
        failed,
        warned,
        skipped: count(CheckStatus::Skip),
        duration_ms: reports.iter().map(|r| r.duration_ms).sum(),
        summary: synthesize_summary(failed, warned),
        checks: reports,
    };
    observer.on_chain_complete(&report);
    Ok(report)
}
