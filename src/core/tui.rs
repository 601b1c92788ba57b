//! Terminal rendering for chain runs.
//!
//! Human mode renders a status line per check as it completes and a boxed
//! summary table at the end. JSON mode bypasses this module entirely.

use crate::core::chain::{ChainObserver, ChainReport};
use crate::core::check::{CheckReport, CheckStatus};
use colored::Colorize;
use std::env;

const MIN_BOX_WIDTH: usize = 40;
const MAX_BOX_WIDTH: usize = 60;

pub fn terminal_width() -> usize {
    env::var("COLUMNS")
        .ok()
        .and_then(|c| c.parse().ok())
        .unwrap_or(80)
}

fn effective_width() -> usize {
    terminal_width().clamp(MIN_BOX_WIDTH, MAX_BOX_WIDTH)
}

fn box_top(width: usize) -> String {
    format!("╔{}╗", "═".repeat(width - 2))
}

fn box_bottom(width: usize) -> String {
    format!("╚{}╝", "═".repeat(width - 2))
}

fn box_row(content: &str, width: usize) -> String {
    let content_len = content.chars().count();
    let padding = width.saturating_sub(2).saturating_sub(content_len);
    let left = padding / 2;
    format!(
        "║{}{}{}║",
        " ".repeat(left),
        content,
        " ".repeat(padding - left)
    )
}

fn status_icon(status: CheckStatus) -> colored::ColoredString {
    match status {
        CheckStatus::Pass => "✅".bright_green(),
        CheckStatus::Fail => "❌".bright_red(),
        CheckStatus::Warn => "⚠️".bright_yellow(),
        CheckStatus::Skip => "⏭".bright_black(),
    }
}

pub fn print_section(title: &str) {
    println!();
    println!("{}", title.bold());
}

pub fn print_check_line(report: &CheckReport, verbose: bool) {
    let line = if verbose {
        format!(
            "[{}] {} ({} ms)",
            report.status().label(),
            report.title,
            report.duration_ms
        )
    } else {
        format!("[{}] {}", report.status().label(), report.title)
    };
    println!("  {} {}", status_icon(report.status()), line.bright_white());
    if report.status() != CheckStatus::Pass {
        if let Some(message) = &report.outcome.message {
            println!("       {}", message.bright_black());
        }
        if let Some(detail) = &report.outcome.detail {
            for detail_line in detail.lines() {
                println!("       {}", detail_line.bright_black());
            }
        }
    }
}

pub fn print_chain_summary(report: &ChainReport) {
    let width = effective_width();
    println!();
    println!("{}", box_top(width));
    println!(
        "{}",
        box_row(&format!("{} — {}", report.name.to_uppercase(), report.summary), width).bold()
    );
    println!("{}", box_bottom(width));
    println!(
        "  {:>3} ✅  {:>3} ❌  {:>3} ⚠️  {:>3} ⏭   {} ms",
        report.passed.to_string().bright_green(),
        report.failed.to_string().bright_red(),
        report.warned.to_string().bright_yellow(),
        report.skipped.to_string().bright_black(),
        report.duration_ms
    );
}

/// Live-progress observer for human-mode output.
pub struct TerminalObserver {
    verbose: bool,
}

impl TerminalObserver {
    pub fn new(verbose: bool) -> Self {
        TerminalObserver { verbose }
    }
}

impl ChainObserver for TerminalObserver {
    fn on_chain_start(&mut self, chain: &str, total: usize) {
        print_section(&format!("Chain: {} ({} check(s))", chain, total));
    }

    fn on_check_complete(&mut self, _chain: &str, report: &CheckReport) {
        print_check_line(report, self.verbose);
    }

    fn on_chain_complete(&mut self, report: &ChainReport) {
        print_chain_summary(report);
    }
}
