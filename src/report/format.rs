//! Formatted terminal output for indicator sets and composite scores.
//!
//! We keep formatting code in one place so the engine and scorer stay free of
//! presentation concerns and output changes stay localized.

use crate::app::pipeline::{RunMode, ScoredRun};
use crate::domain::{IndicatorKind, IndicatorResult};
use crate::math::round1;
use crate::score::{BASIS_BONUS, MAX_COMPOSITE, Severity};

const BAR_WIDTH: usize = 20;

/// Format the full monitor report: one row per indicator plus the verdict.
pub fn format_report(run: &ScoredRun) -> String {
    let mut out = String::new();

    out.push_str("=== LME Copper Short-Squeeze Monitor ===\n");
    out.push_str(&format!(
        "Mode: {}\n\n",
        match run.mode {
            RunMode::Snapshot => "snapshot (latest observations)",
            RunMode::Live => "live (caller overrides)",
        }
    ));

    out.push_str(
        format!(
            "{:<20} {:>10} {:>18} {:>7} {:>7} {:<9} {}\n",
            "indicator", "as-of", "reference", "pctl", "points", "severity", "bar"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<20} {:-<10} {:-<18} {:-<7} {:-<7} {:-<9} {:-<width$}\n",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
            width = BAR_WIDTH
        )
        .trim_end(),
    );
    out.push('\n');

    for r in run.results.iter() {
        out.push_str(&format_row(r, run.score.bonus_applied));
        out.push('\n');
    }

    out.push('\n');
    let basis = &run.results.basis;
    out.push_str(&format!(
        "Basis gate: {:.1}th percentile -> {:.0}/{:.0} bonus\n",
        round1(basis.raw_percentile),
        run.score.bonus_applied,
        BASIS_BONUS
    ));
    out.push_str(&format!(
        "Composite: {:.1}/{:.0}  {} ({})\n",
        round1(run.score.composite),
        MAX_COMPOSITE,
        run.score.verdict.label().to_uppercase(),
        run.score.verdict.color()
    ));

    out
}

fn format_row(r: &IndicatorResult, bonus: f64) -> String {
    let points = match r.kind {
        IndicatorKind::BasisSpread => bonus,
        _ => r.value,
    };
    let marker = if r.overridden { "*" } else { " " };
    format!(
        "{:<20} {:>10} {:>18} {:>7.1} {:>7.1} {:<9} {}",
        r.kind.display_name(),
        r.as_of,
        format!("{}{marker}", fmt_reference(r.kind, r.reference)),
        round1(r.value),
        points,
        Severity::from_percentile(r.value).label(),
        bar(r.value),
    )
    .trim_end()
    .to_string()
}

/// Human units for the value each indicator was ranked on.
pub fn fmt_reference(kind: IndicatorKind, v: f64) -> String {
    match kind {
        IndicatorKind::Backwardation => format!("{:+.2}%", v * 100.0),
        IndicatorKind::InventoryTightness => format!("{:.1} kt", v / 1000.0),
        IndicatorKind::NetShorts => format!("{:+.1}k", v / 1000.0),
        IndicatorKind::BasisSpread => format!("{:+.0} USD/t", v),
    }
}

fn bar(value: f64) -> String {
    let filled = ((value.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled)
}
