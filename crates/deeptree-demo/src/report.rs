#![forbid(unsafe_code)]

//! Run reports in text and JSON form.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use deeptree_core::{CounterSnapshot, Marker};
use serde::Serialize;

use crate::app::{Policy, Variant};
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub variant: Variant,
    pub policy: Policy,
    pub above_depth: u32,
    pub below_depth: u32,
    pub mount: StepReport,
    pub steps: Vec<StepReport>,
    pub totals: CounterSnapshot,
    pub output: Vec<ChainReport>,
    pub status: String,
}

/// Counter deltas caused by one trigger (or by the mount).
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub trigger: Option<String>,
    pub changed: bool,
    pub recomputed: usize,
    pub delta: CounterSnapshot,
}

/// Output markers of one tree, innermost level first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub label: String,
    pub depth: usize,
    pub markers: Vec<Marker>,
}

impl ChainReport {
    #[must_use]
    pub fn from_markers(markers: Vec<Marker>) -> Self {
        let label = markers
            .iter()
            .find_map(|marker| match marker {
                Marker::Leaf { label } => Some(label.clone()),
                Marker::Level { .. } => None,
            })
            .unwrap_or_default();
        let depth = markers.iter().filter(|marker| !marker.is_leaf()).count();
        Self {
            label,
            depth,
            markers,
        }
    }

    /// Compact form: `3 2 1 [below]`.
    #[must_use]
    pub fn compact(&self) -> String {
        self.markers
            .iter()
            .map(|marker| match marker {
                Marker::Level { level, .. } => level.to_string(),
                Marker::Leaf { label } => format!("[{label}]"),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn render_json(report: &RunReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[must_use]
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "variant: {} (above depth {}, below depth {})",
        report.variant.name(),
        report.above_depth,
        report.below_depth
    );
    let _ = writeln!(out, "  {}", report.variant.describe());

    write_step(&mut out, "mount", &report.mount);
    for (index, step) in report.steps.iter().enumerate() {
        let title = format!(
            "step {}: {}",
            index + 1,
            step.trigger.as_deref().unwrap_or("?")
        );
        write_step(&mut out, &title, step);
    }

    let _ = writeln!(out, "totals: {} recomputes", report.totals.total);
    write_counts(&mut out, "", &report.totals.recomputes);
    write_counts(&mut out, "memo skip ", &report.totals.memo_skips);
    write_counts(&mut out, "memo bypass ", &report.totals.memo_bypasses);

    let _ = writeln!(out, "output:");
    for chain in &report.output {
        let _ = writeln!(out, "  {} (depth {}): {}", chain.label, chain.depth, chain.compact());
    }
    let _ = writeln!(out, "status: {}", report.status);
    out
}

fn write_step(out: &mut String, title: &str, step: &StepReport) {
    if !step.changed {
        let _ = writeln!(out, "{title}: unchanged, nothing recomputed");
        return;
    }
    let _ = writeln!(out, "{title}: {} recomputed", step.recomputed);
    write_counts(out, "+", &step.delta.recomputes);
    write_counts(out, "memo skip +", &step.delta.memo_skips);
    write_counts(out, "memo bypass +", &step.delta.memo_bypasses);
}

fn write_counts(out: &mut String, prefix: &str, counts: &BTreeMap<String, u64>) {
    for (category, count) in counts {
        let _ = writeln!(out, "    {prefix}{count} {category}");
    }
}
