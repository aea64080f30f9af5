//! Snapshot presentation: grouping, text histograms, JSON export.
//!
//! The engine exports a flat sorted `(key, counter)` sequence; this
//! module owns the policy of turning that into something readable,
//! including mean derivation from the sum slot.

use crate::aggregate::slot_bounds_us;
use crate::core::{HistKey, Result};
use serde::Serialize;
use std::fmt::Display;
use std::io::Write;

/// Width of the text histogram bar column.
const BAR_WIDTH: usize = 40;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Human-readable text histogram
    Text,
    /// Raw snapshot as JSON
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// All buckets of one dimension tuple, reassembled from a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DimsGroup<D> {
    /// The dimension tuple
    pub dims: D,
    /// Count per bucket, indexed by slot, length `max_slot + 1`
    pub counts: Vec<u64>,
    /// Total raw latency in microseconds (the sum slot)
    pub sum_us: u64,
}

impl<D> DimsGroup<D> {
    /// Total number of recorded operations.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Mean latency in integer microseconds, `None` when empty.
    pub fn mean_us(&self) -> Option<u64> {
        let total = self.total();
        (total > 0).then(|| self.sum_us / total)
    }
}

/// Group a sorted snapshot into per-dimension-tuple histograms.
///
/// Slots past `max_slot + 1` cannot be produced by the engine and are
/// ignored defensively rather than widening the bucket vector.
pub fn group_snapshot<D: PartialEq + Copy>(
    snapshot: &[(HistKey<D>, u64)],
    max_slot: u16,
) -> Vec<DimsGroup<D>> {
    let mut groups: Vec<DimsGroup<D>> = Vec::new();

    for (key, counter) in snapshot {
        if groups.last().map_or(true, |g| g.dims != key.dims) {
            groups.push(DimsGroup {
                dims: key.dims,
                counts: vec![0; max_slot as usize + 1],
                sum_us: 0,
            });
        }
        let group = groups.last_mut().expect("group pushed above");

        if key.slot <= max_slot {
            group.counts[key.slot as usize] = *counter;
        } else if key.slot == max_slot + 1 {
            group.sum_us = *counter;
        }
    }

    groups
}

/// Render grouped histograms as text, bcc-style.
pub fn render_text<D: Display>(
    groups: &[DimsGroup<D>],
    max_slot: u16,
    out: &mut impl Write,
) -> Result<()> {
    for group in groups {
        let total = group.total();
        writeln!(out, "{} (total {})", group.dims, total)?;
        if let Some(mean) = group.mean_us() {
            writeln!(out, "  mean latency: {}us", mean)?;
        }

        let peak = group.counts.iter().copied().max().unwrap_or(0);
        for (slot, &count) in group.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let (lo, hi) = slot_bounds_us(slot as u16, max_slot);
            let range = match hi {
                Some(hi) => format!("[{}us, {}us)", lo, hi),
                None => format!("[{}us, ...)", lo),
            };
            let bar_len = (count as usize * BAR_WIDTH) / peak.max(1) as usize;
            writeln!(out, "  {:>20} {:>10} |{:<width$}|", range, count, "#".repeat(bar_len), width = BAR_WIDTH)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Render grouped histograms as a JSON document.
pub fn render_json<D: Serialize>(groups: &[DimsGroup<D>]) -> Result<String> {
    Ok(serde_json::to_string_pretty(groups)?)
}
