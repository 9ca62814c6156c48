//! Bar/slot notation layout
//!
//! The end product of the pipeline: bars of a fixed beat count, each split
//! into contiguous chord slots a chart renderer can draw directly. Slots
//! carry their provenance so user edits survive re-analysis: a `Manual` slot
//! is never overwritten by [`merge_bars`], the automatic result is carved
//! around it instead.

pub mod segmenter;

pub use segmenter::layout_bars;

use serde::{Deserialize, Serialize};

use crate::analysis::ChordHypothesis;
use crate::config::AnalysisConfig;

/// Tolerance for beat-geometry comparisons
const BEAT_EPSILON: f32 = 1e-4;

/// Provenance of a slot's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotOrigin {
    /// Produced by analysis; a later run may replace it
    Automatic,
    /// Edited by the user; merges must preserve it exactly
    Manual,
}

/// One chord slot within a bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Offset from the bar start, in beats
    pub beat_offset: f32,
    /// Length in beats
    pub beat_len: f32,
    /// Chord sounding through this slot, if any
    pub hypothesis: Option<ChordHypothesis>,
    /// Where the content came from
    pub origin: SlotOrigin,
}

impl Slot {
    /// End of the slot in beats from the bar start
    pub fn end(&self) -> f32 {
        self.beat_offset + self.beat_len
    }
}

/// One bar of the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Zero-based position in the chart
    pub index: usize,
    /// Start of the bar in seconds on the aligned beat grid
    pub start_time: f32,
    /// Contiguous chord slots partitioning the bar
    pub slots: Vec<Slot>,
}

impl Bar {
    /// Whether the slots exactly partition `[0, beats)`: sorted, contiguous,
    /// positive lengths, no gaps or overlap
    pub fn is_exact_partition(&self, beats: f32) -> bool {
        if self.slots.is_empty() {
            return false;
        }
        let mut cursor = 0.0f32;
        for slot in &self.slots {
            if (slot.beat_offset - cursor).abs() > BEAT_EPSILON || slot.beat_len <= 0.0 {
                return false;
            }
            cursor += slot.beat_len;
        }
        (cursor - beats).abs() < BEAT_EPSILON
    }

    /// True when any slot carries user-edited content
    pub fn has_manual_slots(&self) -> bool {
        self.slots.iter().any(|s| s.origin == SlotOrigin::Manual)
    }
}

/// Merge a fresh automatic layout with a previously edited one
///
/// Bars with no manual slots take the automatic result wholesale. Where the
/// previous chart has manual slots, those slots are kept exactly and the
/// automatic slots are clipped into the gaps around them. Edited bars beyond
/// the end of the new analysis are appended unchanged rather than dropped;
/// their original indices and times are kept so the caller can decide how to
/// present them.
pub fn merge_bars(auto: &[Bar], previous: &[Bar], config: &AnalysisConfig) -> Vec<Bar> {
    let beats = config.beats_per_bar as f32;
    let mut merged: Vec<Bar> = Vec::with_capacity(auto.len());

    for (i, bar) in auto.iter().enumerate() {
        let manual: Vec<Slot> = previous
            .get(i)
            .map(|p| {
                p.slots
                    .iter()
                    .filter(|s| s.origin == SlotOrigin::Manual)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        if manual.is_empty() {
            merged.push(bar.clone());
        } else {
            merged.push(carve_around_manual(bar, manual, beats));
        }
    }

    let kept_tail = previous
        .iter()
        .skip(auto.len())
        .filter(|bar| bar.has_manual_slots());
    for bar in kept_tail {
        log::debug!("Keeping edited bar {} beyond the new analysis", bar.index);
        merged.push(bar.clone());
    }

    merged
}

/// Rebuild one bar: manual slots verbatim, automatic content in the gaps
fn carve_around_manual(auto: &Bar, mut manual: Vec<Slot>, beats: f32) -> Bar {
    manual.sort_by(|a, b| {
        a.beat_offset
            .partial_cmp(&b.beat_offset)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut slots: Vec<Slot> = Vec::new();
    let mut cursor = 0.0f32;
    for slot in manual {
        if slot.end() <= cursor + BEAT_EPSILON || slot.beat_offset >= beats - BEAT_EPSILON {
            continue;
        }
        if slot.beat_offset > cursor + BEAT_EPSILON {
            fill_from_automatic(&mut slots, auto, cursor, slot.beat_offset);
        }
        slots.push(slot);
        cursor = slot.end().min(beats);
    }
    if cursor < beats - BEAT_EPSILON {
        fill_from_automatic(&mut slots, auto, cursor, beats);
    }

    Bar {
        index: auto.index,
        start_time: auto.start_time,
        slots,
    }
}

/// Clip the automatic slots overlapping `[from, to)` into the output
fn fill_from_automatic(slots: &mut Vec<Slot>, auto: &Bar, from: f32, to: f32) {
    for slot in &auto.slots {
        let lo = slot.beat_offset.max(from);
        let hi = slot.end().min(to);
        if hi - lo > BEAT_EPSILON {
            slots.push(Slot {
                beat_offset: lo,
                beat_len: hi - lo,
                hypothesis: slot.hypothesis,
                origin: SlotOrigin::Automatic,
            });
        }
    }
}
