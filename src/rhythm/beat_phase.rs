//! Beat-grid phase estimation
//!
//! The tempo estimator fixes the beat period; this module fixes where the
//! grid sits. Chord changes are the anchor: in most accompaniment playing a
//! new chord lands on a beat, so the signed offset of each confident chord
//! transition from its nearest grid line votes in a wrapped histogram, and
//! the histogram mode becomes the grid offset. When the transitions scatter
//! too widely the phase falls back to zero rather than committing to noise.

use crate::analysis::ChordFrame;
use crate::config::AnalysisConfig;

/// Bins in the wrapped phase histogram, spanning one beat period
const PHASE_BINS: usize = 50;

/// Gaussian smoothing window over the phase histogram, in bins
const PHASE_SMOOTH_WINDOW: usize = 7;

/// Timestamps of confident chord changes, for phase anchoring
///
/// A transition is a frame whose chord name differs from the previous
/// frame's, holding a reading above the confidence gate. The opening of the
/// recording is skipped: pickup noise and the analysis warm-up make early
/// transitions unreliable anchors.
pub fn chord_transitions(frames: &[ChordFrame], config: &AnalysisConfig) -> Vec<f32> {
    let mut transitions = Vec::new();
    for pair in frames.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.time < config.phase_skip_seconds {
            continue;
        }
        let hypothesis = match &curr.hypothesis {
            Some(h) => h,
            None => continue,
        };
        if hypothesis.confidence <= config.phase_min_confidence {
            continue;
        }
        let changed = match prev.chord() {
            Some(prev_chord) => prev_chord.name() != hypothesis.chord.name(),
            None => true,
        };
        if changed {
            transitions.push(curr.time);
        }
    }
    transitions
}

/// Estimate the beat-grid offset in seconds from chord-transition times
///
/// Offsets are taken modulo the beat period and folded into
/// `(-beat/2, beat/2]`, so the returned phase is the smallest shift that
/// aligns the grid with the transitions. Returns 0 when there are no usable
/// transitions or when the winning offset exceeds the discard fraction of a
/// beat.
pub fn estimate_beat_phase(transitions: &[f32], bpm: f32, config: &AnalysisConfig) -> f32 {
    if transitions.is_empty() || bpm <= 0.0 {
        return 0.0;
    }
    let beat = 60.0 / bpm;
    let half_beat = beat * 0.5;

    let mut histogram = vec![0.0f32; PHASE_BINS];
    for &time in transitions {
        let mut offset = time.rem_euclid(beat);
        if offset > half_beat {
            offset -= beat;
        }
        let bin = (((offset + half_beat) / beat) * PHASE_BINS as f32).floor() as usize;
        histogram[bin.min(PHASE_BINS - 1)] += 1.0;
    }

    // Offset space wraps at +-beat/2, so the smoothing is circular
    let smoothed = smooth_circular(&histogram, PHASE_SMOOTH_WINDOW);
    let mut best_bin = 0usize;
    let mut best_value = f32::MIN;
    for (bin, &value) in smoothed.iter().enumerate() {
        if value > best_value {
            best_value = value;
            best_bin = bin;
        }
    }

    let phase = (best_bin as f32 + 0.5) / PHASE_BINS as f32 * beat - half_beat;
    if phase.abs() > config.phase_discard_fraction * beat {
        log::warn!(
            "Beat phase {:.3}s exceeds {:.0}% of a beat, discarding",
            phase,
            config.phase_discard_fraction * 100.0
        );
        return 0.0;
    }

    log::debug!(
        "Beat phase {:.3}s from {} transitions at {:.0} BPM",
        phase,
        transitions.len(),
        bpm
    );
    phase
}

/// Circular Gaussian smoothing with sigma of a quarter window
fn smooth_circular(values: &[f32], window: usize) -> Vec<f32> {
    let window = window | 1;
    let half = (window / 2) as i32;
    let sigma = (window as f32 / 4.0).max(1.0);
    let denom = 2.0 * sigma * sigma;
    let len = values.len() as i32;

    let mut smoothed = vec![0.0f32; values.len()];
    for (i, slot) in smoothed.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        let mut norm = 0.0f32;
        for delta in -half..=half {
            let j = (i as i32 + delta).rem_euclid(len) as usize;
            let weight = (-(delta * delta) as f32 / denom).exp();
            acc += values[j] * weight;
            norm += weight;
        }
        *slot = acc / norm;
    }
    smoothed
}
