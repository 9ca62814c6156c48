//! Beat-aligned chroma pooling
//!
//! Frame-level matching reads each hop in isolation, so a strummed chord can
//! flicker between readings within a single beat. This pass groups frames
//! into one-beat buckets on the estimated grid, pools each bucket's chroma
//! with a component-wise median, and re-matches the pooled vector. The
//! median is the point: a transient that dominates one frame of the beat
//! vanishes from the pooled chroma instead of dragging the whole beat with
//! it.

use crate::analysis::{ChordFrame, ChordHypothesis, KeyEstimate, TempoEstimate};
use crate::config::AnalysisConfig;
use crate::tonal::{match_chroma, ChordTemplate, ChromaVector};

/// Confidence fraction of the beat estimate added when it agrees with the
/// frame estimate
const AGREEMENT_BOOST: f32 = 0.2;

/// Re-estimate chords over one-beat buckets and reconcile with the
/// frame-level readings
///
/// `chromas` holds the per-frame chroma vectors the frame readings came
/// from, index-aligned with `frames`. Agreement between a frame and its beat
/// reinforces the frame's confidence; disagreement replaces the frame only
/// when the beat estimate is clearly stronger (its confidence scaled by
/// `beat_pool_advantage` must exceed the frame's).
pub fn pool_by_beat(
    frames: &mut [ChordFrame],
    chromas: &[ChromaVector],
    tempo: &TempoEstimate,
    key: Option<&KeyEstimate>,
    templates: &[ChordTemplate],
    config: &AnalysisConfig,
) {
    if frames.is_empty() || tempo.bpm <= 0.0 {
        return;
    }
    let usable = frames.len().min(chromas.len());
    if usable < frames.len() {
        log::warn!(
            "Chroma cache covers {} of {} frames; pooling the overlap",
            chromas.len(),
            frames.len()
        );
    }

    let beat = 60.0 / tempo.bpm;
    let mut pooled_beats = 0usize;
    let mut start = 0usize;
    while start < usable {
        let bucket = beat_index(frames[start].time, tempo.beat_phase, beat);
        let mut end = start + 1;
        while end < usable && beat_index(frames[end].time, tempo.beat_phase, beat) == bucket {
            end += 1;
        }

        let pooled = ChromaVector::median(&chromas[start..end]);
        if let Some(beat_estimate) = match_chroma(&pooled, templates, key, config) {
            pooled_beats += 1;
            for frame in frames[start..end].iter_mut() {
                reconcile(frame, &beat_estimate, config);
            }
        }
        start = end;
    }

    log::debug!(
        "Beat pooling re-matched {} beats over {} frames",
        pooled_beats,
        usable
    );
}

fn beat_index(time: f32, phase: f32, beat: f32) -> i64 {
    ((time - phase) / beat).floor() as i64
}

fn reconcile(frame: &mut ChordFrame, beat_estimate: &ChordHypothesis, config: &AnalysisConfig) {
    match &frame.hypothesis {
        Some(own) if own.chord == beat_estimate.chord => {
            frame.hypothesis = Some(ChordHypothesis::new(
                own.chord,
                own.confidence + AGREEMENT_BOOST * beat_estimate.confidence,
            ));
        }
        _ => {
            if beat_estimate.confidence * config.beat_pool_advantage > frame.confidence() {
                frame.hypothesis = Some(*beat_estimate);
            }
        }
    }
}
