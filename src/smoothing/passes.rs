//! Confidence-gated smoothing passes
//!
//! Three in-place passes over the chord-frame sequence, each a whole-value
//! replacement (a frame's hypothesis is swapped, never partially edited):
//!
//! 1. A single frame that disagrees with matching neighbors on both sides is
//!    replaced when its own confidence is low.
//! 2. A two-frame run sandwiched between identical readings is absorbed when
//!    both of its frames are weak.
//! 3. Remaining weak or empty frames copy their stronger neighbor, and a
//!    trailing run of empty frames forward-fills from the last voiced chord
//!    so fade-outs keep their final harmony.
//!
//! High-confidence detections are never touched; the gates only open below
//! the configured ceilings.

use crate::analysis::{ChordFrame, ChordHypothesis};
use crate::config::AnalysisConfig;

/// Run all smoothing passes over the chord-frame sequence
pub fn smooth_chord_frames(frames: &mut [ChordFrame], config: &AnalysisConfig) {
    replace_outliers(frames, config.smooth_outlier_confidence);
    absorb_short_runs(frames, config.smooth_absorb_confidence);
    fill_weak_frames(frames, config.smooth_fill_confidence);
    fill_trailing_gap(frames);
    log::debug!("Smoothing passes applied over {} frames", frames.len());
}

/// Pass 1: replace low-confidence single outliers between matching neighbors
fn replace_outliers(frames: &mut [ChordFrame], ceiling: f32) {
    for i in 1..frames.len().saturating_sub(1) {
        if frames[i].confidence() >= ceiling {
            continue;
        }
        let flank = match (frames[i - 1].chord().copied(), frames[i + 1].chord().copied()) {
            (Some(a), Some(b)) if a == b => a,
            _ => continue,
        };
        if frames[i].chord() == Some(&flank) {
            continue;
        }
        let confidence = (frames[i - 1].confidence() + frames[i + 1].confidence()) * 0.5;
        frames[i].hypothesis = Some(ChordHypothesis::new(flank, confidence));
    }
}

/// Pass 2: absorb weak two-frame runs between identical flanking readings
fn absorb_short_runs(frames: &mut [ChordFrame], ceiling: f32) {
    if frames.len() < 4 {
        return;
    }
    for i in 1..frames.len() - 2 {
        let flank = match (frames[i - 1].chord().copied(), frames[i + 2].chord().copied()) {
            (Some(a), Some(b)) if a == b => a,
            _ => continue,
        };
        if frames[i].chord() != frames[i + 1].chord() {
            continue;
        }
        if frames[i].chord() == Some(&flank) {
            continue;
        }
        if frames[i].confidence() >= ceiling || frames[i + 1].confidence() >= ceiling {
            continue;
        }
        let confidence = (frames[i - 1].confidence() + frames[i + 2].confidence()) * 0.5;
        frames[i].hypothesis = Some(ChordHypothesis::new(flank, confidence));
        frames[i + 1].hypothesis = Some(ChordHypothesis::new(flank, confidence));
    }
}

/// Pass 3: weak or empty frames copy their stronger neighbor's reading
///
/// Neighbors are read from a snapshot so a fill cannot cascade through the
/// whole sequence within one pass.
fn fill_weak_frames(frames: &mut [ChordFrame], floor: f32) {
    if frames.len() < 2 {
        return;
    }
    let snapshot: Vec<ChordFrame> = frames.to_vec();
    for i in 0..frames.len() {
        if snapshot[i].confidence() >= floor {
            continue;
        }
        let prev = if i > 0 { snapshot.get(i - 1) } else { None };
        let next = snapshot.get(i + 1);
        let donor = match (prev, next) {
            (Some(p), Some(n)) => {
                if p.confidence() >= n.confidence() {
                    Some(p)
                } else {
                    Some(n)
                }
            }
            (Some(p), None) => Some(p),
            (None, Some(n)) => Some(n),
            (None, None) => None,
        };
        if let Some(donor) = donor {
            if donor.hypothesis.is_some() && donor.confidence() > snapshot[i].confidence() {
                frames[i].hypothesis = donor.hypothesis;
            }
        }
    }
}

/// Forward-fill the trailing empty run from the last voiced frame
fn fill_trailing_gap(frames: &mut [ChordFrame]) {
    if let Some(pos) = frames.iter().rposition(|f| f.hypothesis.is_some()) {
        let donor = frames[pos].hypothesis;
        for frame in frames[pos + 1..].iter_mut() {
            frame.hypothesis = donor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::{Chord, ChordQuality, PitchClass};

    fn frame(time: f32, root: Option<i32>, confidence: f32) -> ChordFrame {
        ChordFrame {
            time,
            hypothesis: root.map(|pc| {
                ChordHypothesis::new(
                    Chord::new(PitchClass::new(pc), ChordQuality::Major),
                    confidence,
                )
            }),
        }
    }

    fn names(frames: &[ChordFrame]) -> Vec<Option<String>> {
        frames
            .iter()
            .map(|f| f.chord().map(|c| c.name()))
            .collect()
    }

    #[test]
    fn test_weak_outlier_is_replaced() {
        let config = AnalysisConfig::default();
        let mut frames = vec![
            frame(0.0, Some(0), 0.6),
            frame(0.1, Some(5), 0.3),
            frame(0.2, Some(0), 0.7),
        ];
        smooth_chord_frames(&mut frames, &config);
        assert_eq!(names(&frames), vec![Some("C".into()); 3]);
        assert!((frames[1].confidence() - 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_confident_outlier_survives() {
        let config = AnalysisConfig::default();
        let mut frames = vec![
            frame(0.0, Some(0), 0.6),
            frame(0.1, Some(5), 0.6),
            frame(0.2, Some(0), 0.7),
        ];
        smooth_chord_frames(&mut frames, &config);
        assert_eq!(frames[1].chord().unwrap().name(), "F");
    }

    #[test]
    fn test_weak_pair_is_absorbed() {
        let config = AnalysisConfig::default();
        let mut frames = vec![
            frame(0.0, Some(0), 0.5),
            frame(0.1, Some(5), 0.2),
            frame(0.2, Some(5), 0.25),
            frame(0.3, Some(0), 0.6),
        ];
        smooth_chord_frames(&mut frames, &config);
        assert_eq!(names(&frames), vec![Some("C".into()); 4]);
        assert!((frames[1].confidence() - 0.55).abs() < 1e-6);
        assert!((frames[2].confidence() - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_solid_pair_survives() {
        let config = AnalysisConfig::default();
        let mut frames = vec![
            frame(0.0, Some(0), 0.5),
            frame(0.1, Some(5), 0.4),
            frame(0.2, Some(5), 0.4),
            frame(0.3, Some(0), 0.6),
        ];
        smooth_chord_frames(&mut frames, &config);
        assert_eq!(frames[1].chord().unwrap().name(), "F");
        assert_eq!(frames[2].chord().unwrap().name(), "F");
    }

    #[test]
    fn test_weak_frame_copies_stronger_neighbor() {
        let config = AnalysisConfig::default();
        let mut frames = vec![frame(0.0, Some(0), 0.8), frame(0.1, Some(5), 0.1)];
        smooth_chord_frames(&mut frames, &config);
        assert_eq!(frames[1].chord().unwrap().name(), "C");
    }

    #[test]
    fn test_trailing_gap_forward_fills() {
        let config = AnalysisConfig::default();
        let mut frames = vec![
            frame(0.0, Some(0), 0.8),
            frame(0.1, None, 0.0),
            frame(0.2, None, 0.0),
        ];
        smooth_chord_frames(&mut frames, &config);
        assert_eq!(names(&frames), vec![Some("C".into()); 3]);
    }

    #[test]
    fn test_leading_gap_is_not_cascaded() {
        let config = AnalysisConfig::default();
        let mut frames = vec![
            frame(0.0, None, 0.0),
            frame(0.1, None, 0.0),
            frame(0.2, Some(0), 0.8),
            frame(0.3, Some(0), 0.8),
        ];
        smooth_chord_frames(&mut frames, &config);
        // One backward step from the fill pass is fine; a full cascade is not
        assert_eq!(frames[0].chord(), None);
        assert_eq!(frames[1].chord().unwrap().name(), "C");
    }

    #[test]
    fn test_degenerate_lengths_do_not_panic() {
        let config = AnalysisConfig::default();
        let mut empty: Vec<ChordFrame> = Vec::new();
        smooth_chord_frames(&mut empty, &config);
        let mut single = vec![frame(0.0, Some(0), 0.5)];
        smooth_chord_frames(&mut single, &config);
        assert_eq!(single[0].chord().unwrap().name(), "C");
    }
}
