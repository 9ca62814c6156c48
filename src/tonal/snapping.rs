//! Diatonic snapping
//!
//! A slightly sharp performance or a noisy frame can push a chord root one
//! semitone off onto an accidental that makes no sense in the estimated key
//! (a C# major in the middle of a C major song). This post-pass relabels such
//! readings to the adjacent diatonic natural, but only while the detector
//! itself was unsure; a confident accidental is taken at its word.

use crate::analysis::result::{ChordFrame, KeyEstimate};
use crate::config::AnalysisConfig;

/// Snap low-confidence out-of-key accidental roots to a neighboring diatonic
/// natural, in place
///
/// Eligible frames have an accidental root outside the key's scale and
/// confidence below `snap_confidence_ceiling`. The whole chord (root and any
/// slash bass) shifts by the same semitone, preferring the flat-side
/// neighbor when both are diatonic. Confidence is left unchanged; this is a
/// relabeling, not a re-detection.
pub fn snap_to_key(frames: &mut [ChordFrame], key: &KeyEstimate, config: &AnalysisConfig) {
    let mut snapped = 0usize;
    for frame in frames.iter_mut() {
        let hypothesis = match frame.hypothesis.as_mut() {
            Some(hypothesis) => hypothesis,
            None => continue,
        };
        if hypothesis.confidence >= config.snap_confidence_ceiling {
            continue;
        }
        let root = hypothesis.chord.root;
        if !root.is_accidental() || key.scale_contains(root) {
            continue;
        }

        let delta = if key.scale_contains(root.transposed(-1)) {
            -1
        } else if key.scale_contains(root.transposed(1)) {
            1
        } else {
            continue;
        };

        hypothesis.chord = hypothesis.chord.transposed(delta);
        snapped += 1;
    }

    if snapped > 0 {
        log::debug!("Diatonic snapping relabeled {} frames toward {}", snapped, key.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::{ChordHypothesis, Mode};
    use crate::theory::{Chord, ChordQuality, PitchClass};

    fn frame(root: i32, quality: ChordQuality, confidence: f32) -> ChordFrame {
        ChordFrame {
            time: 0.0,
            hypothesis: Some(ChordHypothesis::new(
                Chord::new(PitchClass::new(root), quality),
                confidence,
            )),
        }
    }

    fn c_major_key() -> KeyEstimate {
        KeyEstimate::new(PitchClass::new(0), Mode::Major)
    }

    #[test]
    fn test_low_confidence_accidental_snaps_flat_side() {
        let config = AnalysisConfig::default();
        // C# at low confidence in C major: both C and D are diatonic, the
        // flat side wins
        let mut frames = vec![frame(1, ChordQuality::Major, 0.3)];
        snap_to_key(&mut frames, &c_major_key(), &config);
        let chord = frames[0].chord().unwrap();
        assert_eq!(chord.root, PitchClass::new(0));
        assert_eq!(chord.quality, ChordQuality::Major);
    }

    #[test]
    fn test_high_confidence_accidental_survives() {
        let config = AnalysisConfig::default();
        let mut frames = vec![frame(6, ChordQuality::Major, 0.8)];
        snap_to_key(&mut frames, &c_major_key(), &config);
        assert_eq!(frames[0].chord().unwrap().root, PitchClass::new(6));
    }

    #[test]
    fn test_natural_roots_never_snap() {
        let config = AnalysisConfig::default();
        // B is not in the C major triad family but it is natural; B
        // diminished is a legitimate diatonic reading anyway
        let mut frames = vec![frame(11, ChordQuality::Diminished, 0.2)];
        snap_to_key(&mut frames, &c_major_key(), &config);
        assert_eq!(frames[0].chord().unwrap().root, PitchClass::new(11));
    }

    #[test]
    fn test_diatonic_accidental_survives_in_sharp_key() {
        let config = AnalysisConfig::default();
        // F# minor is diatonic in D major; no snap even at low confidence
        let d_major = KeyEstimate::new(PitchClass::new(2), Mode::Major);
        let mut frames = vec![frame(6, ChordQuality::Minor, 0.25)];
        snap_to_key(&mut frames, &d_major, &config);
        assert_eq!(frames[0].chord().unwrap().root, PitchClass::new(6));
    }

    #[test]
    fn test_slash_bass_moves_with_the_root() {
        let config = AnalysisConfig::default();
        // C#/G# low confidence in C major snaps whole to C/G
        let chord = Chord::with_bass(
            PitchClass::new(1),
            ChordQuality::Major,
            PitchClass::new(8),
        );
        let mut frames = vec![ChordFrame {
            time: 0.0,
            hypothesis: Some(ChordHypothesis::new(chord, 0.3)),
        }];
        snap_to_key(&mut frames, &c_major_key(), &config);
        let snapped = frames[0].chord().unwrap();
        assert_eq!(snapped.root, PitchClass::new(0));
        assert_eq!(snapped.bass, Some(PitchClass::new(7)));
    }

    #[test]
    fn test_empty_frames_untouched() {
        let config = AnalysisConfig::default();
        let mut frames = vec![ChordFrame {
            time: 0.0,
            hypothesis: None,
        }];
        snap_to_key(&mut frames, &c_major_key(), &config);
        assert!(frames[0].hypothesis.is_none());
    }
}
