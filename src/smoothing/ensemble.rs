//! Two-window ensemble merging
//!
//! The medium and large window passes read the same audio with different
//! trade-offs: the medium window reacts to chord changes quickly, the large
//! window separates bass notes and close voicings. Their frame sequences
//! share one hop, so merging is a straight index walk. Agreement between the
//! passes is strong evidence and boosts confidence; disagreement is settled
//! by simplicity when the roots agree, and by confidence otherwise.

use crate::analysis::{ChordFrame, ChordHypothesis};
use crate::theory::{pick_by_priority, ENSEMBLE_PRIORITY};

/// Merge the two window passes into one chord-frame sequence
///
/// An empty large pass (buffer too short for the large window) passes the
/// medium sequence through unchanged.
pub fn merge_window_passes(medium: &[ChordFrame], large: &[ChordFrame]) -> Vec<ChordFrame> {
    if large.is_empty() {
        return medium.to_vec();
    }
    if medium.len() != large.len() {
        log::warn!(
            "Window passes out of step ({} vs {} frames); merging the overlap",
            medium.len(),
            large.len()
        );
    }

    medium
        .iter()
        .enumerate()
        .map(|(i, narrow)| ChordFrame {
            time: narrow.time,
            hypothesis: merge_readings(narrow.hypothesis, large.get(i).and_then(|w| w.hypothesis)),
        })
        .collect()
}

/// Combine one frame's readings from both passes
fn merge_readings(
    narrow: Option<ChordHypothesis>,
    wide: Option<ChordHypothesis>,
) -> Option<ChordHypothesis> {
    let (a, b) = match (narrow, wide) {
        (None, None) => return None,
        (Some(only), None) | (None, Some(only)) => return Some(only),
        (Some(a), Some(b)) => (a, b),
    };

    if a.chord == b.chord {
        // Full agreement: the readings corroborate each other
        return Some(ChordHypothesis::new(a.chord, a.confidence + b.confidence));
    }

    if a.chord.root == b.chord.root {
        // Same root, different reading: prefer the simpler quality but keep
        // the stronger confidence, since the root itself is corroborated
        let chord = if a.chord.quality == b.chord.quality {
            // Only the bass differs; trust the stronger reading's bass
            if a.confidence >= b.confidence {
                a.chord
            } else {
                b.chord
            }
        } else if pick_by_priority(&ENSEMBLE_PRIORITY, a.chord.quality, b.chord.quality)
            == a.chord.quality
        {
            a.chord
        } else {
            b.chord
        };
        return Some(ChordHypothesis::new(chord, a.confidence.max(b.confidence)));
    }

    // Unrelated readings: the stronger one wins outright
    if a.confidence >= b.confidence {
        Some(a)
    } else {
        Some(b)
    }
}
