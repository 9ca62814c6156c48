//! Chord vocabulary: qualities, names, transposition, priority tables
//!
//! The matcher, ensemble, and segmenter all break near-ties between chord
//! qualities. Those policies live here as explicit ordered tables consulted by
//! one generic [`pick_by_priority`] instead of being re-encoded as `if` chains
//! at every call site. Two distinct orders exist: the matcher's simplicity
//! order and the ensemble's merge order (where power chords rank ahead of
//! sevenths).

use serde::{Deserialize, Serialize};

use super::pitch::PitchClass;

/// Chord quality tag
///
/// Covers the template vocabulary: triads, suspensions, sixths, sevenths,
/// power chords, and the tension extensions that the notation layer folds
/// back down to their base seventh forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    /// Major triad (1-3-5)
    Major,
    /// Minor triad (1-b3-5)
    Minor,
    /// Dominant seventh (1-3-5-b7)
    Dominant7,
    /// Minor seventh (1-b3-5-b7)
    Minor7,
    /// Major seventh (1-3-5-7)
    Major7,
    /// Suspended second (1-2-5)
    Sus2,
    /// Suspended fourth (1-4-5)
    Sus4,
    /// Added ninth (1-3-5-9)
    Add9,
    /// Major sixth (1-3-5-6)
    Sixth,
    /// Minor sixth (1-b3-5-6)
    MinorSixth,
    /// Diminished triad (1-b3-b5)
    Diminished,
    /// Augmented triad (1-3-#5)
    Augmented,
    /// Power chord (1-5)
    Power,
    /// Dominant ninth (1-3-5-b7-9)
    Ninth,
    /// Minor ninth (1-b3-5-b7-9)
    MinorNinth,
    /// Major ninth (1-3-5-7-9)
    MajorNinth,
    /// Eleventh (1-4-5-b7-9, third omitted)
    Eleventh,
    /// Thirteenth (1-3-5-b7-9-13)
    Thirteenth,
}

impl ChordQuality {
    /// All qualities in the template vocabulary
    pub const ALL: [ChordQuality; 18] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Dominant7,
        ChordQuality::Minor7,
        ChordQuality::Major7,
        ChordQuality::Sus2,
        ChordQuality::Sus4,
        ChordQuality::Add9,
        ChordQuality::Sixth,
        ChordQuality::MinorSixth,
        ChordQuality::Diminished,
        ChordQuality::Augmented,
        ChordQuality::Power,
        ChordQuality::Ninth,
        ChordQuality::MinorNinth,
        ChordQuality::MajorNinth,
        ChordQuality::Eleventh,
        ChordQuality::Thirteenth,
    ];

    /// Semitone intervals from the root, root first
    pub fn intervals(self) -> &'static [usize] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
            ChordQuality::Add9 => &[0, 4, 7, 2],
            ChordQuality::Sixth => &[0, 4, 7, 9],
            ChordQuality::MinorSixth => &[0, 3, 7, 9],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Power => &[0, 7],
            ChordQuality::Ninth => &[0, 4, 7, 10, 2],
            ChordQuality::MinorNinth => &[0, 3, 7, 10, 2],
            ChordQuality::MajorNinth => &[0, 4, 7, 11, 2],
            ChordQuality::Eleventh => &[0, 5, 7, 10, 2],
            ChordQuality::Thirteenth => &[0, 4, 7, 10, 2, 9],
        }
    }

    /// Name suffix appended to the root note ("" for major, "m7", "sus4", ...)
    pub fn suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::Add9 => "add9",
            ChordQuality::Sixth => "6",
            ChordQuality::MinorSixth => "m6",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Power => "5",
            ChordQuality::Ninth => "9",
            ChordQuality::MinorNinth => "m9",
            ChordQuality::MajorNinth => "maj9",
            ChordQuality::Eleventh => "11",
            ChordQuality::Thirteenth => "13",
        }
    }

    /// True for tension extensions (9/11/13 family)
    pub fn is_tension(self) -> bool {
        matches!(
            self,
            ChordQuality::Ninth
                | ChordQuality::MinorNinth
                | ChordQuality::MajorNinth
                | ChordQuality::Eleventh
                | ChordQuality::Thirteenth
        )
    }

    /// Base form a tension quality collapses to on a notation chart
    ///
    /// Non-tension qualities return themselves.
    pub fn base_form(self) -> ChordQuality {
        match self {
            ChordQuality::Ninth | ChordQuality::Eleventh | ChordQuality::Thirteenth => {
                ChordQuality::Dominant7
            }
            ChordQuality::MinorNinth => ChordQuality::Minor7,
            ChordQuality::MajorNinth => ChordQuality::Major7,
            other => other,
        }
    }
}

/// Matcher tie-break order: near-equal template scores resolve to the
/// earlier (simpler) entry
pub const MATCH_PRIORITY: [ChordQuality; 18] = [
    ChordQuality::Major,
    ChordQuality::Minor,
    ChordQuality::Dominant7,
    ChordQuality::Minor7,
    ChordQuality::Major7,
    ChordQuality::Sus2,
    ChordQuality::Sus4,
    ChordQuality::Add9,
    ChordQuality::Sixth,
    ChordQuality::MinorSixth,
    ChordQuality::Power,
    ChordQuality::Ninth,
    ChordQuality::MinorNinth,
    ChordQuality::MajorNinth,
    ChordQuality::Diminished,
    ChordQuality::Augmented,
    ChordQuality::Eleventh,
    ChordQuality::Thirteenth,
];

/// Ensemble merge order: when two windows agree on the root but not the
/// quality, the earlier entry wins (power chords outrank sevenths here)
pub const ENSEMBLE_PRIORITY: [ChordQuality; 18] = [
    ChordQuality::Major,
    ChordQuality::Minor,
    ChordQuality::Power,
    ChordQuality::Dominant7,
    ChordQuality::Minor7,
    ChordQuality::Major7,
    ChordQuality::Sus2,
    ChordQuality::Sus4,
    ChordQuality::Add9,
    ChordQuality::Sixth,
    ChordQuality::MinorSixth,
    ChordQuality::Ninth,
    ChordQuality::MinorNinth,
    ChordQuality::MajorNinth,
    ChordQuality::Diminished,
    ChordQuality::Augmented,
    ChordQuality::Eleventh,
    ChordQuality::Thirteenth,
];

/// Pick whichever of two qualities appears earlier in an ordered priority
/// table; `a` wins ties and unknowns
pub fn pick_by_priority(
    order: &[ChordQuality],
    a: ChordQuality,
    b: ChordQuality,
) -> ChordQuality {
    let rank = |q: ChordQuality| order.iter().position(|&e| e == q).unwrap_or(order.len());
    if rank(b) < rank(a) {
        b
    } else {
        a
    }
}

/// A chord: root pitch class, quality, and an optional non-root bass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chord {
    /// Root pitch class
    pub root: PitchClass,
    /// Quality tag
    pub quality: ChordQuality,
    /// Sounding bass when it differs from the root (slash chord)
    pub bass: Option<PitchClass>,
}

impl Chord {
    /// Plain (non-slash) chord
    pub fn new(root: PitchClass, quality: ChordQuality) -> Self {
        Chord {
            root,
            quality,
            bass: None,
        }
    }

    /// Slash chord with an explicit bass; a bass equal to the root is dropped
    pub fn with_bass(root: PitchClass, quality: ChordQuality, bass: PitchClass) -> Self {
        Chord {
            root,
            quality,
            bass: if bass == root { None } else { Some(bass) },
        }
    }

    /// True when the sounding bass differs from the root
    pub fn is_slash(&self) -> bool {
        self.bass.is_some()
    }

    /// Chord symbol, e.g. "A", "Am7", "Dsus4", "G/B"
    pub fn name(&self) -> String {
        match self.bass {
            Some(bass) => format!("{}{}/{}", self.root.name(), self.quality.suffix(), bass.name()),
            None => format!("{}{}", self.root.name(), self.quality.suffix()),
        }
    }

    /// Transpose root and bass by a signed semitone count
    pub fn transposed(&self, semitones: i32) -> Chord {
        Chord {
            root: self.root.transposed(semitones),
            quality: self.quality,
            bass: self.bass.map(|b| b.transposed(semitones)),
        }
    }

    /// Same chord with tension qualities collapsed to their base form
    pub fn base_form(&self) -> Chord {
        Chord {
            quality: self.quality.base_form(),
            ..*self
        }
    }

    /// Sounding pitch classes (root, chord tones, bass if any)
    pub fn pitch_classes(&self) -> Vec<PitchClass> {
        let mut notes: Vec<PitchClass> = self
            .quality
            .intervals()
            .iter()
            .map(|&i| self.root.transposed(i as i32))
            .collect();
        if let Some(bass) = self.bass {
            if !notes.contains(&bass) {
                notes.push(bass);
            }
        }
        notes
    }
}

impl std::fmt::Display for Chord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_names() {
        let a = Chord::new(PitchClass::new(9), ChordQuality::Major);
        assert_eq!(a.name(), "A");

        let am7 = Chord::new(PitchClass::new(9), ChordQuality::Minor7);
        assert_eq!(am7.name(), "Am7");

        let g_over_b = Chord::with_bass(
            PitchClass::new(7),
            ChordQuality::Major,
            PitchClass::new(11),
        );
        assert_eq!(g_over_b.name(), "G/B");
        assert!(g_over_b.is_slash());
    }

    #[test]
    fn test_bass_equal_to_root_is_dropped() {
        let c = Chord::with_bass(PitchClass::new(0), ChordQuality::Major, PitchClass::new(0));
        assert!(!c.is_slash());
        assert_eq!(c.name(), "C");
    }

    #[test]
    fn test_transpose_round_trip() {
        let chord = Chord::with_bass(
            PitchClass::new(7),
            ChordQuality::Dominant7,
            PitchClass::new(11),
        );
        for n in -11..=11 {
            let back = chord.transposed(n).transposed(-n);
            assert_eq!(back, chord, "round trip failed for n={}", n);
            assert_eq!(back.name(), chord.name());
        }
    }

    #[test]
    fn test_tension_base_forms() {
        assert_eq!(ChordQuality::Ninth.base_form(), ChordQuality::Dominant7);
        assert_eq!(ChordQuality::MinorNinth.base_form(), ChordQuality::Minor7);
        assert_eq!(ChordQuality::MajorNinth.base_form(), ChordQuality::Major7);
        assert_eq!(ChordQuality::Thirteenth.base_form(), ChordQuality::Dominant7);
        assert_eq!(ChordQuality::Minor.base_form(), ChordQuality::Minor);
    }

    #[test]
    fn test_pick_by_priority_orders_differ() {
        // Matcher order ranks sevenths above power chords
        assert_eq!(
            pick_by_priority(&MATCH_PRIORITY, ChordQuality::Power, ChordQuality::Dominant7),
            ChordQuality::Dominant7
        );
        // Ensemble order ranks power chords above sevenths
        assert_eq!(
            pick_by_priority(
                &ENSEMBLE_PRIORITY,
                ChordQuality::Power,
                ChordQuality::Dominant7
            ),
            ChordQuality::Power
        );
        // First argument wins ties
        assert_eq!(
            pick_by_priority(&MATCH_PRIORITY, ChordQuality::Minor, ChordQuality::Minor),
            ChordQuality::Minor
        );
    }

    #[test]
    fn test_pitch_classes_include_slash_bass() {
        let d_over_fs = Chord::with_bass(
            PitchClass::new(2),
            ChordQuality::Major,
            PitchClass::new(6),
        );
        let notes = d_over_fs.pitch_classes();
        // F# is already the chord third, so no duplicate
        assert_eq!(notes.len(), 3);

        let c_over_b = Chord::with_bass(
            PitchClass::new(0),
            ChordQuality::Major,
            PitchClass::new(11),
        );
        assert_eq!(c_over_b.pitch_classes().len(), 4);
    }
}
