//! Analysis result types

use serde::{Deserialize, Serialize};

use crate::notation::Bar;
use crate::theory::{Chord, PitchClass};

use super::metadata::AnalysisMetadata;

/// Key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Major (Ionian) scale
    Major,
    /// Natural minor (Aeolian) scale
    Minor,
}

/// Scale degrees of the major scale, in semitones from the tonic
const MAJOR_SCALE: [usize; 7] = [0, 2, 4, 5, 7, 9, 11];
/// Scale degrees of the natural minor scale
const MINOR_SCALE: [usize; 7] = [0, 2, 3, 5, 7, 8, 10];

/// Estimated key of the recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEstimate {
    /// Tonic pitch class
    pub tonic: PitchClass,
    /// Major or minor mode
    pub mode: Mode,
}

impl KeyEstimate {
    /// Construct a key estimate
    pub fn new(tonic: PitchClass, mode: Mode) -> Self {
        Self { tonic, mode }
    }

    /// Display name, e.g. `"A Minor"` or `"F# Major"`
    pub fn name(&self) -> String {
        let mode = match self.mode {
            Mode::Major => "Major",
            Mode::Minor => "Minor",
        };
        format!("{} {}", self.tonic.name(), mode)
    }

    /// The seven scale members of this key
    pub fn scale(&self) -> [PitchClass; 7] {
        let degrees = match self.mode {
            Mode::Major => &MAJOR_SCALE,
            Mode::Minor => &MINOR_SCALE,
        };
        let mut scale = [self.tonic; 7];
        for (slot, &degree) in scale.iter_mut().zip(degrees.iter()) {
            *slot = self.tonic.transposed(degree as i32);
        }
        scale
    }

    /// Whether a pitch class belongs to this key's scale
    pub fn scale_contains(&self, pc: PitchClass) -> bool {
        let degrees = match self.mode {
            Mode::Major => &MAJOR_SCALE,
            Mode::Minor => &MINOR_SCALE,
        };
        degrees.contains(&self.tonic.interval_to(pc))
    }

    /// Rotate the tonic by `semitones`
    pub fn transposed(&self, semitones: i32) -> KeyEstimate {
        KeyEstimate {
            tonic: self.tonic.transposed(semitones),
            mode: self.mode,
        }
    }
}

impl Default for KeyEstimate {
    /// The zero-evidence fallback key
    fn default() -> Self {
        KeyEstimate::new(PitchClass::new(0), Mode::Major)
    }
}

/// One chord reading with its confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChordHypothesis {
    /// The chord
    pub chord: Chord,
    /// Detection confidence in [0, 1]
    pub confidence: f32,
}

impl ChordHypothesis {
    /// Construct a hypothesis, clamping confidence into [0, 1]
    pub fn new(chord: Chord, confidence: f32) -> Self {
        Self {
            chord,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Chord reading for one analysis frame
///
/// `None` means no template scored above the rejection floor: silence, noise,
/// or genuinely ambiguous harmony. That is a routine outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordFrame {
    /// Frame start time in seconds
    pub time: f32,
    /// Best chord reading, if any
    pub hypothesis: Option<ChordHypothesis>,
}

impl ChordFrame {
    /// Confidence of the reading; an empty frame reads 0
    pub fn confidence(&self) -> f32 {
        self.hypothesis.as_ref().map_or(0.0, |h| h.confidence)
    }

    /// The chord, if any
    pub fn chord(&self) -> Option<&Chord> {
        self.hypothesis.as_ref().map(|h| &h.chord)
    }
}

/// Tempo estimate for the run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Beats per minute, folded into the plausible range
    pub bpm: f32,
    /// Offset of the beat grid from t=0, in seconds
    pub beat_phase: f32,
}

impl Default for TempoEstimate {
    /// The zero-evidence fallback tempo
    fn default() -> Self {
        TempoEstimate {
            bpm: 120.0,
            beat_phase: 0.0,
        }
    }
}

/// Complete analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Smoothed per-frame chord readings
    pub chord_frames: Vec<ChordFrame>,

    /// Estimated key
    pub key: KeyEstimate,

    /// Estimated tempo and beat phase
    pub tempo: TempoEstimate,

    /// Bar/slot notation layout
    pub bars: Vec<Bar>,

    /// Run diagnostics
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// Distinct chord names in play order, first appearance only
    ///
    /// This is the list a fingering dictionary is asked to resolve.
    pub fn chord_vocabulary(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for bar in &self.bars {
            for slot in &bar.slots {
                if let Some(hypothesis) = &slot.hypothesis {
                    let name = hypothesis.chord.name();
                    if !seen.contains(&name) {
                        seen.push(name);
                    }
                }
            }
        }
        seen
    }
}
