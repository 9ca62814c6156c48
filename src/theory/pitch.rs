//! Pitch classes and equal-tempered frequency math
//!
//! All tonal analysis works in pitch-class space: one of 12 equal-tempered
//! note names, independent of octave. Frequencies are mapped onto the grid
//! anchored at A4 = 440 Hz, optionally corrected by a per-run tuning offset
//! in cents.

use serde::{Deserialize, Serialize};

/// Note names in sharp spelling, index 0 = C
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Reference frequency for A4 in the untuned grid
pub const A4_HZ: f32 = 440.0;

/// MIDI note number of A4
const A4_MIDI: f32 = 69.0;

/// One of the 12 equal-tempered pitch classes (0 = C, 11 = B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PitchClass(u8);

impl PitchClass {
    /// Build from any integer, reduced mod 12
    pub fn new(index: i32) -> Self {
        PitchClass(index.rem_euclid(12) as u8)
    }

    /// Index in 0..12
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Note name in sharp spelling ("C", "C#", ..., "B")
    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.index()]
    }

    /// Transpose by a signed number of semitones, wrapping mod 12
    pub fn transposed(self, semitones: i32) -> Self {
        PitchClass::new(self.0 as i32 + semitones)
    }

    /// Signed semitone interval from `self` up to `other`, in 0..12
    pub fn interval_to(self, other: PitchClass) -> usize {
        (other.0 as i32 - self.0 as i32).rem_euclid(12) as usize
    }

    /// True for the five accidental ("black key") pitch classes
    pub fn is_accidental(self) -> bool {
        matches!(self.0, 1 | 3 | 6 | 8 | 10)
    }

    /// All 12 pitch classes in ascending order
    pub fn all() -> impl Iterator<Item = PitchClass> {
        (0..12u8).map(PitchClass)
    }
}

impl std::fmt::Display for PitchClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fractional MIDI note number of a frequency on the A4 = 440 Hz grid
///
/// Returns `None` for non-positive frequencies.
pub fn frequency_to_midi(freq_hz: f32) -> Option<f32> {
    if freq_hz <= 0.0 || !freq_hz.is_finite() {
        return None;
    }
    Some(A4_MIDI + 12.0 * (freq_hz / A4_HZ).log2())
}

/// Cents offset of a frequency from its nearest equal-tempered semitone
///
/// The result is in (-50.0, 50.0]. Returns `None` for non-positive frequencies.
pub fn cents_from_nearest_semitone(freq_hz: f32) -> Option<f32> {
    let midi = frequency_to_midi(freq_hz)?;
    let nearest = midi.round();
    Some((midi - nearest) * 100.0)
}

/// Map a frequency to (pitch class, cents offset, octave) under a tuning
/// correction
///
/// `tuning_cents` is the detected deviation of the recording from the 440 Hz
/// grid; it is subtracted before snapping so that a uniformly sharp recording
/// still lands on the intended pitch classes. Octave 4 contains middle C.
/// Returns `None` for non-positive frequencies.
pub fn frequency_to_pitch_class(
    freq_hz: f32,
    tuning_cents: f32,
) -> Option<(PitchClass, f32, i32)> {
    let midi = frequency_to_midi(freq_hz)? - tuning_cents / 100.0;
    let nearest = midi.round();
    let cents = (midi - nearest) * 100.0;
    let nearest_i = nearest as i32;
    let pc = PitchClass::new(nearest_i);
    // MIDI 60 (middle C) sits in octave 4
    let octave = nearest_i.div_euclid(12) - 1;
    Some((pc, cents, octave))
}
