//! Music-theory primitives shared across the pipeline
//!
//! Pitch classes, chord vocabulary, and the ordered priority tables used for
//! tie-breaking. Everything here is pure data and arithmetic; no DSP.

pub mod chord;
pub mod pitch;

pub use chord::{pick_by_priority, Chord, ChordQuality, ENSEMBLE_PRIORITY, MATCH_PRIORITY};
pub use pitch::{
    cents_from_nearest_semitone, frequency_to_pitch_class, PitchClass, NOTE_NAMES,
};
