//! Rhythm analysis: onsets, tempo, and beat phase
//!
//! This stage reads the frontend's onset-strength curve and frame energies
//! and produces the [`TempoEstimate`](crate::analysis::TempoEstimate) the
//! notation stage lays bars out against. Onset picking and interval voting
//! carry the load; the beat phase is anchored afterwards on the chord
//! transitions found by the tonal stage, since strums land on beats far more
//! reliably than raw spectral flux does.

pub mod beat_phase;
pub mod onsets;
pub mod tempo;

pub use beat_phase::{chord_transitions, estimate_beat_phase};
pub use onsets::detect_onsets;
pub use tempo::{estimate_tempo, fold_bpm};
