//! Tonal analysis
//!
//! Everything between spectral peaks and named chords: the run's tuning
//! reference, harmonic pitch-class profiles, template matching, key
//! estimation, and the diatonic snapping post-pass.

pub mod chroma;
pub mod key;
pub mod matcher;
pub mod snapping;
pub mod templates;
pub mod tuning;

pub use chroma::{chroma_from_peaks, ChromaVector};
pub use key::estimate_key;
pub use matcher::match_chroma;
pub use snapping::snap_to_key;
pub use templates::{build_templates, ChordTemplate};
pub use tuning::estimate_tuning;
