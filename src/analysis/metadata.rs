//! Run diagnostics attached to every analysis result

use serde::{Deserialize, Serialize};

/// Quality flags raised when a stage had to work from thin evidence
///
/// Flags never stop the run; they tell the caller which parts of the result
/// deserve a skeptical read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisFlag {
    /// Chroma energy was too diffuse for a reliable key reading; the key
    /// field is the zero-evidence fallback
    WeakTonality,
    /// Too few onsets for interval voting; tempo came from the fallback path
    SparseOnsets,
    /// Tuning offset close to the half-semitone boundary, where the
    /// pitch-class grid assignment becomes unstable
    TuningDrift,
    /// Most frames carried no nameable chord after smoothing
    LowVoicing,
}

/// Provenance and diagnostics for one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Length of the analyzed audio in seconds
    pub duration_seconds: f32,

    /// Sample rate of the input buffer
    pub sample_rate: u32,

    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: f32,

    /// Version of this crate that produced the result
    pub algorithm_version: String,

    /// Number of note onsets detected
    pub onset_count: usize,

    /// Number of medium-window frames analyzed
    pub frames_analyzed: usize,

    /// Detected tuning offset from A440, in cents
    pub tuning_cents: f32,

    /// Human-readable notes on fallbacks and oddities
    pub warnings: Vec<String>,

    /// Quality flags for the caller to inspect
    pub flags: Vec<AnalysisFlag>,
}

impl AnalysisMetadata {
    /// Record a flag, ignoring duplicates
    pub fn raise(&mut self, flag: AnalysisFlag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }

    /// Whether a flag was raised during the run
    pub fn has_flag(&self, flag: AnalysisFlag) -> bool {
        self.flags.contains(&flag)
    }
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        AnalysisMetadata {
            duration_seconds: 0.0,
            sample_rate: 0,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            onset_count: 0,
            frames_analyzed: 0,
            tuning_cents: 0.0,
            warnings: Vec::new(),
            flags: Vec::new(),
        }
    }
}
