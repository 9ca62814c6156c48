//! Error types for the tablature analysis engine

use std::fmt;

/// Errors that can occur during analysis
///
/// Low-evidence musical content is never an error: silent or ambiguous audio
/// produces `None` chords and default key/tempo values, not an `Err`. Errors
/// are reserved for malformed input shape and observer-requested cancellation.
#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// Malformed input shape (bad channel count, odd interleaved buffer,
    /// implausible sample rate)
    InvalidInput(String),

    /// Internal invariant broke during processing
    ProcessingError(String),

    /// The progress observer requested cancellation at a yield point
    Cancelled,
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            AnalysisError::Cancelled => write!(f, "Analysis cancelled by observer"),
        }
    }
}

impl std::error::Error for AnalysisError {}
