//! Per-run working state
//!
//! Everything the pipeline derives once and then reuses: the chord template
//! set, the tuning offset, and per-frame chroma vectors for both window
//! sizes. A [`RunContext`] is created by the entry point, borrowed through
//! the stages, and dropped when the call returns; concurrent analyses never
//! share one.

use crate::config::AnalysisConfig;
use crate::spectral::Frame;
use crate::tonal::{
    build_templates, chroma_from_peaks, estimate_tuning, ChordTemplate, ChromaVector,
};

/// Memoized per-run state
pub struct RunContext {
    templates: Vec<ChordTemplate>,
    tuning_cents: Option<f32>,
    medium_chromas: Vec<ChromaVector>,
    large_chromas: Vec<ChromaVector>,
}

impl RunContext {
    /// Fresh context with the full template set and nothing memoized
    pub fn new() -> Self {
        RunContext {
            templates: build_templates(),
            tuning_cents: None,
            medium_chromas: Vec::new(),
            large_chromas: Vec::new(),
        }
    }

    /// The chord template set for this run
    pub fn templates(&self) -> &[ChordTemplate] {
        &self.templates
    }

    /// Tuning offset in cents, estimated on first call and memoized after
    pub fn tuning_cents(&mut self, frames: &[Frame], config: &AnalysisConfig) -> f32 {
        if let Some(cents) = self.tuning_cents {
            return cents;
        }
        let cents = estimate_tuning(frames, config);
        self.tuning_cents = Some(cents);
        cents
    }

    /// Extract and cache chroma vectors for both frame sequences
    ///
    /// The tuning reference comes from the large-window frames when present
    /// (sharper bins vote more precisely), otherwise from the medium ones.
    pub fn compute_chromas(&mut self, medium: &[Frame], large: &[Frame], config: &AnalysisConfig) {
        let tuning_frames = if large.is_empty() { medium } else { large };
        let tuning = self.tuning_cents(tuning_frames, config);
        self.medium_chromas = chroma_sequence(medium, tuning, config);
        self.large_chromas = chroma_sequence(large, tuning, config);
    }

    /// Cached medium-window chroma vectors, index-aligned with the frames
    pub fn medium_chromas(&self) -> &[ChromaVector] {
        &self.medium_chromas
    }

    /// Cached large-window chroma vectors
    pub fn large_chromas(&self) -> &[ChromaVector] {
        &self.large_chromas
    }
}

impl Default for RunContext {
    fn default() -> Self {
        RunContext::new()
    }
}

/// One chroma vector per frame, extracted in parallel
fn chroma_sequence(
    frames: &[Frame],
    tuning_cents: f32,
    config: &AnalysisConfig,
) -> Vec<ChromaVector> {
    use rayon::prelude::*;

    frames
        .par_iter()
        .map(|frame| chroma_from_peaks(&frame.peaks, tuning_cents, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::SpectralPeak;
    use crate::theory::PitchClass;

    fn frame_at(freq_hz: f32) -> Frame {
        Frame {
            time: 0.0,
            rms: 0.5,
            flux: 0.0,
            peaks: vec![SpectralPeak {
                freq_hz,
                magnitude: 1.0,
            }],
        }
    }

    #[test]
    fn test_tuning_is_memoized() {
        let config = AnalysisConfig::default();
        let mut ctx = RunContext::new();
        // ~23 cents sharp of A440
        let frames: Vec<Frame> = (0..8).map(|_| frame_at(445.9)).collect();
        let first = ctx.tuning_cents(&frames, &config);
        assert!(first > 15.0 && first < 35.0, "Expected ~23 cents, got {:.1}", first);

        // A recompute over silence would return 0.0; the memo must win
        let second = ctx.tuning_cents(&[], &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_chromas_align_with_frames() {
        let config = AnalysisConfig::default();
        let mut ctx = RunContext::new();
        let medium: Vec<Frame> = (0..5).map(|_| frame_at(440.0)).collect();
        ctx.compute_chromas(&medium, &[], &config);

        assert_eq!(ctx.medium_chromas().len(), 5);
        assert!(ctx.large_chromas().is_empty());
        for chroma in ctx.medium_chromas() {
            assert_eq!(chroma.strongest(), Some(PitchClass::new(9)));
        }
    }

    #[test]
    fn test_template_set_is_built_once() {
        let ctx = RunContext::new();
        assert!(!ctx.templates().is_empty());
    }
}
