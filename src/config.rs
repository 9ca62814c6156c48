//! Configuration parameters for tablature analysis
//!
//! Every empirical constant of the pipeline lives here rather than inline at
//! its call site. The matching/segmentation thresholds in particular are
//! working values carried over from listening tests, not derived quantities;
//! they are exposed so they can be recalibrated against a labeled dataset.

/// Analysis configuration parameters
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    // STFT frontend
    /// Large analysis window in samples, power of two (default: 8192)
    /// Feeds tuning detection, the low onset band, and the wide chord pass
    pub window_large: usize,

    /// Medium analysis window in samples, power of two (default: 4096)
    /// Feeds chroma extraction, the mid onset band, and the narrow chord pass
    pub window_medium: usize,

    /// Retained spectral peaks per frame after local-maxima filtering (default: 48)
    pub max_peaks_per_frame: usize,

    /// Frames processed between progress-observer yield points (default: 60)
    pub progress_block_frames: usize,

    // HPSS
    /// Horizontal (time) median window in frames (default: 17)
    /// Derived for the default 1024-sample hop; re-derive if window/hop change
    pub hpss_time_kernel: usize,

    /// Vertical (frequency) median window in bins (default: 9)
    /// Derived for the default window sizes; re-derive if they change
    pub hpss_freq_kernel: usize,

    // Onset strength bands
    /// Low onset band in Hz, measured on the large window (default: 30–600)
    pub low_band_hz: (f32, f32),

    /// Mid onset band in Hz, measured on the medium window (default: 600–4000)
    pub mid_band_hz: (f32, f32),

    /// Weight of the low band in the combined onset curve (default: 1.5)
    pub low_band_weight: f32,

    // Tuning detection
    /// Strongest RMS-gated peaks per frame fed to the cents histogram (default: 5)
    pub tuning_peaks_per_frame: usize,

    /// Frame RMS below this fraction of the run maximum is ignored for tuning
    /// (default: 0.1)
    pub tuning_rms_gate: f32,

    /// Gaussian smoothing window over the 100-bin cents histogram (default: 9)
    pub tuning_smooth_window: usize,

    // Chroma
    /// Harmonic indices hypothesized per peak (default: 6)
    pub chroma_harmonics: usize,

    /// Magnitude compression exponent (default: 1.4; useful range 1.3–1.5)
    pub chroma_mag_exponent: f32,

    /// Gaussian spread sigma over cents offset (default: 15.0)
    pub chroma_cents_sigma: f32,

    /// Cents offset beyond which 30% of the weight leaks to the adjacent
    /// semitone (default: 20.0)
    pub chroma_leak_cents: f32,

    /// Fraction leaked to the adjacent semitone past the leak threshold
    /// (default: 0.3)
    pub chroma_leak_fraction: f32,

    /// High-pass corner: peaks below this roll off to reject kick-drum energy
    /// (default: 80.0 Hz)
    pub chroma_highpass_hz: f32,

    /// Roll-off power applied below the high-pass corner (default: 2.5)
    pub chroma_highpass_power: f32,

    // Chord matching
    /// Scores below this are reported as no chord (default: 0.30)
    pub match_reject_score: f32,

    /// Best-vs-second gap under which the simplicity table breaks the tie
    /// (default: 0.025); empirical, flagged for recalibration
    pub match_tie_gap: f32,

    /// Weight of the chroma-at-root term in the match score (default: 0.22)
    pub match_root_weight: f32,

    /// Score bonus for chords diatonic to an already-estimated key
    /// (default: 0.03)
    pub match_diatonic_bonus: f32,

    /// Slash bass is kept when its chroma energy reaches this fraction of the
    /// root's (default: 0.60); empirical, flagged for recalibration
    pub slash_bass_ratio: f32,

    /// Score multiplier when a slash candidate falls back to its plain form
    /// (default: 0.9)
    pub slash_fallback_scale: f32,

    // Key estimation
    /// Bonus scale for keys whose scale contains detected chord roots
    /// (default: 0.1)
    pub key_chord_bonus: f32,

    // Diatonic snapping
    /// Accidental-root chords below this confidence may snap to a diatonic
    /// neighbor (default: 0.45)
    pub snap_confidence_ceiling: f32,

    // Rhythm
    /// BPM search and output range (default: 55–220)
    pub bpm_range: (f32, f32),

    /// Octave-folding target range applied before the final clamp
    /// (default: 60–180)
    pub bpm_fold_range: (f32, f32),

    /// Inter-onset gaps outside this range in seconds are ignored
    /// (default: 0.06–3.0)
    pub ioi_gap_range: (f32, f32),

    /// Integer multiples voted per inter-onset gap (default: 4)
    pub ioi_multiples: u32,

    /// Local window in frames for the adaptive onset threshold (default: 30)
    pub onset_median_window: usize,

    /// Onsets closer than this many seconds are merged (default: 0.06)
    pub onset_merge_window: f32,

    /// Autocorrelation cross-check bonus weight (default: 5.0)
    pub autocorr_bonus: f32,

    /// Minimum onsets for interval voting; fewer falls back to RMS rises
    /// (default: 4)
    pub min_onsets_for_voting: usize,

    // Beat phase
    /// Chord transitions below this confidence are ignored for phase
    /// (default: 0.3)
    pub phase_min_confidence: f32,

    /// Leading seconds excluded from phase estimation (default: 0.5)
    pub phase_skip_seconds: f32,

    /// Offsets beyond this fraction of a beat are discarded as unreliable
    /// (default: 0.4)
    pub phase_discard_fraction: f32,

    // Ensemble & smoothing
    /// Beat-pooled estimate replaces the frame estimate when its confidence
    /// times this factor exceeds the frame's (default: 1.2)
    pub beat_pool_advantage: f32,

    /// Pass 1: isolated outliers below this confidence are replaced
    /// (default: 0.42)
    pub smooth_outlier_confidence: f32,

    /// Pass 2: two-frame runs below this confidence are absorbed
    /// (default: 0.32)
    pub smooth_absorb_confidence: f32,

    /// Pass 3: frames below this confidence are filled from neighbors
    /// (default: 0.22)
    pub smooth_fill_confidence: f32,

    // Notation
    /// Beats per bar (default: 4)
    pub beats_per_bar: usize,

    /// Maximum chord slots per bar, 1–4 (default: 4)
    pub max_slots_per_bar: usize,

    /// Margin a quality vote needs over the runner-up before the priority
    /// table breaks the tie (default: 0.05 of the total weight)
    pub vote_margin: f32,

    /// Slash form survives segmentation when its weight reaches this fraction
    /// of the root's total (default: 0.35); empirical, flagged for
    /// recalibration
    pub slash_vote_ratio: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_large: 8192,
            window_medium: 4096,
            max_peaks_per_frame: 48,
            progress_block_frames: 60,
            hpss_time_kernel: 17,
            hpss_freq_kernel: 9,
            low_band_hz: (30.0, 600.0),
            mid_band_hz: (600.0, 4000.0),
            low_band_weight: 1.5,
            tuning_peaks_per_frame: 5,
            tuning_rms_gate: 0.1,
            tuning_smooth_window: 9,
            chroma_harmonics: 6,
            chroma_mag_exponent: 1.4,
            chroma_cents_sigma: 15.0,
            chroma_leak_cents: 20.0,
            chroma_leak_fraction: 0.3,
            chroma_highpass_hz: 80.0,
            chroma_highpass_power: 2.5,
            match_reject_score: 0.30,
            match_tie_gap: 0.025,
            match_root_weight: 0.22,
            match_diatonic_bonus: 0.03,
            slash_bass_ratio: 0.60,
            slash_fallback_scale: 0.9,
            key_chord_bonus: 0.1,
            snap_confidence_ceiling: 0.45,
            bpm_range: (55.0, 220.0),
            bpm_fold_range: (60.0, 180.0),
            ioi_gap_range: (0.06, 3.0),
            ioi_multiples: 4,
            onset_median_window: 30,
            onset_merge_window: 0.06,
            autocorr_bonus: 5.0,
            min_onsets_for_voting: 4,
            phase_min_confidence: 0.3,
            phase_skip_seconds: 0.5,
            phase_discard_fraction: 0.4,
            beat_pool_advantage: 1.2,
            smooth_outlier_confidence: 0.42,
            smooth_absorb_confidence: 0.32,
            smooth_fill_confidence: 0.22,
            beats_per_bar: 4,
            max_slots_per_bar: 4,
            vote_margin: 0.05,
            slash_vote_ratio: 0.35,
        }
    }
}

impl AnalysisConfig {
    /// Hop between frames in samples: a quarter of the medium window
    /// (75% overlap)
    pub fn hop(&self) -> usize {
        (self.window_medium / 4).max(1)
    }

    /// Validate the structural parameters
    ///
    /// Returns a human-readable complaint for shapes the pipeline cannot
    /// process (non-power-of-two windows, inverted ranges).
    pub fn validate(&self) -> Result<(), String> {
        if !self.window_large.is_power_of_two() || !self.window_medium.is_power_of_two() {
            return Err(format!(
                "window sizes must be powers of two, got {} and {}",
                self.window_large, self.window_medium
            ));
        }
        if self.window_large < self.window_medium {
            return Err(format!(
                "large window ({}) must be at least the medium window ({})",
                self.window_large, self.window_medium
            ));
        }
        if self.bpm_range.0 <= 0.0 || self.bpm_range.0 >= self.bpm_range.1 {
            return Err(format!(
                "invalid BPM range [{}, {}]",
                self.bpm_range.0, self.bpm_range.1
            ));
        }
        if self.bpm_fold_range.0 < self.bpm_range.0
            || self.bpm_fold_range.1 > self.bpm_range.1
            || self.bpm_fold_range.1 < self.bpm_fold_range.0 * 2.0
        {
            return Err(format!(
                "fold range [{}, {}] must sit inside the BPM range and span an octave",
                self.bpm_fold_range.0, self.bpm_fold_range.1
            ));
        }
        if self.max_slots_per_bar == 0 || self.max_slots_per_bar > self.beats_per_bar {
            return Err(format!(
                "max_slots_per_bar must be in 1..={}, got {}",
                self.beats_per_bar, self.max_slots_per_bar
            ));
        }
        Ok(())
    }
}
