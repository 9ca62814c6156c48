//! Spectral frontend
//!
//! Converts a mono buffer into framed, harmonic-emphasized spectra plus an
//! onset-strength curve. Two window sizes share one hop: the medium window
//! (4096 by default) tracks chord changes, the large window (8192) resolves
//! bass notes and close intervals. Because the hop is shared, frame `i` in
//! both sequences covers the same stretch of audio and downstream stages can
//! merge them by index.

pub mod fft;
pub mod flux;
pub mod hpss;
pub mod stft;
pub mod window;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::progress::{ProgressSink, Stage};

/// One interpolated spectral peak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPeak {
    /// Interpolated frequency in Hz
    pub freq_hz: f32,
    /// Normalized magnitude at the peak bin
    pub magnitude: f32,
}

/// One analysis frame: everything later stages need from a slice of audio
#[derive(Debug, Clone)]
pub struct Frame {
    /// Start time of the frame in seconds
    pub time: f32,
    /// RMS of the raw samples under the window
    pub rms: f32,
    /// Full-band positive spectral flux against the previous frame
    pub flux: f32,
    /// Harmonic-masked peaks, strongest first
    pub peaks: Vec<SpectralPeak>,
}

/// Frontend output bundle
#[derive(Debug, Clone, Default)]
pub struct SpectralAnalysis {
    /// Medium-window frames (time-sharp)
    pub medium: Vec<Frame>,
    /// Large-window frames (frequency-sharp); empty when the buffer is too
    /// short for the large window
    pub large: Vec<Frame>,
    /// Combined band-split onset-strength curve, one value per hop
    pub onset_strength: Vec<f32>,
    /// Hop between frames in samples
    pub hop: usize,
    /// Input sample rate
    pub sample_rate: u32,
}

impl SpectralAnalysis {
    /// Seconds per hop
    pub fn hop_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.hop as f32 / self.sample_rate as f32
        }
    }
}

/// Run the full frontend over a mono buffer
///
/// A buffer shorter than the medium window produces an empty
/// [`SpectralAnalysis`]; one that fits the medium window but not the large
/// one produces medium frames only.
pub fn analyze_frontend(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
    sink: &mut ProgressSink<'_>,
) -> Result<SpectralAnalysis, AnalysisError> {
    let hop = config.hop();
    if samples.len() < config.window_medium {
        log::debug!(
            "Buffer of {} samples is shorter than the medium window ({}); no frames",
            samples.len(),
            config.window_medium
        );
        return Ok(SpectralAnalysis {
            hop,
            sample_rate,
            ..Default::default()
        });
    }

    let has_large = samples.len() >= config.window_large;
    if !has_large {
        log::warn!(
            "Buffer of {} samples fits only the medium window; large-window pass skipped",
            samples.len()
        );
    }

    let frame_count = window::frame_starts(samples.len(), config.window_medium, hop).len();
    let total = if has_large {
        frame_count * 2
    } else {
        frame_count
    };
    sink.begin(Stage::Frontend, total);

    let mut medium_spec = stft::magnitude_spectrogram(
        samples,
        config.window_medium,
        hop,
        config.progress_block_frames,
        sink,
    )?;
    if medium_spec.len() != frame_count {
        return Err(AnalysisError::ProcessingError(format!(
            "Medium pass produced {} frames, expected {}",
            medium_spec.len(),
            frame_count
        )));
    }
    let mut large_spec = if has_large {
        stft::magnitude_spectrogram(
            samples,
            config.window_large,
            hop,
            config.progress_block_frames,
            sink,
        )?
    } else {
        Vec::new()
    };

    // Onset strength comes from the raw spectra; masking would erase the very
    // transients it measures
    let nyquist = sample_rate as f32 / 2.0;
    let low_flux = flux::band_flux(
        &large_spec,
        sample_rate,
        config.window_large,
        config.low_band_hz.0,
        config.low_band_hz.1,
    );
    let mid_flux = flux::band_flux(
        &medium_spec,
        sample_rate,
        config.window_medium,
        config.mid_band_hz.0,
        config.mid_band_hz.1,
    );
    let onset_strength = flux::combine_bands(&low_flux, &mid_flux, config.low_band_weight);

    let medium_full_flux = flux::band_flux(&medium_spec, sample_rate, config.window_medium, 0.0, nyquist);
    let large_full_flux = flux::band_flux(&large_spec, sample_rate, config.window_large, 0.0, nyquist);

    hpss::harmonic_mask(
        &mut medium_spec,
        config.hpss_time_kernel,
        config.hpss_freq_kernel,
    );
    hpss::harmonic_mask(
        &mut large_spec,
        config.hpss_time_kernel,
        config.hpss_freq_kernel,
    );

    let medium = assemble_frames(
        samples,
        sample_rate,
        &medium_spec,
        &medium_full_flux,
        config.window_medium,
        hop,
        config.max_peaks_per_frame,
    );
    let large = assemble_frames(
        samples,
        sample_rate,
        &large_spec,
        &large_full_flux,
        config.window_large,
        hop,
        config.max_peaks_per_frame,
    );

    log::debug!(
        "Frontend produced {} medium frames, {} large frames",
        medium.len(),
        large.len()
    );

    Ok(SpectralAnalysis {
        medium,
        large,
        onset_strength,
        hop,
        sample_rate,
    })
}

fn assemble_frames(
    samples: &[f32],
    sample_rate: u32,
    spectrogram: &[Vec<f32>],
    full_flux: &[f32],
    window_size: usize,
    hop: usize,
    max_peaks: usize,
) -> Vec<Frame> {
    use rayon::prelude::*;

    spectrogram
        .par_iter()
        .enumerate()
        .map(|(i, magnitudes)| {
            let start = i * hop;
            Frame {
                time: start as f32 / sample_rate as f32,
                rms: window::segment_rms(samples, start, window_size),
                flux: full_flux.get(i).copied().unwrap_or(0.0),
                peaks: stft::extract_peaks(magnitudes, sample_rate, window_size, max_peaks),
            }
        })
        .collect()
}
