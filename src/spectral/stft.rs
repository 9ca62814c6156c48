//! Short-time framing driver
//!
//! Turns a mono buffer into framed magnitude spectra for one window size.
//! Frames are processed in fixed-size blocks: each block fans out across the
//! rayon pool, then the progress observer is polled before the next block
//! starts, which is where cancellation takes effect.

use rayon::prelude::*;

use crate::error::AnalysisError;
use crate::progress::ProgressSink;
use crate::spectral::fft::FftProcessor;
use crate::spectral::window::{frame_starts, hann_window, windowed_frame};
use crate::spectral::SpectralPeak;

/// Peaks below this magnitude are noise, not partials
const MIN_PEAK_MAGNITUDE: f32 = 1e-6;

/// Compute the magnitude spectrogram for one window size
///
/// Returns one `window_size/2`-bin row per frame start; an empty result when
/// the buffer is shorter than the window.
pub(crate) fn magnitude_spectrogram(
    samples: &[f32],
    window_size: usize,
    hop: usize,
    block_frames: usize,
    sink: &mut ProgressSink<'_>,
) -> Result<Vec<Vec<f32>>, AnalysisError> {
    let starts = frame_starts(samples.len(), window_size, hop);
    if starts.is_empty() {
        return Ok(Vec::new());
    }

    log::debug!(
        "Framing {} samples: window={}, hop={}, {} frames",
        samples.len(),
        window_size,
        hop,
        starts.len()
    );

    let fft = FftProcessor::new(window_size);
    let hann = hann_window(window_size);

    let mut spectrogram = Vec::with_capacity(starts.len());
    for chunk in starts.chunks(block_frames.max(1)) {
        let mut rows: Vec<Vec<f32>> = chunk
            .par_iter()
            .map(|&start| fft.magnitudes(&windowed_frame(samples, start, &hann)))
            .collect();
        spectrogram.append(&mut rows);
        sink.advance(chunk.len())?;
    }

    Ok(spectrogram)
}

/// Extract the strongest spectral peaks from one magnitude frame
///
/// A peak is a strict local maximum against its left neighbor (ties to the
/// right are allowed so plateaus yield one peak). Frequencies are refined to
/// sub-bin precision by log-parabolic interpolation; the returned list is
/// sorted by descending magnitude and capped at `max_peaks`.
pub(crate) fn extract_peaks(
    magnitudes: &[f32],
    sample_rate: u32,
    window_size: usize,
    max_peaks: usize,
) -> Vec<SpectralPeak> {
    if magnitudes.len() < 3 || max_peaks == 0 {
        return Vec::new();
    }
    let bin_hz = sample_rate as f32 / window_size as f32;

    let mut peaks = Vec::new();
    for k in 1..magnitudes.len() - 1 {
        let m = magnitudes[k];
        if m <= MIN_PEAK_MAGNITUDE {
            continue;
        }
        if m > magnitudes[k - 1] && m >= magnitudes[k + 1] {
            peaks.push(SpectralPeak {
                freq_hz: interpolate_bin(magnitudes, k) * bin_hz,
                magnitude: m,
            });
        }
    }

    peaks.sort_by(|a, b| {
        b.magnitude
            .partial_cmp(&a.magnitude)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    peaks.truncate(max_peaks);
    peaks
}

/// Refine a peak's bin position by fitting a parabola through the log
/// magnitudes of the bin and its neighbors
fn interpolate_bin(magnitudes: &[f32], bin: usize) -> f32 {
    let y1 = magnitudes[bin - 1].max(1e-12).ln();
    let y2 = magnitudes[bin].max(1e-12).ln();
    let y3 = magnitudes[bin + 1].max(1e-12).ln();
    let denominator = 2.0 * y2 - y1 - y3;
    if !denominator.is_finite() || denominator.abs() < 1e-6 {
        return bin as f32;
    }
    let shift = ((y3 - y1) / (2.0 * denominator)).clamp(-0.5, 0.5);
    bin as f32 + shift
}
