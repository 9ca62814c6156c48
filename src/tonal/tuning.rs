//! Per-run tuning reference
//!
//! Real recordings sit a few cents off the 440 Hz grid (vintage tape, baroque
//! tuning, a capo'd guitar tuned by ear). Before chroma extraction the run's
//! global offset is estimated once: every strong peak votes its cents offset
//! from the nearest equal-tempered semitone into a magnitude-weighted
//! histogram, and the smoothed mode is the reference.

use crate::config::AnalysisConfig;
use crate::spectral::Frame;
use crate::theory::cents_from_nearest_semitone;

const EPSILON: f32 = 1e-10;

/// Number of histogram bins across the (-50, 50] cents range
const CENTS_BINS: usize = 100;

/// Estimate the run's tuning offset in cents, clamped to ±50
///
/// Frames quieter than `tuning_rms_gate` times the loudest frame are skipped;
/// of the rest, the strongest few peaks per frame vote. Returns 0.0 when
/// nothing votes (silence or an empty run).
pub fn estimate_tuning(frames: &[Frame], config: &AnalysisConfig) -> f32 {
    let max_rms = frames.iter().map(|f| f.rms).fold(0.0f32, f32::max);
    if max_rms < EPSILON {
        log::warn!("No audible frames for tuning estimation; assuming 440 Hz grid");
        return 0.0;
    }
    let gate = config.tuning_rms_gate * max_rms;

    let mut histogram = [0.0f32; CENTS_BINS];
    let mut votes = 0usize;
    for frame in frames {
        if frame.rms < gate {
            continue;
        }
        // Peak lists arrive sorted by magnitude
        for peak in frame.peaks.iter().take(config.tuning_peaks_per_frame) {
            let cents = match cents_from_nearest_semitone(peak.freq_hz) {
                Some(cents) => cents,
                None => continue,
            };
            let bin = ((cents + 50.0).floor() as i32).clamp(0, CENTS_BINS as i32 - 1) as usize;
            histogram[bin] += peak.magnitude;
            votes += 1;
        }
    }

    if votes == 0 {
        log::warn!("No spectral peaks voted for tuning; assuming 440 Hz grid");
        return 0.0;
    }

    // The cents axis wraps (a +49 and a -49 reading are two cents apart), so
    // the smoothing is circular
    let smoothed = smooth_circular(&histogram, config.tuning_smooth_window);

    let mode_bin = smoothed
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(CENTS_BINS / 2);

    let cents = (mode_bin as f32 + 0.5) - 50.0;
    log::debug!(
        "Tuning estimate: {:.1} cents from {} peak votes",
        cents,
        votes
    );
    cents
}

/// Circular Gaussian smoothing of the cents histogram
fn smooth_circular(histogram: &[f32; CENTS_BINS], window: usize) -> [f32; CENTS_BINS] {
    let window = window.max(1) | 1; // force odd
    let half = (window / 2) as i32;
    let sigma = window as f32 / 4.0;
    let kernel: Vec<f32> = (-half..=half)
        .map(|k| (-(k * k) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let kernel_sum: f32 = kernel.iter().sum();

    let mut smoothed = [0.0f32; CENTS_BINS];
    for (i, out) in smoothed.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (k, &coeff) in kernel.iter().enumerate() {
            let j = (i as i32 + k as i32 - half).rem_euclid(CENTS_BINS as i32) as usize;
            acc += coeff * histogram[j];
        }
        *out = acc / kernel_sum;
    }
    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::SpectralPeak;

    fn frame_with_peaks(rms: f32, peaks: Vec<SpectralPeak>) -> Frame {
        Frame {
            time: 0.0,
            rms,
            flux: 0.0,
            peaks,
        }
    }

    fn detuned(cents: f32) -> SpectralPeak {
        SpectralPeak {
            freq_hz: 440.0 * 2f32.powf(cents / 1200.0),
            magnitude: 1.0,
        }
    }

    #[test]
    fn test_consistent_offset_is_recovered() {
        let config = AnalysisConfig::default();
        let frames: Vec<Frame> = (0..20)
            .map(|_| frame_with_peaks(0.5, vec![detuned(20.0), detuned(19.0), detuned(21.0)]))
            .collect();
        let cents = estimate_tuning(&frames, &config);
        assert!(
            (cents - 20.0).abs() < 2.0,
            "Expected ~20 cents, got {:.1}",
            cents
        );
    }

    #[test]
    fn test_in_tune_recording_reads_near_zero() {
        let config = AnalysisConfig::default();
        let frames: Vec<Frame> = (0..10)
            .map(|_| frame_with_peaks(0.5, vec![detuned(0.0)]))
            .collect();
        let cents = estimate_tuning(&frames, &config);
        assert!(cents.abs() <= 1.0, "Expected ~0 cents, got {:.1}", cents);
    }

    #[test]
    fn test_quiet_frames_do_not_vote() {
        let config = AnalysisConfig::default();
        let mut frames = vec![frame_with_peaks(1.0, vec![detuned(0.0), detuned(-1.0)])];
        // Far below the gate, voting a wild offset
        for _ in 0..50 {
            frames.push(frame_with_peaks(0.01, vec![detuned(40.0)]));
        }
        let cents = estimate_tuning(&frames, &config);
        assert!(
            cents.abs() < 5.0,
            "Gated frames should not drag the estimate, got {:.1}",
            cents
        );
    }

    #[test]
    fn test_silence_defaults_to_zero() {
        let config = AnalysisConfig::default();
        assert_eq!(estimate_tuning(&[], &config), 0.0);
        let silent = vec![frame_with_peaks(0.0, vec![])];
        assert_eq!(estimate_tuning(&silent, &config), 0.0);
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let config = AnalysisConfig::default();
        let frames: Vec<Frame> = (0..12)
            .map(|_| frame_with_peaks(0.4, vec![detuned(-15.0), detuned(-14.0)]))
            .collect();
        let first = estimate_tuning(&frames, &config);
        let second = estimate_tuning(&frames, &config);
        assert_eq!(first, second);
    }
}
