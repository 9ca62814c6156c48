//! Tempo estimation from inter-onset intervals
//!
//! Every pair of onsets within a few seconds votes for the BPM values it
//! could imply, at integer beat multiples, into an integer-BPM histogram
//! (the interval-clustering scheme of Dixon 2001). An FFT-accelerated
//! autocorrelation of the onset train (Ellis & Pikrakis 2006) casts bonus
//! votes for the periodicity it finds, which settles metrical-level
//! ambiguities the raw intervals leave open. The winning ±2 BPM window is
//! averaged, octave-folded into a musically plausible range, and rounded.
//!
//! # References
//!
//! Dixon, S. (2001). Automatic Extraction of Tempo and Beat From Expressive
//! Performances. *Journal of New Music Research*, 30(1).
//!
//! Ellis, D. P. W., & Pikrakis, A. (2006). Real-time Beat Induction.
//! *Proceedings of the International Conference on Music Information
//! Retrieval*.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::config::AnalysisConfig;
use crate::spectral::Frame;

const EPSILON: f32 = 1e-10;

/// Gaussian sigma in BPM when spreading a vote across histogram bins
const VOTE_SIGMA_BPM: f32 = 1.5;

/// Bins on each side of a candidate that receive part of its vote
const VOTE_SPREAD_BINS: i32 = 3;

/// Half-width of the window summed when picking the winning BPM
const WINDOW_HALF_BPM: i32 = 2;

/// Relative RMS increase that counts as a rise in the sparse-onset fallback
const RMS_RISE_FACTOR: f32 = 1.2;

/// Estimate the tempo in whole BPM from detected onsets
///
/// With fewer onsets than `min_onsets_for_voting` the estimate falls back to
/// the median interval between frame-RMS rises; with no usable evidence at
/// all it reports 120 BPM.
pub fn estimate_tempo(
    onsets: &[f32],
    frames: &[Frame],
    hop_seconds: f32,
    config: &AnalysisConfig,
) -> f32 {
    if onsets.len() < config.min_onsets_for_voting {
        log::warn!(
            "Too few onsets for interval voting ({} < {}), falling back to RMS rises",
            onsets.len(),
            config.min_onsets_for_voting
        );
        return fallback_tempo(frames, config);
    }

    let (min_bpm, max_bpm) = config.bpm_range;
    let (min_gap, max_gap) = config.ioi_gap_range;
    let mut votes = vec![0.0f32; max_bpm.ceil() as usize + VOTE_SPREAD_BINS as usize + 1];

    // Step 1: Interval voting. Each onset pair within the gap range votes for
    // the BPM it implies at 1..=N beat multiples, damped by the multiple.
    for (i, &earlier) in onsets.iter().enumerate() {
        for &later in &onsets[i + 1..] {
            let gap = later - earlier;
            if gap >= max_gap {
                break;
            }
            if gap <= min_gap {
                continue;
            }
            for multiple in 1..=config.ioi_multiples {
                let bpm = 60.0 * multiple as f32 / gap;
                if bpm < min_bpm || bpm > max_bpm {
                    continue;
                }
                cast_vote(&mut votes, bpm, 1.0 / multiple as f32);
            }
        }
    }

    // Step 2: Autocorrelation cross-check. The dominant ACF periodicity adds
    // a decaying bonus around its BPM, nudging ties toward the level the
    // onset train actually repeats at.
    if let Some(acf_bpm) = autocorrelation_bpm(onsets, hop_seconds, config) {
        log::debug!("Autocorrelation cross-check suggests {:.1} BPM", acf_bpm);
        let center = acf_bpm.round() as i32;
        for delta in -WINDOW_HALF_BPM..=WINDOW_HALF_BPM {
            let bin = center + delta;
            if bin < 0 || bin as usize >= votes.len() {
                continue;
            }
            let falloff = 1.0 - delta.abs() as f32 / (WINDOW_HALF_BPM + 1) as f32;
            votes[bin as usize] += config.autocorr_bonus * falloff;
        }
    }

    // Step 3: Pick the best ±2 BPM window and average inside it.
    let lo = min_bpm.floor() as usize;
    let hi = (max_bpm.ceil() as usize).min(votes.len() - 1);
    let mut best_bin = 0usize;
    let mut best_score = 0.0f32;
    for bin in lo..=hi {
        let from = bin.saturating_sub(WINDOW_HALF_BPM as usize);
        let to = (bin + WINDOW_HALF_BPM as usize).min(votes.len() - 1);
        let score: f32 = votes[from..=to].iter().sum();
        if score > best_score {
            best_score = score;
            best_bin = bin;
        }
    }

    if best_score < EPSILON {
        log::warn!("No usable inter-onset gaps, falling back to RMS rises");
        return fallback_tempo(frames, config);
    }

    let from = best_bin.saturating_sub(WINDOW_HALF_BPM as usize);
    let to = (best_bin + WINDOW_HALF_BPM as usize).min(votes.len() - 1);
    let mut weighted = 0.0f32;
    let mut total = 0.0f32;
    for bin in from..=to {
        weighted += bin as f32 * votes[bin];
        total += votes[bin];
    }
    let raw_bpm = if total > EPSILON {
        weighted / total
    } else {
        best_bin as f32
    };

    let bpm = fold_bpm(raw_bpm, config).round();
    log::debug!(
        "Tempo: {:.0} BPM (raw {:.2}, {} onsets)",
        bpm,
        raw_bpm,
        onsets.len()
    );
    bpm
}

/// Fold a BPM estimate by octaves into the configured fold range, then clamp
/// to the output range
///
/// Halving and doubling preserve the perceived pulse, so 45 becomes 90 and
/// 240 becomes 120.
pub fn fold_bpm(bpm: f32, config: &AnalysisConfig) -> f32 {
    if bpm <= EPSILON || !bpm.is_finite() {
        return 120.0;
    }
    let (fold_lo, fold_hi) = config.bpm_fold_range;
    let mut folded = bpm;
    while folded < fold_lo {
        folded *= 2.0;
    }
    while folded > fold_hi {
        folded /= 2.0;
    }
    folded.clamp(config.bpm_range.0, config.bpm_range.1)
}

/// Spread one vote over nearby integer-BPM bins with a Gaussian profile
fn cast_vote(votes: &mut [f32], bpm: f32, weight: f32) {
    let center = bpm.round() as i32;
    let denom = 2.0 * VOTE_SIGMA_BPM * VOTE_SIGMA_BPM;
    for delta in -VOTE_SPREAD_BINS..=VOTE_SPREAD_BINS {
        let bin = center + delta;
        if bin < 0 || bin as usize >= votes.len() {
            continue;
        }
        let distance = bin as f32 - bpm;
        votes[bin as usize] += weight * (-(distance * distance) / denom).exp();
    }
}

/// Dominant periodicity of the onset train via FFT autocorrelation
///
/// The onsets become a binary signal on the hop grid and the ACF is computed
/// as `IFFT(|FFT(signal)|²)`; the strongest lag inside the BPM search range
/// is converted back to BPM.
fn autocorrelation_bpm(
    onsets: &[f32],
    hop_seconds: f32,
    config: &AnalysisConfig,
) -> Option<f32> {
    if onsets.len() < 2 || hop_seconds <= 0.0 {
        return None;
    }

    let last = onsets.last().copied().unwrap_or(0.0);
    let signal_length = (last / hop_seconds).round() as usize + 1;
    if signal_length < 4 {
        return None;
    }

    let mut signal = vec![0.0f32; signal_length];
    for &time in onsets {
        let frame = (time / hop_seconds).round() as usize;
        if frame < signal_length {
            signal[frame] = 1.0;
        }
    }

    let acf = autocorrelation(&signal);

    // lag = 60 / (BPM * hop)
    let (min_bpm, max_bpm) = config.bpm_range;
    let lag_min = (60.0 / (max_bpm * hop_seconds)).ceil() as usize;
    let lag_max = ((60.0 / (min_bpm * hop_seconds)).floor() as usize).min(acf.len() - 1);
    if lag_min >= lag_max {
        return None;
    }

    let mut best_lag = 0usize;
    let mut best_value = 0.0f32;
    for (offset, &value) in acf[lag_min..=lag_max].iter().enumerate() {
        if value > best_value {
            best_value = value;
            best_lag = lag_min + offset;
        }
    }
    if best_value < EPSILON {
        return None;
    }

    Some(60.0 / (best_lag as f32 * hop_seconds))
}

/// FFT-accelerated autocorrelation: `ACF = IFFT(|FFT(signal)|²)`
fn autocorrelation(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    let fft_size = (2 * n).next_power_of_two();

    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut buffer);

    for x in &mut buffer {
        *x = *x * x.conj();
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut buffer);

    let scale = 1.0 / fft_size as f32;
    buffer[..n].iter().map(|x| (x.re * scale).max(0.0)).collect()
}

/// Sparse-onset fallback: median interval between frame-RMS rises
fn fallback_tempo(frames: &[Frame], config: &AnalysisConfig) -> f32 {
    let mut rises: Vec<f32> = Vec::new();
    for pair in frames.windows(2) {
        if pair[1].rms > pair[0].rms * RMS_RISE_FACTOR && pair[1].rms > EPSILON {
            rises.push(pair[1].time);
        }
    }

    let (min_gap, max_gap) = config.ioi_gap_range;
    let mut intervals: Vec<f32> = rises
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|&gap| gap > min_gap && gap < max_gap)
        .collect();

    if intervals.is_empty() {
        log::warn!("No RMS rises either, defaulting to 120 BPM");
        return 120.0;
    }

    intervals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = intervals.len() / 2;
    let median = if intervals.len() % 2 == 0 {
        (intervals[mid - 1] + intervals[mid]) * 0.5
    } else {
        intervals[mid]
    };

    fold_bpm(60.0 / median, config).round()
}
