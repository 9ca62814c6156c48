//! Onset picking
//!
//! Turns the frontend's onset-strength curve into a list of onset times. The
//! threshold adapts to a 30-frame neighborhood (median plus mean), so a loud
//! chorus does not swallow the onsets of a quiet verse. Candidates must also
//! be 3-point local maxima, and onsets closer together than the merge window
//! collapse into the stronger one.

const EPSILON: f32 = 1e-10;

use crate::config::AnalysisConfig;

/// Detect onset times (seconds) in an onset-strength curve
pub fn detect_onsets(
    onset_strength: &[f32],
    hop_seconds: f32,
    config: &AnalysisConfig,
) -> Vec<f32> {
    if onset_strength.len() < 3 || hop_seconds <= 0.0 {
        return Vec::new();
    }

    // Step 1: Normalize to [0, 1]
    let max_flux = onset_strength.iter().copied().fold(0.0f32, f32::max);
    if max_flux < EPSILON {
        return Vec::new();
    }
    let normalized: Vec<f32> = onset_strength.iter().map(|&v| v / max_flux).collect();

    // Step 2: Adaptive threshold per frame
    let half = config.onset_median_window.max(2) / 2;
    let mut candidates: Vec<(f32, f32)> = Vec::new();
    for i in 1..normalized.len() - 1 {
        let value = normalized[i];
        // 3-point local maximum
        if value <= normalized[i - 1] || value < normalized[i + 1] {
            continue;
        }

        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(normalized.len());
        let window = &normalized[lo..hi];
        if value > local_threshold(window) {
            candidates.push((i as f32 * hop_seconds, value));
        }
    }

    // Step 3: De-duplicate within the merge window, keeping the stronger
    let mut onsets: Vec<(f32, f32)> = Vec::with_capacity(candidates.len());
    for (time, strength) in candidates {
        if let Some(last) = onsets.last_mut() {
            if time - last.0 < config.onset_merge_window {
                if strength > last.1 {
                    *last = (time, strength);
                }
                continue;
            }
        }
        onsets.push((time, strength));
    }

    log::debug!(
        "Onset picking: {} onsets from {} frames",
        onsets.len(),
        onset_strength.len()
    );
    onsets.into_iter().map(|(time, _)| time).collect()
}

/// Adaptive threshold for one neighborhood: local median plus local mean
fn local_threshold(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let mut sorted = window.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) * 0.5
    } else {
        sorted[mid]
    };
    let mean = window.iter().sum::<f32>() / window.len() as f32;
    median + mean
}
