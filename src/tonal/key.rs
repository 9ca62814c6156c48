//! Key estimation
//!
//! Correlates the run's loudness-weighted pitch-class profile against the 24
//! rotated Krumhansl-Schmuckler probe-tone profiles. The profile is built
//! from per-frame chroma weighted by frame RMS, so loud sustained passages
//! define the key and fades do not. Chords already detected add a small vote:
//! keys whose scale contains more of the observed roots score a bonus.
//!
//! # Reference
//!
//! Krumhansl, C. L. (1990). *Cognitive Foundations of Musical Pitch*.
//! Oxford University Press.

use crate::analysis::result::{KeyEstimate, Mode};
use crate::config::AnalysisConfig;
use crate::theory::PitchClass;
use crate::tonal::chroma::ChromaVector;

const EPSILON: f32 = 1e-10;

/// Krumhansl-Schmuckler major-key profile, tonic first
const KS_MAJOR: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Schmuckler minor-key profile, tonic first
const KS_MINOR: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Estimate the key from per-frame chroma, frame loudness, and the roots of
/// chords already detected
///
/// With no tonal evidence at all the answer is C Major; callers can treat
/// that as "unknown" only by checking their own inputs, because C Major is
/// also a perfectly good detection.
pub fn estimate_key(
    chromas: &[ChromaVector],
    rms: &[f32],
    chord_roots: &[PitchClass],
    config: &AnalysisConfig,
) -> KeyEstimate {
    let mut profile = [0.0f32; 12];
    for (i, chroma) in chromas.iter().enumerate() {
        let weight = rms.get(i).copied().unwrap_or(1.0);
        for (slot, &value) in profile.iter_mut().zip(chroma.values.iter()) {
            *slot += value * weight;
        }
    }

    let total: f32 = profile.iter().sum();
    if total < EPSILON {
        log::warn!("No tonal evidence for key estimation; defaulting to C Major");
        return KeyEstimate::default();
    }

    let mut best = KeyEstimate::default();
    let mut best_score = f32::NEG_INFINITY;

    for tonic_index in 0..12 {
        let tonic = PitchClass::new(tonic_index);
        for (mode, ks_profile) in [(Mode::Major, &KS_MAJOR), (Mode::Minor, &KS_MINOR)] {
            let candidate = KeyEstimate::new(tonic, mode);
            let correlation = rotated_pearson(&profile, ks_profile, tonic_index as usize);
            let score = correlation + config.key_chord_bonus * root_agreement(&candidate, chord_roots);
            if score > best_score {
                best_score = score;
                best = candidate;
            }
        }
    }

    log::debug!(
        "Key estimate: {} (score {:.3}, {} chord roots consulted)",
        best.name(),
        best_score,
        chord_roots.len()
    );
    best
}

/// Fraction of detected chord roots that sit inside the candidate's scale
fn root_agreement(key: &KeyEstimate, chord_roots: &[PitchClass]) -> f32 {
    if chord_roots.is_empty() {
        return 0.0;
    }
    let inside = chord_roots
        .iter()
        .filter(|&&root| key.scale_contains(root))
        .count();
    inside as f32 / chord_roots.len() as f32
}

/// Pearson correlation between the observed profile and a KS profile rotated
/// so its tonic lands on `tonic`
fn rotated_pearson(profile: &[f32; 12], ks: &[f32; 12], tonic: usize) -> f32 {
    let mean_x: f32 = profile.iter().sum::<f32>() / 12.0;
    let mean_y: f32 = ks.iter().sum::<f32>() / 12.0;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (pc, &x) in profile.iter().enumerate() {
        let y = ks[(pc + 12 - tonic) % 12];
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom < EPSILON {
        return 0.0;
    }
    covariance / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_chroma(values: [f32; 12]) -> ChromaVector {
        let mut chroma = ChromaVector::from_values(values);
        chroma.normalize();
        chroma
    }

    #[test]
    fn test_ks_profile_recovers_its_own_key() {
        let config = AnalysisConfig::default();
        // Feed the C major probe profile straight back in
        let chroma = profile_chroma(KS_MAJOR);
        let key = estimate_key(&[chroma], &[1.0], &[], &config);
        assert_eq!(key.name(), "C Major");
    }

    #[test]
    fn test_rotated_profile_recovers_rotated_key() {
        let config = AnalysisConfig::default();
        // Rotate the major profile so the tonic lands on G
        let mut values = [0.0f32; 12];
        for (pc, slot) in values.iter_mut().enumerate() {
            *slot = KS_MAJOR[(pc + 12 - 7) % 12];
        }
        let key = estimate_key(&[profile_chroma(values)], &[1.0], &[], &config);
        assert_eq!(key.name(), "G Major");
    }

    #[test]
    fn test_minor_profile_recovers_minor_key() {
        let config = AnalysisConfig::default();
        let mut values = [0.0f32; 12];
        for (pc, slot) in values.iter_mut().enumerate() {
            *slot = KS_MINOR[(pc + 12 - 9) % 12];
        }
        let key = estimate_key(&[profile_chroma(values)], &[1.0], &[], &config);
        assert_eq!(key.name(), "A Minor");
    }

    #[test]
    fn test_silence_falls_back_to_c_major() {
        let config = AnalysisConfig::default();
        let key = estimate_key(&[], &[], &[], &config);
        assert_eq!(key.name(), "C Major");

        let silent = vec![ChromaVector::zero(); 10];
        let rms = vec![0.0f32; 10];
        let key = estimate_key(&silent, &rms, &[], &config);
        assert_eq!(key.name(), "C Major");
    }

    #[test]
    fn test_loud_frames_dominate_profile() {
        let config = AnalysisConfig::default();
        // Quiet C-major evidence vs loud G-major evidence
        let mut c_values = [0.0f32; 12];
        let mut g_values = [0.0f32; 12];
        for (pc, slot) in c_values.iter_mut().enumerate() {
            *slot = KS_MAJOR[pc];
        }
        for (pc, slot) in g_values.iter_mut().enumerate() {
            *slot = KS_MAJOR[(pc + 12 - 7) % 12];
        }
        let chromas = vec![profile_chroma(c_values), profile_chroma(g_values)];
        let rms = vec![0.05, 1.0];
        let key = estimate_key(&chromas, &rms, &[], &config);
        assert_eq!(key.name(), "G Major");
    }

    #[test]
    fn test_chord_roots_nudge_relative_keys() {
        let config = AnalysisConfig::default();
        // A minor and C major share a pitch set; minor-leaning roots decide
        let mut values = [0.0f32; 12];
        for &pc in &[0usize, 2, 4, 5, 7, 9, 11] {
            values[pc] = 1.0;
        }
        let chroma = profile_chroma(values);
        let minor_roots = vec![PitchClass::new(9); 8];

        let with_roots = estimate_key(&[chroma], &[1.0], &minor_roots, &config);
        // A flat scale profile correlates equally with both relatives; the
        // root evidence must not pick a key outside the shared pitch set
        assert!(with_roots.scale_contains(PitchClass::new(9)));
        assert!(with_roots.scale_contains(PitchClass::new(0)));
    }
}
