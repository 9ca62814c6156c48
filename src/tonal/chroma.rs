//! Harmonic pitch-class profile (HPCP) extraction
//!
//! Folds spectral peaks into a 12-bin pitch-class vector. Each peak is
//! treated as a potential harmonic: for n = 1..6 the fundamental `peak/n` is
//! hypothesized and votes for its pitch class with a weight that decays with
//! the harmonic index, the cents miss, and how far outside the instrument's
//! register the hypothesis falls. Working on HPSS-masked peaks keeps drum
//! energy out of the vote.

use crate::config::AnalysisConfig;
use crate::spectral::SpectralPeak;
use crate::theory::{frequency_to_pitch_class, PitchClass};

const EPSILON: f32 = 1e-10;

/// Fundamentals below this are not musical content worth voting
const MIN_FUNDAMENTAL_HZ: f32 = 16.0;

/// 12-bin pitch-class energy vector
///
/// Always either L2-normalized or exactly all-zero (silence).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChromaVector {
    /// Energy per pitch class, index 0 = C
    pub values: [f32; 12],
}

impl ChromaVector {
    /// The all-zero vector
    pub fn zero() -> Self {
        Self::default()
    }

    /// Wrap raw values (not normalized)
    pub fn from_values(values: [f32; 12]) -> Self {
        Self { values }
    }

    /// Energy at one pitch class
    pub fn at(&self, pc: PitchClass) -> f32 {
        self.values[pc.index()]
    }

    /// Accumulate weight at one pitch class
    pub fn add(&mut self, pc: PitchClass, weight: f32) {
        self.values[pc.index()] += weight;
    }

    /// Euclidean norm
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// True when there is no energy at all
    pub fn is_zero(&self) -> bool {
        self.norm() < EPSILON
    }

    /// Scale to unit norm; the all-zero vector stays all-zero
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > EPSILON {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }

    /// Pitch class holding the most energy, `None` when silent
    pub fn strongest(&self) -> Option<PitchClass> {
        if self.is_zero() {
            return None;
        }
        self.values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| PitchClass::new(i as i32))
    }

    /// Component-wise median of a set of vectors, re-normalized
    ///
    /// Used for per-beat pooling: the median discards brief transient
    /// contamination that a mean would smear into the beat.
    pub fn median(vectors: &[ChromaVector]) -> ChromaVector {
        if vectors.is_empty() {
            return ChromaVector::zero();
        }
        let mut pooled = ChromaVector::zero();
        let mut column: Vec<f32> = Vec::with_capacity(vectors.len());
        for pc in 0..12 {
            column.clear();
            column.extend(vectors.iter().map(|v| v.values[pc]));
            column.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let mid = column.len() / 2;
            pooled.values[pc] = if column.len() % 2 == 0 {
                (column[mid - 1] + column[mid]) * 0.5
            } else {
                column[mid]
            };
        }
        pooled.normalize();
        pooled
    }
}

/// Extract a normalized chroma vector from one frame's peak list
///
/// `tuning_cents` is the run's detected tuning offset; it re-centers the
/// pitch-class grid so consistently sharp or flat recordings still vote for
/// the intended classes.
pub fn chroma_from_peaks(
    peaks: &[SpectralPeak],
    tuning_cents: f32,
    config: &AnalysisConfig,
) -> ChromaVector {
    let mut chroma = ChromaVector::zero();
    let sigma_sq_2 = 2.0 * config.chroma_cents_sigma * config.chroma_cents_sigma;

    for peak in peaks {
        let base = peak.magnitude.max(0.0).powf(config.chroma_mag_exponent);
        if base <= 0.0 {
            continue;
        }
        for n in 1..=config.chroma_harmonics.max(1) {
            let fundamental = peak.freq_hz / n as f32;
            if fundamental < MIN_FUNDAMENTAL_HZ {
                break;
            }
            let (pc, cents, octave) = match frequency_to_pitch_class(fundamental, tuning_cents) {
                Some(mapped) => mapped,
                None => continue,
            };

            let harmonic_weight = 1.0 / n as f32;
            let spread = (-(cents * cents) / sigma_sq_2).exp();
            let weight = base
                * harmonic_weight
                * spread
                * octave_weight(octave)
                * highpass_gain(fundamental, config);
            if weight <= 0.0 {
                continue;
            }

            if cents.abs() > config.chroma_leak_cents {
                // Off-center hit: share weight with the semitone it leans toward
                let neighbor = pc.transposed(if cents > 0.0 { 1 } else { -1 });
                chroma.add(pc, weight * (1.0 - config.chroma_leak_fraction));
                chroma.add(neighbor, weight * config.chroma_leak_fraction);
            } else {
                chroma.add(pc, weight);
            }
        }
    }

    chroma.normalize();
    chroma
}

/// Register weighting for hypothesized fundamentals
///
/// Guitar and bass fundamentals live in octaves 1-5; hypotheses outside that
/// range are usually harmonic-series aliases.
fn octave_weight(octave: i32) -> f32 {
    match octave {
        2..=4 => 1.0,
        1 | 5 => 0.8,
        0 | 6 => 0.5,
        _ => 0.3,
    }
}

/// Rolloff below the kick-drum boundary
fn highpass_gain(freq_hz: f32, config: &AnalysisConfig) -> f32 {
    if freq_hz >= config.chroma_highpass_hz {
        1.0
    } else {
        (freq_hz / config.chroma_highpass_hz)
            .max(0.0)
            .powf(config.chroma_highpass_power)
    }
}
