//! Chord template table
//!
//! One root-relative weight vector per chord form. Interval weights reflect
//! how reliably each chord tone shows up in a real strum: the root and fifth
//! carry the voicing, the third colors it, extensions are faint. Four slash
//! forms duplicate the common inversions with extra weight on the bass
//! interval. Every template carries an empirical type-frequency prior so a
//! marginal `Cmaj` beats an equally marginal `Caug`.

use crate::theory::ChordQuality;

/// Extra weight granted to the sounding bass in slash templates
const BASS_WEIGHT: f32 = 0.9;

/// The slash forms worth modeling: first- and second-inversion major,
/// first- and second-inversion minor
const SLASH_FORMS: [(ChordQuality, usize); 4] = [
    (ChordQuality::Major, 4),
    (ChordQuality::Major, 7),
    (ChordQuality::Minor, 3),
    (ChordQuality::Minor, 7),
];

/// A root-relative chord template
#[derive(Debug, Clone)]
pub struct ChordTemplate {
    /// Chord form this template detects
    pub quality: ChordQuality,
    /// Interval of the sounding bass for slash forms
    pub bass_interval: Option<usize>,
    /// L2-normalized weight per semitone above the root
    pub weights: [f32; 12],
    /// Empirical frequency prior added to the match score
    pub prior: f32,
}

/// Build the full template set: every quality plus the slash forms
pub fn build_templates() -> Vec<ChordTemplate> {
    let mut templates: Vec<ChordTemplate> = ChordQuality::ALL
        .iter()
        .map(|&quality| ChordTemplate {
            quality,
            bass_interval: None,
            weights: template_weights(quality, None),
            prior: type_prior(quality),
        })
        .collect();

    for &(quality, bass) in &SLASH_FORMS {
        templates.push(ChordTemplate {
            quality,
            bass_interval: Some(bass),
            weights: template_weights(quality, Some(bass)),
            // Inversions are real but rarer than root position
            prior: type_prior(quality) * 0.6,
        });
    }

    templates
}

/// Weight of a chord tone by its interval above the root
fn interval_weight(interval: usize) -> f32 {
    match interval {
        0 => 2.2,
        6 | 7 | 8 => 1.5,
        3 | 4 => 1.3,
        10 | 11 => 1.0,
        9 => 0.85,
        2 | 5 => 0.8,
        _ => 0.7,
    }
}

fn template_weights(quality: ChordQuality, bass_interval: Option<usize>) -> [f32; 12] {
    let mut weights = [0.0f32; 12];
    for &interval in quality.intervals() {
        weights[interval % 12] = interval_weight(interval % 12);
    }
    if let Some(bass) = bass_interval {
        weights[bass % 12] += BASS_WEIGHT;
    }

    let norm = weights.iter().map(|w| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for w in &mut weights {
            *w /= norm;
        }
    }
    weights
}

/// How often each chord form occurs in popular-music charts, on an additive
/// score scale
fn type_prior(quality: ChordQuality) -> f32 {
    match quality {
        ChordQuality::Major => 0.055,
        ChordQuality::Minor => 0.050,
        ChordQuality::Dominant7 => 0.040,
        ChordQuality::Minor7 => 0.038,
        ChordQuality::Major7 => 0.030,
        ChordQuality::Power => 0.025,
        ChordQuality::Sus4 => 0.022,
        ChordQuality::Sus2 => 0.020,
        ChordQuality::Add9 => 0.018,
        ChordQuality::Sixth => 0.015,
        ChordQuality::MinorSixth => 0.012,
        ChordQuality::Ninth => 0.010,
        ChordQuality::Diminished => 0.008,
        ChordQuality::MinorNinth => 0.008,
        ChordQuality::MajorNinth => 0.007,
        ChordQuality::Augmented => 0.006,
        ChordQuality::Eleventh => 0.006,
        ChordQuality::Thirteenth => 0.006,
    }
}
