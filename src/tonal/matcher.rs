//! Chord template matching
//!
//! Scores every (root, template) pair against a chroma vector and keeps the
//! best reading. The score blends cosine similarity with how much energy sits
//! on the hypothesized root, the form's frequency prior, and (once a key is
//! known) a small diatonic bonus. Near-ties resolve toward the simpler form;
//! slash winners must justify their bass with real energy.

use crate::analysis::result::{ChordHypothesis, KeyEstimate};
use crate::config::AnalysisConfig;
use crate::theory::{pick_by_priority, Chord, PitchClass, MATCH_PRIORITY};
use crate::tonal::chroma::ChromaVector;
use crate::tonal::templates::ChordTemplate;

#[derive(Clone, Copy)]
struct Candidate<'a> {
    score: f32,
    root: PitchClass,
    template: &'a ChordTemplate,
}

/// Match one chroma vector against the template set
///
/// Returns `None` for silent chroma and for readings whose final score falls
/// below the rejection floor. A `None` here is ordinary data: the frame simply
/// has no nameable chord.
pub fn match_chroma(
    chroma: &ChromaVector,
    templates: &[ChordTemplate],
    key: Option<&KeyEstimate>,
    config: &AnalysisConfig,
) -> Option<ChordHypothesis> {
    if chroma.is_zero() {
        return None;
    }

    let mut best: Option<Candidate> = None;
    let mut second: Option<Candidate> = None;

    for root_index in 0..12 {
        let root = PitchClass::new(root_index);
        let root_energy = chroma.at(root);
        let diatonic_bonus = match key {
            Some(k) if k.scale_contains(root) => config.match_diatonic_bonus,
            _ => 0.0,
        };

        for template in templates {
            let cosine = rotated_dot(chroma, &template.weights, root.index());
            let score = cosine
                + config.match_root_weight * root_energy
                + template.prior
                + diatonic_bonus;

            let candidate = Candidate {
                score,
                root,
                template,
            };
            match best {
                Some(current) if score <= current.score => {
                    if second.map_or(true, |s| score > s.score) {
                        second = Some(candidate);
                    }
                }
                _ => {
                    second = best;
                    best = Some(candidate);
                }
            }
        }
    }

    let mut winner = best?;

    // Near-tie: the simpler form wins regardless of the hairline score gap
    if let Some(runner_up) = second {
        if winner.score - runner_up.score < config.match_tie_gap {
            let preferred = pick_by_priority(
                &MATCH_PRIORITY,
                winner.template.quality,
                runner_up.template.quality,
            );
            if preferred == runner_up.template.quality && preferred != winner.template.quality {
                winner = runner_up;
            }
        }
    }

    let mut score = winner.score;
    let chord = match winner.template.bass_interval {
        Some(interval) => {
            let bass = winner.root.transposed(interval as i32);
            if chroma.at(bass) >= config.slash_bass_ratio * chroma.at(winner.root) {
                Chord::with_bass(winner.root, winner.template.quality, bass)
            } else {
                // The inversion template matched but the bass is not actually
                // sounding; demote to the plain form
                score *= config.slash_fallback_scale;
                Chord::new(winner.root, winner.template.quality)
            }
        }
        None => Chord::new(winner.root, winner.template.quality),
    };

    if score < config.match_reject_score {
        return None;
    }

    Some(ChordHypothesis::new(chord, score))
}

/// Dot product of a template against the chroma rotated to `root`
///
/// Both sides are unit vectors, so this is their cosine similarity.
fn rotated_dot(chroma: &ChromaVector, weights: &[f32; 12], root: usize) -> f32 {
    let mut dot = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        dot += w * chroma.values[(root + i) % 12];
    }
    dot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::Mode;
    use crate::theory::ChordQuality;
    use crate::tonal::templates::build_templates;

    fn chroma_of(pairs: &[(usize, f32)]) -> ChromaVector {
        let mut chroma = ChromaVector::zero();
        for &(pc, energy) in pairs {
            chroma.values[pc] = energy;
        }
        chroma.normalize();
        chroma
    }

    #[test]
    fn test_clean_major_triad() {
        let config = AnalysisConfig::default();
        let templates = build_templates();
        // C, E, G with realistic energy falloff
        let chroma = chroma_of(&[(0, 1.0), (4, 0.7), (7, 0.9)]);
        let hypothesis = match_chroma(&chroma, &templates, None, &config).unwrap();
        assert_eq!(hypothesis.chord.root, PitchClass::new(0));
        assert_eq!(hypothesis.chord.quality, ChordQuality::Major);
        assert!(hypothesis.chord.bass.is_none());
        assert!(hypothesis.confidence >= 0.5);
    }

    #[test]
    fn test_minor_triad() {
        let config = AnalysisConfig::default();
        let templates = build_templates();
        // A, C, E
        let chroma = chroma_of(&[(9, 1.0), (0, 0.75), (4, 0.85)]);
        let hypothesis = match_chroma(&chroma, &templates, None, &config).unwrap();
        assert_eq!(hypothesis.chord.root, PitchClass::new(9));
        assert_eq!(hypothesis.chord.quality, ChordQuality::Minor);
    }

    #[test]
    fn test_silent_chroma_is_none() {
        let config = AnalysisConfig::default();
        let templates = build_templates();
        assert!(match_chroma(&ChromaVector::zero(), &templates, None, &config).is_none());
    }

    #[test]
    fn test_rejection_floor() {
        let mut config = AnalysisConfig::default();
        config.match_reject_score = 2.0; // nothing scores this high
        let templates = build_templates();
        let chroma = chroma_of(&[(0, 1.0), (4, 0.7), (7, 0.9)]);
        assert!(match_chroma(&chroma, &templates, None, &config).is_none());
    }

    #[test]
    fn test_sus_duality_resolves_to_simpler_form() {
        let config = AnalysisConfig::default();
        let templates = build_templates();
        // {C, D, G} is simultaneously Csus2 and Gsus4; the priority table
        // prefers sus2
        let chroma = chroma_of(&[(0, 1.0), (2, 1.0), (7, 1.0)]);
        let hypothesis = match_chroma(&chroma, &templates, None, &config).unwrap();
        assert_eq!(hypothesis.chord.quality, ChordQuality::Sus2);
        assert_eq!(hypothesis.chord.root, PitchClass::new(0));
    }

    #[test]
    fn test_strong_bass_yields_slash_chord() {
        let config = AnalysisConfig::default();
        let templates = build_templates();
        // Second-inversion C major: G in the bass outweighs the root
        let chroma = chroma_of(&[(0, 0.7), (4, 0.5), (7, 1.2)]);
        let hypothesis = match_chroma(&chroma, &templates, None, &config).unwrap();
        assert_eq!(hypothesis.chord.root, PitchClass::new(0));
        assert_eq!(hypothesis.chord.quality, ChordQuality::Major);
        assert_eq!(hypothesis.chord.bass, Some(PitchClass::new(7)));
        assert!(hypothesis.chord.is_slash());
        assert_eq!(hypothesis.chord.name(), "C/G");
    }

    #[test]
    fn test_slash_fallback_without_bass_energy() {
        let mut config = AnalysisConfig::default();
        // Impossible ratio: every slash winner falls back to its plain form
        config.slash_bass_ratio = 2.0;
        let templates = build_templates();
        let chroma = chroma_of(&[(0, 0.7), (4, 0.5), (7, 1.2)]);
        let hypothesis = match_chroma(&chroma, &templates, None, &config).unwrap();
        assert!(hypothesis.chord.bass.is_none());
        assert_eq!(hypothesis.chord.quality, ChordQuality::Major);
    }

    #[test]
    fn test_diatonic_bonus_breaks_ambiguity_toward_key() {
        let config = AnalysisConfig::default();
        let templates = build_templates();
        let key = KeyEstimate::new(PitchClass::new(0), Mode::Major);
        // Root-ambiguous cluster: make sure the key bonus is additive and
        // keeps a diatonic reading on top
        let chroma = chroma_of(&[(0, 1.0), (4, 0.8), (7, 0.9)]);
        let with_key = match_chroma(&chroma, &templates, Some(&key), &config).unwrap();
        let without_key = match_chroma(&chroma, &templates, None, &config).unwrap();
        assert_eq!(with_key.chord.root, without_key.chord.root);
        assert!(with_key.confidence >= without_key.confidence);
    }
}
