//! Beat-bucket segmentation into bar slots
//!
//! Smoothed chord frames are still one reading per hop; a chart needs one
//! chord per stretch of beats. Frames are bucketed into one-beat bins on the
//! phase-aligned grid and each bin elects a representative chord by
//! confidence-weighted voting: the root with the most weight wins, the
//! quality needs a clear margin over the runner-up or the simplicity table
//! decides, tension qualities collapse to their notation base form, and a
//! slash bass survives only when enough of the root's weight carried it.
//! Empty beats inherit a neighbor, and each bar's beats are run-length
//! encoded into at most `max_slots_per_bar` contiguous slots.

use crate::analysis::{ChordFrame, ChordHypothesis, TempoEstimate};
use crate::config::AnalysisConfig;
use crate::theory::{pick_by_priority, Chord, ChordQuality, PitchClass, ENSEMBLE_PRIORITY};

use super::{Bar, Slot, SlotOrigin};

const EPSILON: f32 = 1e-10;

/// Lay the smoothed chord frames out as bars of chord slots
///
/// `duration_seconds` fixes the chart length; beats past the last frame are
/// filled by propagation so the final bar is always complete. An empty or
/// zero-length recording yields no bars.
pub fn layout_bars(
    frames: &[ChordFrame],
    tempo: &TempoEstimate,
    duration_seconds: f32,
    config: &AnalysisConfig,
) -> Vec<Bar> {
    if duration_seconds <= 0.0 || tempo.bpm <= 0.0 {
        return Vec::new();
    }
    let beat = 60.0 / tempo.bpm;
    let grid_start = tempo.beat_phase;
    let n_beats = (((duration_seconds - grid_start) / beat).ceil() as usize).max(1);
    let beats_per_bar = config.beats_per_bar;
    let padded = ((n_beats + beats_per_bar - 1) / beats_per_bar) * beats_per_bar;

    let mut buckets: Vec<Vec<&ChordFrame>> = vec![Vec::new(); padded];
    for frame in frames {
        let index = (((frame.time - grid_start) / beat).floor() as i64)
            .clamp(0, padded as i64 - 1) as usize;
        buckets[index].push(frame);
    }

    let mut beat_estimates: Vec<Option<ChordHypothesis>> =
        buckets.iter().map(|bin| vote_beat(bin, config)).collect();

    // Forward- then backward-propagation: silent beats inherit the chord
    // still ringing (or about to start) rather than punching holes in the bar
    for i in 1..beat_estimates.len() {
        if beat_estimates[i].is_none() {
            beat_estimates[i] = beat_estimates[i - 1];
        }
    }
    for i in (0..beat_estimates.len().saturating_sub(1)).rev() {
        if beat_estimates[i].is_none() {
            beat_estimates[i] = beat_estimates[i + 1];
        }
    }

    let bars: Vec<Bar> = beat_estimates
        .chunks(beats_per_bar)
        .enumerate()
        .map(|(bar_index, chunk)| Bar {
            index: bar_index,
            start_time: grid_start + (bar_index * beats_per_bar) as f32 * beat,
            slots: slots_for_bar(chunk, config),
        })
        .collect();

    log::debug!(
        "Laid out {} bars over {} beats at {:.0} BPM",
        bars.len(),
        padded,
        tempo.bpm
    );
    bars
}

/// Elect one representative chord for a beat's frames
fn vote_beat(frames: &[&ChordFrame], config: &AnalysisConfig) -> Option<ChordHypothesis> {
    let mut root_weight = [0.0f32; 12];
    let mut conf_sum = [0.0f32; 12];
    let mut conf_count = [0.0f32; 12];
    for frame in frames {
        if let Some(h) = &frame.hypothesis {
            let root = h.chord.root.index();
            root_weight[root] += h.confidence;
            conf_sum[root] += h.confidence;
            conf_count[root] += 1.0;
        }
    }

    let mut root = 0usize;
    for (candidate, &weight) in root_weight.iter().enumerate() {
        if weight > root_weight[root] {
            root = candidate;
        }
    }
    let total = root_weight[root];
    if total < EPSILON {
        return None;
    }

    // Second pass, restricted to the winning root: quality and bass tallies.
    // Tension qualities collapse to their base form before voting so a 9th
    // and its plain 7th pool their weight.
    let mut quality_pairs: Vec<(ChordQuality, f32)> = Vec::new();
    let mut bass_weight = [0.0f32; 12];
    for frame in frames {
        if let Some(h) = &frame.hypothesis {
            let chord = h.chord.base_form();
            if chord.root.index() != root {
                continue;
            }
            match quality_pairs.iter_mut().find(|(q, _)| *q == chord.quality) {
                Some(entry) => entry.1 += h.confidence,
                None => quality_pairs.push((chord.quality, h.confidence)),
            }
            if let Some(bass) = chord.bass {
                bass_weight[bass.index()] += h.confidence;
            }
        }
    }

    let rank = |q: ChordQuality| {
        ENSEMBLE_PRIORITY
            .iter()
            .position(|&e| e == q)
            .unwrap_or(ENSEMBLE_PRIORITY.len())
    };
    quality_pairs.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| rank(a.0).cmp(&rank(b.0)))
    });
    let quality = match quality_pairs.as_slice() {
        [] => return None,
        [(only, _)] => *only,
        [(first, w1), (second, w2), ..] => {
            if w1 - w2 >= config.vote_margin * total {
                *first
            } else {
                pick_by_priority(&ENSEMBLE_PRIORITY, *first, *second)
            }
        }
    };

    let mut best_bass = 0usize;
    for (candidate, &weight) in bass_weight.iter().enumerate() {
        if weight > bass_weight[best_bass] {
            best_bass = candidate;
        }
    }
    let root_pc = PitchClass::new(root as i32);
    let chord = if bass_weight[best_bass] >= config.slash_vote_ratio * total {
        Chord::with_bass(root_pc, quality, PitchClass::new(best_bass as i32))
    } else {
        Chord::new(root_pc, quality)
    };

    let confidence = conf_sum[root] / conf_count[root];
    Some(ChordHypothesis::new(chord, confidence))
}

struct Run {
    start: usize,
    len: usize,
    hypothesis: Option<ChordHypothesis>,
}

fn chords_match(a: &Option<ChordHypothesis>, b: &Option<ChordHypothesis>) -> bool {
    a.map(|h| h.chord) == b.map(|h| h.chord)
}

fn confidence_of(h: &Option<ChordHypothesis>) -> f32 {
    h.map_or(0.0, |x| x.confidence)
}

/// Run-length encode one bar's beats into slots, honoring the slot cap
fn slots_for_bar(beats: &[Option<ChordHypothesis>], config: &AnalysisConfig) -> Vec<Slot> {
    let mut runs: Vec<Run> = Vec::new();
    for (i, estimate) in beats.iter().enumerate() {
        match runs.last_mut() {
            Some(run) if chords_match(&run.hypothesis, estimate) => {
                run.len += 1;
                if confidence_of(estimate) > confidence_of(&run.hypothesis) {
                    run.hypothesis = *estimate;
                }
            }
            _ => runs.push(Run {
                start: i,
                len: 1,
                hypothesis: *estimate,
            }),
        }
    }

    // Cap pressure: repeatedly fold the shortest run into its longer
    // neighbor; the absorbing run's chord covers the merged span
    while runs.len() > config.max_slots_per_bar {
        let mut shortest = 0usize;
        for (i, run) in runs.iter().enumerate() {
            if run.len < runs[shortest].len {
                shortest = i;
            }
        }
        let into_prev = if shortest == 0 {
            false
        } else if shortest + 1 >= runs.len() {
            true
        } else {
            runs[shortest - 1].len >= runs[shortest + 1].len
        };
        if into_prev {
            runs[shortest - 1].len += runs[shortest].len;
            runs.remove(shortest);
        } else if shortest + 1 < runs.len() {
            runs[shortest + 1].len += runs[shortest].len;
            runs[shortest + 1].start = runs[shortest].start;
            runs.remove(shortest);
        } else {
            break;
        }
    }

    // Merging can leave equal chords adjacent; coalesce them
    let mut coalesced: Vec<Run> = Vec::new();
    for run in runs {
        match coalesced.last_mut() {
            Some(prev) if chords_match(&prev.hypothesis, &run.hypothesis) => {
                prev.len += run.len;
                if confidence_of(&run.hypothesis) > confidence_of(&prev.hypothesis) {
                    prev.hypothesis = run.hypothesis;
                }
            }
            _ => coalesced.push(run),
        }
    }

    coalesced
        .into_iter()
        .map(|run| Slot {
            beat_offset: run.start as f32,
            beat_len: run.len as f32,
            hypothesis: run.hypothesis,
            origin: SlotOrigin::Automatic,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(time: f32, chord: Option<Chord>, confidence: f32) -> ChordFrame {
        ChordFrame {
            time,
            hypothesis: chord.map(|c| ChordHypothesis::new(c, confidence)),
        }
    }

    fn plain(root: i32, quality: ChordQuality) -> Chord {
        Chord::new(PitchClass::new(root), quality)
    }

    fn tempo_120() -> TempoEstimate {
        TempoEstimate {
            bpm: 120.0,
            beat_phase: 0.0,
        }
    }

    /// Frames every 100 ms holding the given chord through each beat
    fn frames_for_beats(beats: &[Option<Chord>], beat_seconds: f32) -> Vec<ChordFrame> {
        let mut frames = Vec::new();
        for (b, chord) in beats.iter().enumerate() {
            for k in 0..5 {
                let time = b as f32 * beat_seconds + k as f32 * 0.1;
                frames.push(frame(time, *chord, 0.8));
            }
        }
        frames
    }

    #[test]
    fn test_three_c_one_g_layout() {
        let config = AnalysisConfig::default();
        let beats = [
            Some(plain(0, ChordQuality::Major)),
            Some(plain(0, ChordQuality::Major)),
            Some(plain(0, ChordQuality::Major)),
            Some(plain(7, ChordQuality::Major)),
        ];
        let frames = frames_for_beats(&beats, 0.5);
        let bars = layout_bars(&frames, &tempo_120(), 2.0, &config);
        assert_eq!(bars.len(), 1);
        let slots = &bars[0].slots;
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].hypothesis.unwrap().chord.name(), "C");
        assert_eq!(slots[0].beat_len, 3.0);
        assert_eq!(slots[1].hypothesis.unwrap().chord.name(), "G");
        assert_eq!(slots[1].beat_len, 1.0);
        assert!(bars[0].is_exact_partition(4.0));
    }

    #[test]
    fn test_silent_beats_inherit_neighbors() {
        let config = AnalysisConfig::default();
        // Only beats 0 and 3 are voiced; 1 and 2 must inherit
        let beats = [
            Some(plain(0, ChordQuality::Major)),
            None,
            None,
            Some(plain(0, ChordQuality::Major)),
        ];
        let frames = frames_for_beats(&beats, 0.5);
        let bars = layout_bars(&frames, &tempo_120(), 2.0, &config);
        assert_eq!(bars[0].slots.len(), 1);
        assert_eq!(bars[0].slots[0].hypothesis.unwrap().chord.name(), "C");
        assert_eq!(bars[0].slots[0].beat_len, 4.0);
    }

    #[test]
    fn test_leading_silence_backfills() {
        let config = AnalysisConfig::default();
        let beats = [
            None,
            Some(plain(7, ChordQuality::Major)),
            Some(plain(7, ChordQuality::Major)),
            Some(plain(7, ChordQuality::Major)),
        ];
        let frames = frames_for_beats(&beats, 0.5);
        let bars = layout_bars(&frames, &tempo_120(), 2.0, &config);
        assert_eq!(bars[0].slots.len(), 1);
        assert_eq!(bars[0].slots[0].hypothesis.unwrap().chord.name(), "G");
    }

    #[test]
    fn test_slot_cap_merges_shortest_runs() {
        let mut config = AnalysisConfig::default();
        config.max_slots_per_bar = 2;
        let beats = [
            Some(plain(0, ChordQuality::Major)),
            Some(plain(7, ChordQuality::Major)),
            Some(plain(9, ChordQuality::Minor)),
            Some(plain(5, ChordQuality::Major)),
        ];
        let frames = frames_for_beats(&beats, 0.5);
        let bars = layout_bars(&frames, &tempo_120(), 2.0, &config);
        assert_eq!(bars[0].slots.len(), 2);
        assert!(bars[0].is_exact_partition(4.0));
    }

    #[test]
    fn test_quality_tie_breaks_to_simpler() {
        let config = AnalysisConfig::default();
        // Equal weight between C and Cm within one beat
        let frames = vec![
            frame(0.0, Some(plain(0, ChordQuality::Minor)), 0.5),
            frame(0.1, Some(plain(0, ChordQuality::Major)), 0.5),
        ];
        let bars = layout_bars(&frames, &tempo_120(), 0.5, &config);
        let name = bars[0].slots[0].hypothesis.unwrap().chord.name();
        assert_eq!(name, "C", "priority table resolves the stalemate");
    }

    #[test]
    fn test_tension_collapses_to_base_form() {
        let config = AnalysisConfig::default();
        let frames = vec![
            frame(0.0, Some(plain(0, ChordQuality::Ninth)), 0.6),
            frame(0.1, Some(plain(0, ChordQuality::Ninth)), 0.6),
        ];
        let bars = layout_bars(&frames, &tempo_120(), 0.5, &config);
        assert_eq!(bars[0].slots[0].hypothesis.unwrap().chord.name(), "C7");
    }

    #[test]
    fn test_slash_needs_enough_weight() {
        let config = AnalysisConfig::default();
        let slash = Chord::with_bass(
            PitchClass::new(0),
            ChordQuality::Major,
            PitchClass::new(7),
        );
        // 2 of 5 frames carry the bass: 40% of the weight, kept
        let mut frames = vec![
            frame(0.0, Some(slash), 0.5),
            frame(0.1, Some(slash), 0.5),
        ];
        for k in 2..5 {
            frames.push(frame(k as f32 * 0.1, Some(plain(0, ChordQuality::Major)), 0.5));
        }
        let bars = layout_bars(&frames, &tempo_120(), 0.5, &config);
        assert_eq!(bars[0].slots[0].hypothesis.unwrap().chord.name(), "C/G");

        // 1 of 5 frames: 20%, dropped
        let mut frames = vec![frame(0.0, Some(slash), 0.5)];
        for k in 1..5 {
            frames.push(frame(k as f32 * 0.1, Some(plain(0, ChordQuality::Major)), 0.5));
        }
        let bars = layout_bars(&frames, &tempo_120(), 0.5, &config);
        assert_eq!(bars[0].slots[0].hypothesis.unwrap().chord.name(), "C");
    }

    #[test]
    fn test_phase_shifts_the_grid() {
        let config = AnalysisConfig::default();
        let tempo = TempoEstimate {
            bpm: 120.0,
            beat_phase: 0.25,
        };
        let beats = [Some(plain(0, ChordQuality::Major)); 4];
        let mut frames = frames_for_beats(&beats, 0.5);
        for f in frames.iter_mut() {
            f.time += 0.25;
        }
        let bars = layout_bars(&frames, &tempo, 2.25, &config);
        assert!((bars[0].start_time - 0.25).abs() < 1e-6);
        assert!(bars[0].is_exact_partition(4.0));
    }

    #[test]
    fn test_empty_input_yields_silent_bar() {
        let config = AnalysisConfig::default();
        let bars = layout_bars(&[], &tempo_120(), 1.0, &config);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].slots.len(), 1);
        assert!(bars[0].slots[0].hypothesis.is_none());
        assert_eq!(bars[0].slots[0].beat_len, 4.0);
        assert!(bars[0].is_exact_partition(4.0));
    }

    #[test]
    fn test_zero_duration_yields_no_bars() {
        let config = AnalysisConfig::default();
        assert!(layout_bars(&[], &tempo_120(), 0.0, &config).is_empty());
    }

    #[test]
    fn test_multi_bar_partition_invariant() {
        let config = AnalysisConfig::default();
        let beats = [
            Some(plain(0, ChordQuality::Major)),
            Some(plain(0, ChordQuality::Major)),
            Some(plain(7, ChordQuality::Major)),
            Some(plain(9, ChordQuality::Minor)),
            Some(plain(5, ChordQuality::Major)),
            Some(plain(5, ChordQuality::Major)),
            None,
            Some(plain(0, ChordQuality::Major)),
        ];
        let frames = frames_for_beats(&beats, 0.5);
        let bars = layout_bars(&frames, &tempo_120(), 4.0, &config);
        assert_eq!(bars.len(), 2);
        for bar in &bars {
            assert!(
                bar.is_exact_partition(config.beats_per_bar as f32),
                "bar {} breaks the partition",
                bar.index
            );
        }
        assert_eq!(bars[1].index, 1);
        assert!((bars[1].start_time - 2.0).abs() < 1e-6);
    }
}
