//! # Tabscribe
//!
//! Offline music-audio analysis for guitar tablature: hand it raw PCM and it
//! returns the chord progression, key, tempo, and a bar/slot chart ready to
//! render over fingering diagrams.
//!
//! ## Features
//!
//! - **Chord detection**: HPSS-masked chroma matched against a 200+ chord
//!   template vocabulary, with slash-bass readings
//! - **Key estimation**: Krumhansl-style profile correlation reinforced by
//!   detected chord roots, plus diatonic snapping of dubious accidentals
//! - **Tempo and beat phase**: inter-onset voting cross-checked by
//!   autocorrelation, beat phase recovered from chord-change times
//! - **Notation layout**: beat-quantized bars with at most a few chord slots
//!   each, and a merge step that preserves a user's manual edits across
//!   re-analysis
//!
//! ## Quick Start
//!
//! ```no_run
//! use tabscribe::{analyze, AnalysisConfig};
//!
//! // Interleaved f32 PCM, any channel count
//! let samples = vec![0.0f32; 48000 * 8];
//! let result = analyze(&samples, 1, 48000, &AnalysisConfig::default())?;
//!
//! println!("Key: {}", result.key.name());
//! println!("Tempo: {:.0} BPM", result.tempo.bpm);
//! for bar in &result.bars {
//!     println!("bar {}: {} slots", bar.index, bar.slots.len());
//! }
//! # Ok::<(), tabscribe::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! PCM → down-mix → spectral frontend (STFT, HPSS, onset strength)
//!     → tonal (tuning, chroma, chord matching, key)
//!     → rhythm (onsets, tempo, beat phase)
//!     → smoothing (window ensemble, beat pooling, continuity passes)
//!     → notation (bars and slots)
//! ```
//!
//! The whole pipeline is a single blocking call; long runs can report
//! progress and be cancelled through an [`AnalysisObserver`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod notation;
pub mod preprocessing;
pub mod progress;
pub mod rhythm;
pub mod smoothing;
pub mod spectral;
pub mod theory;
pub mod tonal;

pub use analysis::{
    AnalysisFlag, AnalysisMetadata, AnalysisResult, ChordFrame, ChordHypothesis, KeyEstimate,
    Mode, TempoEstimate,
};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use notation::{merge_bars, Bar, Slot, SlotOrigin};
pub use progress::{AnalysisObserver, Flow, NoopObserver, ProgressUpdate, Stage};
pub use theory::{Chord, ChordQuality, PitchClass};

use std::time::Instant;

use analysis::RunContext;
use progress::ProgressSink;
use spectral::Frame;
use tonal::{ChordTemplate, ChromaVector};

/// Tuning offsets beyond this many cents sit close enough to the
/// half-semitone boundary to make pitch-class assignment unstable
const TUNING_DRIFT_CENTS: f32 = 35.0;

/// Fraction of frames that must carry a chord before the run counts as
/// normally voiced
const LOW_VOICING_FRACTION: f32 = 0.5;

/// Analyze a PCM buffer
///
/// The convenience form of [`analyze_with_observer`] with progress reporting
/// disabled.
///
/// # Arguments
///
/// * `samples` - Interleaved f32 PCM, nominally in [-1.0, 1.0]
/// * `channels` - Channel count; multi-channel input is down-mixed to mono
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Analysis parameters; [`AnalysisConfig::default`] is the
///   calibrated set
///
/// # Errors
///
/// `InvalidInput` for a malformed buffer shape, zero sample rate, or an
/// unusable config. A buffer that is merely silent or too short for a single
/// analysis window is not an error; it produces a fallback result (no
/// chords, C major, 120 BPM) with the shortfall noted in the metadata.
pub fn analyze(
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let mut observer = NoopObserver;
    analyze_with_observer(samples, channels, sample_rate, config, &mut observer)
}

/// Analyze a PCM buffer, reporting progress to an observer
///
/// The observer is polled at stage boundaries and every few dozen frames
/// inside the frontend; returning [`Flow::Cancel`] aborts the run with
/// [`AnalysisError::Cancelled`] at the next yield point.
pub fn analyze_with_observer(
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
    config: &AnalysisConfig,
    observer: &mut dyn AnalysisObserver,
) -> Result<AnalysisResult, AnalysisError> {
    let start_time = Instant::now();

    config.validate().map_err(AnalysisError::InvalidInput)?;
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "sample rate must be positive".to_string(),
        ));
    }

    log::debug!(
        "Starting analysis: {} samples, {} channels at {} Hz",
        samples.len(),
        channels,
        sample_rate
    );

    let mono = preprocessing::downmix_to_mono(samples, channels)?;
    let duration_seconds = mono.len() as f32 / sample_rate as f32;

    let mut metadata = AnalysisMetadata {
        duration_seconds,
        sample_rate,
        ..Default::default()
    };

    let mut sink = ProgressSink::new(observer);
    let frontend = spectral::analyze_frontend(&mono, sample_rate, config, &mut sink)?;

    if frontend.medium.is_empty() {
        log::warn!("Buffer too short for a single analysis window; returning fallback result");
        metadata
            .warnings
            .push("buffer shorter than one analysis window".to_string());
        let tempo = TempoEstimate::default();
        let bars = notation::layout_bars(&[], &tempo, duration_seconds, config);
        metadata.processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
        return Ok(AnalysisResult {
            chord_frames: Vec::new(),
            key: KeyEstimate::default(),
            tempo,
            bars,
            metadata,
        });
    }

    // Tonal: tuning, chroma, chord candidates, key
    sink.begin(Stage::Tonal, 4);
    let mut ctx = RunContext::new();
    let tuning_frames: &[Frame] = if frontend.large.is_empty() {
        &frontend.medium
    } else {
        &frontend.large
    };
    let tuning_cents = ctx.tuning_cents(tuning_frames, config);
    metadata.tuning_cents = tuning_cents;
    if tuning_cents.abs() > TUNING_DRIFT_CENTS {
        metadata.raise(AnalysisFlag::TuningDrift);
        metadata
            .warnings
            .push(format!("tuning offset {:.1} cents from A440", tuning_cents));
    }
    sink.advance(1)?;

    ctx.compute_chromas(&frontend.medium, &frontend.large, config);
    sink.advance(1)?;

    // First chord pass runs without a key; the diatonic bonus only applies
    // once beat pooling re-matches below
    let medium_reads = match_frames(&frontend.medium, ctx.medium_chromas(), ctx.templates(), config);
    let large_reads = match_frames(&frontend.large, ctx.large_chromas(), ctx.templates(), config);
    sink.advance(1)?;

    let mut chord_frames = smoothing::merge_window_passes(&medium_reads, &large_reads);
    // Provisional cleanup so key voting and beat phase see stable labels
    smoothing::smooth_chord_frames(&mut chord_frames, config);

    let rms: Vec<f32> = frontend.medium.iter().map(|f| f.rms).collect();
    let chord_roots: Vec<PitchClass> = chord_frames
        .iter()
        .filter_map(|f| f.chord().map(|c| c.root))
        .collect();
    let key = tonal::estimate_key(ctx.medium_chromas(), &rms, &chord_roots, config);

    let sounding = ctx.medium_chromas().iter().filter(|c| !c.is_zero()).count();
    if sounding == 0 {
        metadata.raise(AnalysisFlag::WeakTonality);
        metadata
            .warnings
            .push("no tonal energy; key defaulted".to_string());
    }
    sink.advance(1)?;

    // Rhythm: onsets, tempo, beat phase
    sink.begin(Stage::Rhythm, 3);
    let hop_seconds = frontend.hop_seconds();
    let onsets = rhythm::detect_onsets(&frontend.onset_strength, hop_seconds, config);
    metadata.onset_count = onsets.len();
    if onsets.len() < config.min_onsets_for_voting {
        metadata.raise(AnalysisFlag::SparseOnsets);
        metadata.warnings.push("tempo fallback used".to_string());
    }
    sink.advance(1)?;

    let bpm = rhythm::estimate_tempo(&onsets, &frontend.medium, hop_seconds, config);
    sink.advance(1)?;

    let transitions = rhythm::chord_transitions(&chord_frames, config);
    let beat_phase = rhythm::estimate_beat_phase(&transitions, bpm, config);
    let tempo = TempoEstimate { bpm, beat_phase };
    sink.advance(1)?;

    // Smoothing: beat-pooled re-match, continuity passes, diatonic snapping
    sink.begin(Stage::Smoothing, 2);
    smoothing::pool_by_beat(
        &mut chord_frames,
        ctx.medium_chromas(),
        &tempo,
        Some(&key),
        ctx.templates(),
        config,
    );
    sink.advance(1)?;

    smoothing::smooth_chord_frames(&mut chord_frames, config);
    tonal::snap_to_key(&mut chord_frames, &key, config);
    sink.advance(1)?;

    let voiced = chord_frames.iter().filter(|f| f.hypothesis.is_some()).count();
    if (voiced as f32) < LOW_VOICING_FRACTION * chord_frames.len() as f32 {
        metadata.raise(AnalysisFlag::LowVoicing);
    }

    // Notation: bars and slots
    sink.begin(Stage::Notation, 1);
    let bars = notation::layout_bars(&chord_frames, &tempo, duration_seconds, config);
    sink.advance(1)?;

    metadata.frames_analyzed = frontend.medium.len();
    metadata.processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
    log::debug!(
        "Analysis finished in {:.1} ms: key {}, {:.0} BPM, {} bars",
        metadata.processing_time_ms,
        key.name(),
        tempo.bpm,
        bars.len()
    );

    Ok(AnalysisResult {
        chord_frames,
        key,
        tempo,
        bars,
        metadata,
    })
}

/// Transpose a finished result by `semitones`
///
/// Rotates every chord root, slash bass, and the key tonic; times,
/// confidences, tempo, and bar geometry are untouched. Transposing by `n`
/// and then by `-n` restores the original result.
pub fn transpose_result(result: &AnalysisResult, semitones: i32) -> AnalysisResult {
    let mut out = result.clone();
    for frame in &mut out.chord_frames {
        if let Some(hypothesis) = frame.hypothesis.as_mut() {
            hypothesis.chord = hypothesis.chord.transposed(semitones);
        }
    }
    for bar in &mut out.bars {
        for slot in &mut bar.slots {
            if let Some(hypothesis) = slot.hypothesis.as_mut() {
                hypothesis.chord = hypothesis.chord.transposed(semitones);
            }
        }
    }
    out.key = out.key.transposed(semitones);
    out
}

/// Pair frames with their chroma vectors and run template matching
fn match_frames(
    frames: &[Frame],
    chromas: &[ChromaVector],
    templates: &[ChordTemplate],
    config: &AnalysisConfig,
) -> Vec<ChordFrame> {
    frames
        .iter()
        .zip(chromas.iter())
        .map(|(frame, chroma)| ChordFrame {
            time: frame.time,
            hypothesis: tonal::match_chroma(chroma, templates, None, config),
        })
        .collect()
}
