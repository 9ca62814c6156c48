//! Analyze a synthesized clip and print the resulting chord chart
//!
//! Run with `RUST_LOG=debug` to watch the pipeline stages.

use tabscribe::{analyze, AnalysisConfig};

/// Eight seconds of A-D-E-A built from sine partials, two seconds per chord
fn synthesize_clip(sample_rate: u32) -> Vec<f32> {
    let chords: [&[f32]; 4] = [
        &[110.0, 220.0, 277.18, 329.63],
        &[146.83, 220.0, 293.66, 369.99],
        &[164.81, 246.94, 329.63, 415.30],
        &[110.0, 220.0, 277.18, 329.63],
    ];
    let seconds_per_chord = 2.0;
    let n = (chords.len() as f32 * seconds_per_chord * sample_rate as f32) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let chord = chords[(t / seconds_per_chord) as usize % chords.len()];
            chord
                .iter()
                .map(|&f| (2.0 * std::f32::consts::PI * f * t).sin())
                .sum::<f32>()
                / chord.len() as f32
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let sample_rate = 48000;
    let samples = synthesize_clip(sample_rate);
    let config = AnalysisConfig::default();

    let result = analyze(&samples, 1, sample_rate, &config)?;

    println!("Key:    {}", result.key.name());
    println!(
        "Tempo:  {:.1} BPM (phase {:+.3}s)",
        result.tempo.bpm, result.tempo.beat_phase
    );
    println!("Chords: {:?}", result.chord_vocabulary());
    for bar in &result.bars {
        let slots: Vec<String> = bar
            .slots
            .iter()
            .map(|slot| match &slot.hypothesis {
                Some(h) => format!("{} x{:.0}", h.chord.name(), slot.beat_len),
                None => format!("-- x{:.0}", slot.beat_len),
            })
            .collect();
        println!("  bar {:>2} | {}", bar.index, slots.join(" | "));
    }
    println!(
        "Analyzed {} frames in {:.1} ms",
        result.metadata.frames_analyzed, result.metadata.processing_time_ms
    );

    Ok(())
}
