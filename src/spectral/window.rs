//! Hann windowing and frame slicing

/// Generate a symmetric Hann window
pub fn hann_window(size: usize) -> Vec<f32> {
    if size <= 1 {
        return vec![1.0; size];
    }
    let denom = (size - 1) as f32;
    (0..size)
        .map(|n| {
            let phase = 2.0 * std::f32::consts::PI * n as f32 / denom;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

/// Frame start offsets for a buffer
///
/// Starts advance by `hop` while they remain inside the buffer, so the final
/// frames run past the end and are zero-padded by [`windowed_frame`]. A buffer
/// shorter than one window yields no frames at all. Because the count depends
/// only on the buffer length and hop, sequences framed with different window
/// sizes stay index-aligned.
pub fn frame_starts(len: usize, window_size: usize, hop: usize) -> Vec<usize> {
    if len < window_size || hop == 0 {
        return Vec::new();
    }
    (0..len).step_by(hop).collect()
}

/// Slice one frame, apply the window, zero-pad past the buffer end
pub fn windowed_frame(samples: &[f32], start: usize, window: &[f32]) -> Vec<f32> {
    let mut frame = vec![0.0f32; window.len()];
    if start < samples.len() {
        let end = (start + window.len()).min(samples.len());
        for (out, (&sample, &coeff)) in frame
            .iter_mut()
            .zip(samples[start..end].iter().zip(window.iter()))
        {
            *out = sample * coeff;
        }
    }
    frame
}

/// RMS of the raw (un-windowed) samples under one frame
///
/// The divisor is the full window size, so zero-padded tails read quieter in
/// proportion to their missing samples.
pub fn segment_rms(samples: &[f32], start: usize, window_size: usize) -> f32 {
    if start >= samples.len() || window_size == 0 {
        return 0.0;
    }
    let end = (start + window_size).min(samples.len());
    let sum_sq: f32 = samples[start..end].iter().map(|&s| s * s).sum();
    (sum_sq / window_size as f32).sqrt()
}
