//! Channel mixing (interleaved multi-channel to mono)

use crate::error::AnalysisError;

/// Down-mix interleaved PCM to mono by averaging channels
///
/// Stereo input becomes `(L + R) * 0.5`; higher channel counts average all
/// channels equally. Mono input is copied through unchanged.
///
/// # Arguments
///
/// * `samples` - Interleaved f32 samples
/// * `channels` - Channel count (frames = samples.len() / channels)
///
/// # Returns
///
/// Mono samples, one per frame
///
/// # Errors
///
/// `InvalidInput` when `channels` is zero or the sample count is not a
/// multiple of the channel count.
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Result<Vec<f32>, AnalysisError> {
    if channels == 0 {
        return Err(AnalysisError::InvalidInput(
            "channel count must be at least 1".to_string(),
        ));
    }
    let channels = channels as usize;
    if samples.len() % channels != 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "sample count {} is not a multiple of channel count {}",
            samples.len(),
            channels
        )));
    }

    if channels == 1 {
        return Ok(samples.to_vec());
    }

    log::debug!(
        "Down-mixing {} frames from {} channels to mono",
        samples.len() / channels,
        channels
    );

    let scale = 1.0 / channels as f32;
    let mono = samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect();

    Ok(mono)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_passthrough() {
        let samples = vec![0.1, -0.2, 0.3];
        let mono = downmix_to_mono(&samples, 1).unwrap();
        assert_eq!(mono, samples);
    }

    #[test]
    fn test_stereo_average() {
        let samples = vec![0.2, 0.4, -1.0, 1.0, 0.0, 0.6];
        let mono = downmix_to_mono(&samples, 2).unwrap();
        assert_eq!(mono.len(), 3);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!(mono[1].abs() < 1e-6);
        assert!((mono[2] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_quad_average() {
        let samples = vec![1.0, 1.0, 1.0, -1.0];
        let mono = downmix_to_mono(&samples, 4).unwrap();
        assert_eq!(mono.len(), 1);
        assert!((mono[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_channels_rejected() {
        let result = downmix_to_mono(&[0.0, 0.0], 0);
        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_ragged_interleave_rejected() {
        let result = downmix_to_mono(&[0.0, 0.0, 0.0], 2);
        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_input_ok() {
        let mono = downmix_to_mono(&[], 2).unwrap();
        assert!(mono.is_empty());
    }
}
