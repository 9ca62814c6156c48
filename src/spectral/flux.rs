//! Band-limited spectral flux (onset strength)
//!
//! Onset strength is the sum of positive frame-to-frame magnitude increases
//! within a frequency band. The rhythm stage combines a low band taken from
//! the large-window spectrogram (kick/bass movement) with a mid band from the
//! medium-window spectrogram (snare/strum energy).

/// Positive spectral flux restricted to `[low_hz, high_hz)`
///
/// Output has one value per frame; the first frame has no predecessor and
/// reads 0. The band is clipped to the spectrogram's bin range.
pub fn band_flux(
    spectrogram: &[Vec<f32>],
    sample_rate: u32,
    window_size: usize,
    low_hz: f32,
    high_hz: f32,
) -> Vec<f32> {
    if spectrogram.is_empty() {
        return Vec::new();
    }
    let n_bins = spectrogram[0].len();
    let bin_hz = sample_rate as f32 / window_size as f32;
    let lo = ((low_hz / bin_hz).ceil() as usize).min(n_bins);
    let hi = ((high_hz / bin_hz).floor() as usize).min(n_bins);
    if lo >= hi {
        return vec![0.0; spectrogram.len()];
    }

    let mut flux = Vec::with_capacity(spectrogram.len());
    flux.push(0.0);
    for i in 1..spectrogram.len() {
        let prev = &spectrogram[i - 1][lo..hi];
        let curr = &spectrogram[i][lo..hi];
        let rise: f32 = prev
            .iter()
            .zip(curr.iter())
            .map(|(&p, &c)| (c - p).max(0.0))
            .sum();
        flux.push(rise);
    }
    flux
}

/// Combine low- and mid-band flux curves into one onset-strength curve
///
/// `combined[i] = low_weight * low[i] + mid[i]`. The curves may differ in
/// length (the large-window sequence is absent on short buffers); missing
/// values count as zero and the output follows the longer curve.
pub fn combine_bands(low: &[f32], mid: &[f32], low_weight: f32) -> Vec<f32> {
    let len = low.len().max(mid.len());
    (0..len)
        .map(|i| {
            let l = low.get(i).copied().unwrap_or(0.0);
            let m = mid.get(i).copied().unwrap_or(0.0);
            low_weight * l + m
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_flux_detects_rise() {
        // 8 bins at 16 Hz each (sample_rate 256, window 16): band covers bins 2..6
        let mut spec = vec![vec![0.0f32; 8]; 4];
        spec[2][3] = 1.0; // rise inside the band at frame 2
        spec[3][3] = 1.0; // sustained: no further rise
        let flux = band_flux(&spec, 256, 16, 32.0, 96.0);
        assert_eq!(flux.len(), 4);
        assert_eq!(flux[0], 0.0);
        assert_eq!(flux[1], 0.0);
        assert!((flux[2] - 1.0).abs() < 1e-6);
        assert_eq!(flux[3], 0.0);
    }

    #[test]
    fn test_band_flux_ignores_out_of_band() {
        let mut spec = vec![vec![0.0f32; 8]; 3];
        spec[1][7] = 1.0; // 112 Hz, above the 96 Hz edge
        let flux = band_flux(&spec, 256, 16, 32.0, 96.0);
        assert!(flux.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_band_flux_ignores_decay() {
        let mut spec = vec![vec![0.0f32; 8]; 3];
        spec[0][3] = 1.0;
        let flux = band_flux(&spec, 256, 16, 32.0, 96.0);
        assert!(flux.iter().all(|&f| f == 0.0), "Decay is not an onset");
    }

    #[test]
    fn test_band_flux_empty_band() {
        let spec = vec![vec![1.0f32; 8]; 3];
        let flux = band_flux(&spec, 256, 16, 200.0, 100.0);
        assert_eq!(flux, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_combine_bands_weighting() {
        let low = vec![1.0, 0.0];
        let mid = vec![0.5, 0.5, 2.0];
        let combined = combine_bands(&low, &mid, 1.5);
        assert_eq!(combined.len(), 3);
        assert!((combined[0] - 2.0).abs() < 1e-6);
        assert!((combined[1] - 0.5).abs() < 1e-6);
        assert!((combined[2] - 2.0).abs() < 1e-6);
    }
}
