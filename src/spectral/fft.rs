//! FFT magnitude spectra via `rustfft`

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Reusable forward-FFT plan for one transform size
///
/// The plan is built once per window size and shared across the frame loop;
/// `rustfft` plans are `Send + Sync`, so parallel frame batches can process
/// against the same plan.
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    size: usize,
}

impl FftProcessor {
    /// Plan a forward FFT of `size` points (power of two)
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self { fft, size }
    }

    /// Transform size in samples
    pub fn size(&self) -> usize {
        self.size
    }

    /// Width of one frequency bin in Hz
    pub fn bin_hz(&self, sample_rate: u32) -> f32 {
        sample_rate as f32 / self.size as f32
    }

    /// Magnitude spectrum of one windowed frame
    ///
    /// Returns the first `size/2` bins, scaled by `2/size` so a unit-amplitude
    /// sine landing on a bin center reads near 1.0 before window gain.
    pub fn magnitudes(&self, frame: &[f32]) -> Vec<f32> {
        debug_assert_eq!(frame.len(), self.size);
        let mut buffer: Vec<Complex<f32>> =
            frame.iter().map(|&x| Complex::new(x, 0.0)).collect();
        self.fft.process(&mut buffer);
        let scale = 2.0 / self.size as f32;
        buffer[..self.size / 2]
            .iter()
            .map(|c| c.norm() * scale)
            .collect()
    }
}
