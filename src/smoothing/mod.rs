//! Ensemble merging and temporal smoothing
//!
//! Raw per-frame chord readings are noisy: the two window passes disagree at
//! chord boundaries, strums splatter transients across beats, and silence
//! leaves holes. This stage reconciles the window passes, re-reads each beat
//! from pooled chroma, and then irons out isolated flickers. The order
//! matters: pooling needs the beat grid, so the pipeline runs a provisional
//! smoothing round before tempo estimation and the full round after.

pub mod beat_pool;
pub mod ensemble;
pub mod passes;

pub use beat_pool::pool_by_beat;
pub use ensemble::merge_window_passes;
pub use passes::smooth_chord_frames;
