//! Audio preprocessing
//!
//! Prepares caller-supplied PCM for the spectral frontend: shape validation
//! and down-mix of interleaved multi-channel audio to a single mono buffer.

pub mod channel_mixer;

pub use channel_mixer::downmix_to_mono;
