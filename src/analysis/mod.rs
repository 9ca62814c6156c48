//! Result types and per-run state
//!
//! The public shape of an analysis ([`AnalysisResult`] and its parts), the
//! diagnostics attached to it, and the memoized working context threaded
//! through the pipeline stages.

pub mod context;
pub mod metadata;
pub mod result;

pub use context::RunContext;
pub use metadata::{AnalysisFlag, AnalysisMetadata};
pub use result::{AnalysisResult, ChordFrame, ChordHypothesis, KeyEstimate, Mode, TempoEstimate};
