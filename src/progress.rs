//! Coarse-grained progress reporting and cooperative cancellation
//!
//! The pipeline is one blocking call. Callers that need UI feedback or an
//! abort button register an [`AnalysisObserver`]; it is invoked at block
//! boundaries (every `progress_block_frames` frames in the frontend, once per
//! later stage). Cancellation is honored only at those yield points; an
//! in-flight FFT batch or smoothing pass always runs to completion first.

/// Pipeline stage reported in progress updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Windowing, FFT, HPSS, onset-strength extraction
    Frontend,
    /// Tuning, chroma, chord matching, key estimation
    Tonal,
    /// Onset picking, tempo, beat phase
    Rhythm,
    /// Ensemble merging and smoothing passes
    Smoothing,
    /// Bar/slot segmentation
    Notation,
}

/// A coarse progress report
#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    /// Stage currently executing
    pub stage: Stage,
    /// Work units completed within the stage (frames for the frontend)
    pub done: usize,
    /// Total work units in the stage; 0 when unknown
    pub total: usize,
}

/// Observer verdict returned from a progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going
    Continue,
    /// Abort at this yield point with `AnalysisError::Cancelled`
    Cancel,
}

/// Receives progress updates and may request cancellation
pub trait AnalysisObserver {
    /// Called at yield points; return [`Flow::Cancel`] to abort the run
    fn on_progress(&mut self, update: ProgressUpdate) -> Flow;
}

/// Observer that ignores updates and never cancels
#[derive(Debug, Default)]
pub struct NoopObserver;

/// Internal adapter that tracks per-stage totals and turns a `Cancel` verdict
/// into `AnalysisError::Cancelled`
pub(crate) struct ProgressSink<'a> {
    observer: &'a mut dyn AnalysisObserver,
    stage: Stage,
    done: usize,
    total: usize,
}

impl<'a> ProgressSink<'a> {
    pub(crate) fn new(observer: &'a mut dyn AnalysisObserver) -> Self {
        Self {
            observer,
            stage: Stage::Frontend,
            done: 0,
            total: 0,
        }
    }

    /// Enter a stage, resetting the work counter
    pub(crate) fn begin(&mut self, stage: Stage, total: usize) {
        self.stage = stage;
        self.done = 0;
        self.total = total;
    }

    /// Record completed work units and poll the observer
    pub(crate) fn advance(&mut self, units: usize) -> Result<(), crate::error::AnalysisError> {
        self.done += units;
        let update = ProgressUpdate {
            stage: self.stage,
            done: self.done,
            total: self.total,
        };
        match self.observer.on_progress(update) {
            Flow::Continue => Ok(()),
            Flow::Cancel => Err(crate::error::AnalysisError::Cancelled),
        }
    }
}

impl AnalysisObserver for NoopObserver {
    fn on_progress(&mut self, _update: ProgressUpdate) -> Flow {
        Flow::Continue
    }
}

impl<F> AnalysisObserver for F
where
    F: FnMut(ProgressUpdate) -> Flow,
{
    fn on_progress(&mut self, update: ProgressUpdate) -> Flow {
        self(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_observer_continues() {
        let mut obs = NoopObserver;
        let update = ProgressUpdate {
            stage: Stage::Frontend,
            done: 60,
            total: 600,
        };
        assert_eq!(obs.on_progress(update), Flow::Continue);
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = 0usize;
        {
            let mut obs = |update: ProgressUpdate| {
                seen = update.done;
                if update.done >= 120 {
                    Flow::Cancel
                } else {
                    Flow::Continue
                }
            };
            let mk = |done| ProgressUpdate {
                stage: Stage::Frontend,
                done,
                total: 600,
            };
            assert_eq!(obs.on_progress(mk(60)), Flow::Continue);
            assert_eq!(obs.on_progress(mk(120)), Flow::Cancel);
        }
        assert_eq!(seen, 120);
    }
}
