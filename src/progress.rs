// Coarse progress reporting for long analysis runs.
//
// The pipeline reports a fixed sequence of phases with a monotonically
// increasing percentage. Sinks only observe; they never influence results.

use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Cleaning,
    Vectorizing,
    Clustering,
    Summarizing,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Cleaning,
        Phase::Vectorizing,
        Phase::Clustering,
        Phase::Summarizing,
    ];

    /// Percentage complete once this phase has finished.
    pub fn percent(self) -> u8 {
        match self {
            Phase::Cleaning => 15,
            Phase::Vectorizing => 35,
            Phase::Clustering => 75,
            Phase::Summarizing => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Cleaning => "Cleaning text",
            Phase::Vectorizing => "Vectorizing",
            Phase::Clustering => "Topic modeling",
            Phase::Summarizing => "Summarizing",
        }
    }
}

/// Receives phase completions from the pipeline.
pub trait ProgressSink {
    fn phase_done(&self, phase: Phase);
}

/// Sink that discards all progress. Used by library callers and tests.
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn phase_done(&self, _phase: Phase) {}
}

/// Terminal progress bar driven by phase completions.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  Analysis [{bar:30}] {pos:>3}% {msg}")
                .unwrap(),
        );
        bar.set_message(Phase::Cleaning.label());
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn phase_done(&self, phase: Phase) {
        self.bar.set_position(phase.percent() as u64);
        let next = Phase::ALL.iter().find(|p| **p > phase);
        self.bar
            .set_message(next.map(|p| p.label()).unwrap_or("Done"));
    }
}
