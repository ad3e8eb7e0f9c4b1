use crate::fsds::loader::LoadStats;
use crate::fsds::quarters::QuarterLocation;
use crate::fsds::table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::time::Duration;

/// A unit of work within one quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ResolveFilings,
    Load(Table),
    ResolveTagVersions,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::ResolveFilings => write!(f, "Resolving filings"),
            Phase::Load(table) => write!(f, "Populating table {}", table),
            Phase::ResolveTagVersions => write!(f, "Resolving tag versions"),
        }
    }
}

/// Receives phase notifications while a run progresses.
pub trait Progress {
    fn phase_started(&self, quarter: &QuarterLocation, phase: Phase);
    fn rows_scanned(&self, rows: u64);
    fn phase_finished(&self, quarter: &QuarterLocation, phase: Phase, stats: &LoadStats);
}

/// Discards every notification.
pub struct NoProgress;

impl Progress for NoProgress {
    fn phase_started(&self, _quarter: &QuarterLocation, _phase: Phase) {}
    fn rows_scanned(&self, _rows: u64) {}
    fn phase_finished(&self, _quarter: &QuarterLocation, _phase: Phase, _stats: &LoadStats) {}
}

/// Console spinner showing the current quarter, phase and scanned row count.
#[derive(Clone)]
pub struct ProgressTracker {
    progress_bar: ProgressBar,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg:<40} {pos:>12} rows")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { progress_bar: pb }
    }

    pub fn finish(&self) {
        self.progress_bar.finish_and_clear();
    }
}

impl Progress for ProgressTracker {
    fn phase_started(&self, quarter: &QuarterLocation, phase: Phase) {
        self.progress_bar.reset();
        self.progress_bar.set_message(format!("[{}] {}", quarter, phase));
    }

    fn rows_scanned(&self, rows: u64) {
        self.progress_bar.inc(rows);
    }

    fn phase_finished(&self, quarter: &QuarterLocation, phase: Phase, stats: &LoadStats) {
        let line = match phase {
            Phase::Load(_) => format!(
                "[{}] {}: Complete! ({} matched, {} inserted, {} ignored)",
                quarter,
                phase,
                stats.matched,
                stats.inserted,
                stats.ignored()
            ),
            _ => format!("[{}] {}: Complete! ({} matched)", quarter, phase, stats.matched),
        };
        self.progress_bar.println(line);
    }
}
