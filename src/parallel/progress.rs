use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use parking_lot::Mutex;
use tracing::info;

/// Receives import progress and carries the cancellation flag
pub trait ProgressHandler: Send + Sync {
    fn set_indeterminate(&self, indeterminate: bool);
    fn set_max_progress(&self, max: u64);
    fn set_progress(&self, value: u64);
    fn increment_progress(&self);
    fn append_report(&self, report: &str);
    fn is_cancelled(&self) -> bool;
}

/// Ignores progress and never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressHandler for NoProgress {
    fn set_indeterminate(&self, _indeterminate: bool) {}
    fn set_max_progress(&self, _max: u64) {}
    fn set_progress(&self, _value: u64) {}
    fn increment_progress(&self) {}
    fn append_report(&self, _report: &str) {}
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Atomic progress counters, shareable with a watcher thread
#[derive(Debug, Default)]
pub struct ProgressTracker {
    indeterminate: AtomicBool,
    max: AtomicU64,
    value: AtomicU64,
    cancelled: AtomicBool,
    reports: Mutex<Vec<String>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn progress(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn max_progress(&self) -> u64 {
        self.max.load(Ordering::Relaxed)
    }

    pub fn is_indeterminate(&self) -> bool {
        self.indeterminate.load(Ordering::Relaxed)
    }

    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().clone()
    }
}

impl ProgressHandler for ProgressTracker {
    fn set_indeterminate(&self, indeterminate: bool) {
        self.indeterminate.store(indeterminate, Ordering::Relaxed);
    }

    fn set_max_progress(&self, max: u64) {
        self.max.store(max, Ordering::Relaxed);
    }

    fn set_progress(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
    }

    fn increment_progress(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    fn append_report(&self, report: &str) {
        info!("{}", report);
        self.reports.lock().push(report.to_string());
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Empirical first-import estimate; only calibrated for tag sizes 3 and 4
pub fn expected_import_time(initial_tag_size: usize, target_count: usize, workers: usize) -> Option<Duration> {
    // One core goes to overhead
    let cores = workers.saturating_sub(1).max(1) as u64;
    let targets = target_count as u64;
    let millis = match initial_tag_size {
        3 => targets * 15 / cores,
        4 => targets * 200 / cores,
        _ => return None,
    };
    Some(Duration::from_millis(millis))
}

pub fn format_expected_import_time(expected: Duration) -> String {
    let seconds = expected.as_secs();
    let amount = if seconds < 120 {
        format!("{} seconds", seconds)
    } else if seconds / 60 < 120 {
        format!("{} minutes", seconds / 60)
    } else {
        format!("{} hours", seconds / 3600)
    };
    format!("Expected import time: {}. (First time only.)", amount)
}
