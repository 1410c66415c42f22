// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Running Stats Tracker
// ─────────────────────────────────────────────────────────────────────
//! Process-lifetime counters shared by every evaluation of a judge.
//!
//! All updates go through one `parking_lot::Mutex`, so the running-mean
//! read-modify-write is serialised even when several threads evaluate
//! concurrently. Share the tracker between judges with `Arc`.

use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use judge_types::{Device, StatsSnapshot};

/// Raw counters behind the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    pub evaluations: u64,
    /// Seconds.
    pub total_time: f64,
    pub avg_score: f64,
}

pub struct RunningStatsTracker {
    model_name: String,
    device: Device,
    inner: Mutex<RunningStats>,
}

impl RunningStatsTracker {
    pub fn new(model_name: impl Into<String>, device: Device) -> Self {
        Self {
            model_name: model_name.into(),
            device,
            inner: Mutex::new(RunningStats::default()),
        }
    }

    /// Fold one completed evaluation into the counters.
    pub fn record(&self, elapsed: Duration, score: f64) {
        let mut stats = self.inner.lock();
        stats.evaluations += 1;
        stats.total_time += elapsed.as_secs_f64();
        let n = stats.evaluations as f64;
        stats.avg_score = (stats.avg_score * (n - 1.0) + score) / n;
    }

    pub fn counters(&self) -> RunningStats {
        *self.inner.lock()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let stats = self.counters();
        let avg_processing_time = if stats.evaluations == 0 {
            0.0
        } else {
            stats.total_time / stats.evaluations as f64
        };
        StatsSnapshot {
            evaluations: stats.evaluations,
            total_time: stats.total_time,
            avg_score: stats.avg_score,
            avg_processing_time,
            model_name: self.model_name.clone(),
            device: self.device,
        }
    }

    pub fn reset(&self) {
        *self.inner.lock() = RunningStats::default();
    }
}
