//! Performance counters for reposition batches.
//!
//! # Responsibility
//! - Accumulate count/total/max timing of every executed batch.
//! - Count scheduling requests absorbed into an already pending batch.
//!
//! # Invariants
//! - Counters only grow until `reset`.
//! - Throttle hits never touch timing statistics.

use crate::perf::now_epoch_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Point-in-time copy of the monitor counters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub update_count: u64,
    pub total_duration_ms: f64,
    pub average_duration_ms: f64,
    pub max_duration_ms: f64,
    pub throttle_hits: u64,
    /// Unix epoch milliseconds of the latest recorded batch.
    pub last_update_at_ms: Option<i64>,
    /// Batches per second derived from the last two record timestamps.
    pub update_frequency_hz: f64,
}

#[derive(Debug, Default)]
pub struct PerformanceMonitor {
    update_count: u64,
    total_duration_ms: f64,
    max_duration_ms: f64,
    throttle_hits: u64,
    last_update_at_ms: Option<i64>,
    update_frequency_hz: f64,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one executed batch at the current wall clock.
    pub fn record(&mut self, duration: Duration) {
        self.record_at(duration, now_epoch_ms());
    }

    /// Records one executed batch finished at `at_ms`.
    ///
    /// Frequency is only refreshed when time moved forward; two batches in
    /// the same millisecond keep the previous value.
    pub fn record_at(&mut self, duration: Duration, at_ms: i64) {
        let duration_ms = duration.as_secs_f64() * 1000.0;
        self.update_count += 1;
        self.total_duration_ms += duration_ms;
        if duration_ms > self.max_duration_ms {
            self.max_duration_ms = duration_ms;
        }

        if let Some(previous_ms) = self.last_update_at_ms {
            let delta_ms = at_ms - previous_ms;
            if delta_ms > 0 {
                self.update_frequency_hz = 1000.0 / delta_ms as f64;
            }
        }
        self.last_update_at_ms = Some(at_ms);
    }

    pub fn record_throttle_hit(&mut self) {
        self.throttle_hits += 1;
    }

    pub fn snapshot(&self) -> PerformanceSnapshot {
        let average_duration_ms = if self.update_count == 0 {
            0.0
        } else {
            self.total_duration_ms / self.update_count as f64
        };
        PerformanceSnapshot {
            update_count: self.update_count,
            total_duration_ms: self.total_duration_ms,
            average_duration_ms,
            max_duration_ms: self.max_duration_ms,
            throttle_hits: self.throttle_hits,
            last_update_at_ms: self.last_update_at_ms,
            update_frequency_hz: self.update_frequency_hz,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
