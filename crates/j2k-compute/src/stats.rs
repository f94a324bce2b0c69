//! Operation statistics.
//!
//! [`StatsRecorder`] is the single mutation point for the counters: every
//! update takes one lock, so concurrent tiles never lose increments.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::backend::EffectiveBackend;

/// Counters accumulated since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OperationStats {
    /// Operations recorded.
    pub total_operations: u64,
    /// Operations that ran on the CPU.
    pub cpu_operations: u64,
    /// Operations that ran on the GPU.
    pub gpu_operations: u64,
    /// Summed wall time.
    pub total_processing_time: Duration,
    /// Summed samples or coefficients processed.
    pub total_samples_processed: u64,
}

impl OperationStats {
    /// Samples per second; 0 when nothing was timed.
    pub fn throughput(&self) -> f64 {
        let secs = self.total_processing_time.as_secs_f64();
        if secs > 0.0 {
            self.total_samples_processed as f64 / secs
        } else {
            0.0
        }
    }

    /// Fraction of operations that ran on the GPU, in `0.0..=1.0`.
    pub fn gpu_utilization(&self) -> f64 {
        if self.total_operations == 0 {
            0.0
        } else {
            self.gpu_operations as f64 / self.total_operations as f64
        }
    }
}

/// Thread-safe statistics sink.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    inner: Mutex<OperationStats>,
}

impl StatsRecorder {
    /// Zeroed recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished operation.
    pub fn record(&self, backend: EffectiveBackend, samples: usize, elapsed: Duration) {
        let mut s = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        s.total_operations += 1;
        match backend {
            EffectiveBackend::Cpu => s.cpu_operations += 1,
            EffectiveBackend::Gpu => s.gpu_operations += 1,
        }
        s.total_processing_time += elapsed;
        s.total_samples_processed += samples as u64;
    }

    /// Copy of the current counters.
    pub fn snapshot(&self) -> OperationStats {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = OperationStats::default();
        debug!("statistics reset");
    }
}
