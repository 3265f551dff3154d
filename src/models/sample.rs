//! Latency samples and the shared accumulator written by sampler workers

use crate::types::InvocationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

/// One observation of a single task invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Wall-clock time taken immediately before the task was invoked
    pub start_time: DateTime<Utc>,
    /// Elapsed time until the task returned, in milliseconds
    pub duration_ms: u64,
    /// How the invocation ended
    pub status: InvocationStatus,
}

impl Sample {
    pub fn new(start_time: DateTime<Utc>, duration: Duration, status: InvocationStatus) -> Self {
        Self {
            start_time,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            status,
        }
    }

    pub fn success(start_time: DateTime<Utc>, duration: Duration) -> Self {
        Self::new(start_time, duration, InvocationStatus::Success)
    }

    pub fn failed(start_time: DateTime<Utc>, duration: Duration) -> Self {
        Self::new(start_time, duration, InvocationStatus::Failed)
    }

    pub fn is_success(&self) -> bool {
        self.status == InvocationStatus::Success
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Thread-safe, order-irrelevant accumulator of samples.
///
/// Workers only ever append; the harness reads once after the pool drains
/// or the deadline passes.
#[derive(Debug, Default)]
pub struct SampleSet {
    samples: Mutex<Vec<Sample>>,
}

impl SampleSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Append one sample
    pub fn push(&self, sample: Sample) {
        // A poisoned lock still holds every sample pushed before the panic
        let mut samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        samples.push(sample);
    }

    /// Copy of the samples accumulated so far
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Everything a sampler run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Samples recorded before the pool drained or the deadline passed
    pub samples: Vec<Sample>,
    /// Number of invocations submitted
    pub submitted: u32,
    /// Invocations that had not completed when the report was taken
    pub incomplete: u32,
    /// Worker pool size used for the run
    pub concurrency: u32,
    /// Wall-clock time from submission to report
    pub elapsed: Duration,
    /// Whether the deadline elapsed before the pool drained
    pub timed_out: bool,
}

impl RunReport {
    pub fn new(samples: Vec<Sample>, submitted: u32, concurrency: u32, elapsed: Duration, timed_out: bool) -> Self {
        let completed = u32::try_from(samples.len()).unwrap_or(u32::MAX);
        Self {
            samples,
            submitted,
            incomplete: submitted.saturating_sub(completed),
            concurrency,
            elapsed,
            timed_out,
        }
    }

    /// Number of invocations that produced a sample
    pub fn completed(&self) -> usize {
        self.samples.len()
    }

    /// A full run recorded one sample per submitted invocation
    pub fn is_complete(&self) -> bool {
        self.incomplete == 0
    }

    pub fn success_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.completed() - self.success_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_sample_duration_in_millis() {
        let sample = Sample::success(Utc::now(), Duration::from_micros(5_900));
        assert_eq!(sample.duration_ms, 5);
        assert!(sample.is_success());
        assert_eq!(sample.duration(), Duration::from_millis(5));
    }

    #[test]
    fn test_sample_set_concurrent_push() {
        let set = Arc::new(SampleSet::with_capacity(8_000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let set = Arc::clone(&set);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        set.push(Sample::success(Utc::now(), Duration::ZERO));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(set.snapshot().len(), 8_000);
    }

    #[test]
    fn test_report_counts() {
        let now = Utc::now();
        let samples = vec![
            Sample::success(now, Duration::from_millis(3)),
            Sample::failed(now, Duration::from_millis(4)),
            Sample::new(now, Duration::from_millis(9), InvocationStatus::Timeout),
        ];

        let report = RunReport::new(samples, 5, 2, Duration::from_millis(20), true);
        assert_eq!(report.completed(), 3);
        assert_eq!(report.incomplete, 2);
        assert!(!report.is_complete());
        assert_eq!(report.success_count(), 1);
        assert_eq!(report.failed_count(), 2);
    }

    #[test]
    fn test_full_report_is_complete() {
        let samples = vec![Sample::success(Utc::now(), Duration::ZERO); 4];
        let report = RunReport::new(samples, 4, 4, Duration::ZERO, false);
        assert!(report.is_complete());
        assert_eq!(report.incomplete, 0);
    }
}
