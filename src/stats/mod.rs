//! Latency statistics for a completed run

use crate::models::{RunReport, Sample};
use crate::types::InvocationStatus;
use serde::{Deserialize, Serialize};

/// Percentiles reported for every run
pub const REPORTED_PERCENTILES: [f64; 4] = [50.0, 90.0, 95.0, 99.0];

/// Summary of the samples of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStatistics {
    /// Samples recorded
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Failures classified as timeouts (also counted in `failed`)
    pub timed_out: usize,
    /// Invocations that never produced a sample before the deadline
    pub incomplete: u32,
    /// Percentage of recorded samples that succeeded
    pub success_rate: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Samples beyond 1.5 IQR of the quartiles
    pub outliers: usize,
    /// Recorded samples per second of run time
    pub throughput_per_sec: f64,
}

impl LatencyStatistics {
    /// Summarize a run report; an empty report yields all zeros
    pub fn from_report(report: &RunReport) -> Self {
        let mut stats = Self::from_samples(&report.samples);
        stats.incomplete = report.incomplete;

        let elapsed = report.elapsed.as_secs_f64();
        if elapsed > 0.0 {
            stats.throughput_per_sec = stats.total as f64 / elapsed;
        }

        stats
    }

    /// Summarize samples without run context
    pub fn from_samples(samples: &[Sample]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let total = samples.len();
        let successful = samples.iter().filter(|s| s.is_success()).count();
        let timed_out = samples
            .iter()
            .filter(|s| s.status == InvocationStatus::Timeout)
            .count();

        let mut durations: Vec<f64> = samples.iter().map(|s| s.duration_ms as f64).collect();
        durations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = durations.iter().sum::<f64>() / total as f64;

        Self {
            total,
            successful,
            failed: total - successful,
            timed_out,
            incomplete: 0,
            success_rate: successful as f64 / total as f64 * 100.0,
            min_ms: durations[0],
            max_ms: durations[total - 1],
            mean_ms: mean,
            std_dev_ms: standard_deviation(&durations, mean),
            p50_ms: percentile(&durations, 50.0),
            p90_ms: percentile(&durations, 90.0),
            p95_ms: percentile(&durations, 95.0),
            p99_ms: percentile(&durations, 99.0),
            outliers: count_outliers_iqr(&durations),
            throughput_per_sec: 0.0,
        }
    }

    /// True when samples exist and none of them succeeded
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.successful == 0
    }

    /// Value of one of the reported percentiles
    pub fn percentile(&self, p: f64) -> Option<f64> {
        match p as u32 {
            50 => Some(self.p50_ms),
            90 => Some(self.p90_ms),
            95 => Some(self.p95_ms),
            99 => Some(self.p99_ms),
            _ => None,
        }
    }
}

/// Linearly interpolated percentile of already sorted values
pub fn percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let index = (percentile / 100.0) * (sorted_values.len() as f64 - 1.0);
    let lower_index = index.floor() as usize;
    let upper_index = index.ceil() as usize;

    if lower_index == upper_index {
        sorted_values[lower_index]
    } else {
        let lower_value = sorted_values[lower_index];
        let upper_value = sorted_values[upper_index];
        let weight = index - lower_index as f64;
        lower_value + weight * (upper_value - lower_value)
    }
}

/// Sample standard deviation
fn standard_deviation(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }

    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

fn count_outliers_iqr(sorted_values: &[f64]) -> usize {
    if sorted_values.len() < 4 {
        return 0;
    }

    let q1 = percentile(sorted_values, 25.0);
    let q3 = percentile(sorted_values, 75.0);
    let iqr = q3 - q1;

    let lower_bound = q1 - 1.5 * iqr;
    let upper_bound = q3 + 1.5 * iqr;

    sorted_values
        .iter()
        .filter(|&&x| x < lower_bound || x > upper_bound)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn samples(durations: &[u64]) -> Vec<Sample> {
        let now = Utc::now();
        durations
            .iter()
            .map(|&ms| Sample::success(now, Duration::from_millis(ms)))
            .collect()
    }

    #[test]
    fn test_empty_report_is_all_zero() {
        let report = RunReport::new(Vec::new(), 10, 2, Duration::from_secs(1), true);
        let stats = LatencyStatistics::from_report(&report);

        assert_eq!(stats.total, 0);
        assert_eq!(stats.mean_ms, 0.0);
        assert_eq!(stats.p99_ms, 0.0);
        assert_eq!(stats.throughput_per_sec, 0.0);
        assert!(!stats.all_failed());
    }

    #[test]
    fn test_basic_summary() {
        let stats = LatencyStatistics::from_samples(&samples(&[10, 20, 30, 40, 50]));

        assert_eq!(stats.total, 5);
        assert_eq!(stats.min_ms, 10.0);
        assert_eq!(stats.max_ms, 50.0);
        assert_eq!(stats.mean_ms, 30.0);
        assert_eq!(stats.p50_ms, 30.0);
        assert!((stats.std_dev_ms - 15.811).abs() < 0.01);
        assert_eq!(stats.success_rate, 100.0);
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
        assert!((percentile(&values, 50.0) - 2.5).abs() < f64::EPSILON);
        assert!((percentile(&values, 90.0) - 3.7).abs() < 1e-9);
    }

    #[test]
    fn test_single_sample() {
        let stats = LatencyStatistics::from_samples(&samples(&[7]));
        assert_eq!(stats.p50_ms, 7.0);
        assert_eq!(stats.p99_ms, 7.0);
        assert_eq!(stats.std_dev_ms, 0.0);
    }

    #[test]
    fn test_failures_and_timeouts_counted() {
        let now = Utc::now();
        let samples = vec![
            Sample::success(now, Duration::from_millis(5)),
            Sample::failed(now, Duration::from_millis(6)),
            Sample::new(now, Duration::from_millis(100), InvocationStatus::Timeout),
            Sample::success(now, Duration::from_millis(4)),
        ];
        let report = RunReport::new(samples, 6, 2, Duration::from_secs(2), true);
        let stats = LatencyStatistics::from_report(&report);

        assert_eq!(stats.successful, 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.timed_out, 1);
        assert_eq!(stats.incomplete, 2);
        assert_eq!(stats.success_rate, 50.0);
        assert_eq!(stats.throughput_per_sec, 2.0);
    }

    #[test]
    fn test_all_failed() {
        let now = Utc::now();
        let samples = vec![Sample::failed(now, Duration::from_millis(1)); 3];
        assert!(LatencyStatistics::from_samples(&samples).all_failed());
    }

    #[test]
    fn test_outlier_detection() {
        let stats = LatencyStatistics::from_samples(&samples(&[10, 11, 12, 10, 11, 12, 500]));
        assert_eq!(stats.outliers, 1);
    }

    #[test]
    fn test_percentile_lookup() {
        let stats = LatencyStatistics::from_samples(&samples(&[1, 2, 3]));
        assert_eq!(stats.percentile(50.0), Some(2.0));
        assert_eq!(stats.percentile(75.0), None);
    }
}
