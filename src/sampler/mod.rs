//! Bounded-concurrency latency sampler
//!
//! `Sampler::submit_run` pushes `loop_count` job indices into a queue, closes
//! the queue, and lets exactly `concurrency` worker threads drain it. Each
//! worker is a dedicated OS thread that drives one invocation at a time on
//! the caller's runtime handle, so a task that blocks its thread holds only
//! its own worker and never the timer that enforces the deadline.
//!
//! Every invocation produces one [`Sample`] regardless of how it ended.
//! Workers still running when the deadline elapses are detached and their
//! later samples are not reported.

pub mod registry;

pub use registry::{RegistrySnapshot, WorkerRegistry, WorkerState};

use crate::error::{AppError, Result};
use crate::logging::SamplerLogger;
use crate::models::{RunReport, Sample, SampleSet};
use crate::task::Task;
use crate::types::InvocationStatus;
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::cell::Cell;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as job_channel, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// Name prefix of sampler worker threads
pub const WORKER_THREAD_PREFIX: &str = "plb-worker-";

type JobQueue = Arc<Mutex<job_channel::Receiver<u32>>>;

thread_local! {
    static INVOKING: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is inside a task invocation.
///
/// Panics raised while this holds are caught and recorded as failed samples.
pub fn invocation_in_progress() -> bool {
    INVOKING.with(Cell::get)
}

/// Fixed-size worker pool that records one latency sample per invocation
pub struct Sampler {
    logger: SamplerLogger,
    registry: Arc<WorkerRegistry>,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler {
    pub fn new() -> Self {
        Self::with_logger(SamplerLogger::quiet())
    }

    pub fn with_logger(logger: SamplerLogger) -> Self {
        Self {
            logger,
            registry: Arc::new(WorkerRegistry::new()),
        }
    }

    /// Worker table shared with the diagnostic snapshotter
    pub fn registry(&self) -> Arc<WorkerRegistry> {
        Arc::clone(&self.registry)
    }

    /// Invoke `task` `loop_count` times across `concurrency` workers.
    ///
    /// Returns once every invocation has produced a sample or `deadline`
    /// has elapsed, whichever comes first. Task errors and panics are
    /// recorded as failed samples and never abort the run; a truncated run
    /// is reported through [`RunReport::timed_out`] rather than as an error.
    /// Must be called from within a tokio runtime.
    pub async fn submit_run(
        &self,
        task: Arc<dyn Task>,
        loop_count: u32,
        concurrency: u32,
        deadline: Duration,
    ) -> Result<RunReport> {
        if loop_count == 0 {
            return Err(AppError::validation("Loop count must be at least 1"));
        }
        if concurrency == 0 {
            return Err(AppError::validation("Concurrency must be at least 1"));
        }

        let handle = Handle::try_current()
            .map_err(|e| AppError::internal(format!("Sampler requires a tokio runtime: {}", e)))?;

        self.logger
            .log_run_start(task.name(), loop_count, concurrency)
            .await;

        let samples = Arc::new(SampleSet::with_capacity(loop_count as usize));
        self.registry
            .reset(task.name(), concurrency as usize, loop_count);

        let (sender, receiver) = job_channel::channel();
        for invocation in 0..loop_count {
            sender
                .send(invocation)
                .map_err(|e| AppError::internal(format!("Job queue closed during submission: {}", e)))?;
        }
        // No further submissions: workers exit once the queue is drained
        drop(sender);

        let jobs: JobQueue = Arc::new(Mutex::new(receiver));
        let stop = Arc::new(AtomicBool::new(false));
        // Closes once every worker has dropped its sender
        let (done, mut all_done) = mpsc::channel::<()>(1);
        let started = Instant::now();

        for worker_id in 0..concurrency as usize {
            let worker = Worker {
                id: worker_id,
                task: Arc::clone(&task),
                jobs: Arc::clone(&jobs),
                samples: Arc::clone(&samples),
                registry: Arc::clone(&self.registry),
                logger: self.logger.clone(),
                stop: Arc::clone(&stop),
                _done: done.clone(),
            };
            let runtime = handle.clone();

            let spawned = thread::Builder::new()
                .name(format!("{}{}", WORKER_THREAD_PREFIX, worker_id))
                .spawn(move || worker.run(runtime));

            if let Err(e) = spawned {
                stop.store(true, Ordering::SeqCst);
                return Err(AppError::internal(format!(
                    "Failed to start sampler worker {}: {}",
                    worker_id, e
                )));
            }
        }
        drop(done);

        let timed_out = tokio::time::timeout(deadline, all_done.recv()).await.is_err();
        if timed_out {
            // Queued invocations are dropped; in-flight ones finish detached
            stop.store(true, Ordering::SeqCst);
        }

        let report = RunReport::new(
            samples.snapshot(),
            loop_count,
            concurrency,
            started.elapsed(),
            timed_out,
        );
        self.logger.log_run_summary(&report).await;

        Ok(report)
    }
}

struct Worker {
    id: usize,
    task: Arc<dyn Task>,
    jobs: JobQueue,
    samples: Arc<SampleSet>,
    registry: Arc<WorkerRegistry>,
    logger: SamplerLogger,
    stop: Arc<AtomicBool>,
    _done: mpsc::Sender<()>,
}

impl Worker {
    fn run(self, runtime: Handle) {
        loop {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }

            let next = self.jobs.lock().unwrap_or_else(|e| e.into_inner()).recv();
            let Ok(invocation) = next else {
                break;
            };

            self.registry.mark_busy(self.id, invocation);
            INVOKING.with(|flag| flag.set(true));
            let sample = runtime.block_on(self.invoke(invocation));
            INVOKING.with(|flag| flag.set(false));
            self.samples.push(sample);
            self.registry.mark_idle(self.id);
        }

        self.registry.mark_stopped(self.id);
    }

    async fn invoke(&self, invocation: u32) -> Sample {
        let start_time = Utc::now();
        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.task.invoke()).catch_unwind().await;
        let elapsed = started.elapsed();

        let (sample, detail) = match outcome {
            Ok(Ok(outcome)) => (Sample::success(start_time, elapsed), outcome.detail),
            Ok(Err(error)) => {
                self.logger.log_invocation_failure(invocation, &error).await;
                (Sample::new(start_time, elapsed, InvocationStatus::from_error(&error)), None)
            }
            Err(payload) => {
                self.logger
                    .log_invocation_panic(invocation, &panic_message(payload.as_ref()))
                    .await;
                (Sample::failed(start_time, elapsed), None)
            }
        };

        self.logger
            .log_sample(invocation, &sample, detail.as_deref())
            .await;
        sample
    }
}
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, Logger};
    use crate::task::{FnTask, TaskOutcome};
    use std::sync::atomic::AtomicUsize;

    fn noop_task() -> Arc<dyn Task> {
        Arc::new(FnTask::new("noop", || async { Ok(TaskOutcome::default()) }))
    }

    #[tokio::test]
    async fn test_every_invocation_is_sampled() {
        let sampler = Sampler::new();
        let report = sampler
            .submit_run(noop_task(), 100, 4, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(report.completed(), 100);
        assert_eq!(report.submitted, 100);
        assert!(report.is_complete());
        assert!(!report.timed_out);
        assert_eq!(report.success_count(), 100);
        assert_eq!(sampler.registry().completed(), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_invocations_small_pool() {
        let sampler = Sampler::new();
        let report = sampler
            .submit_run(noop_task(), 10_000, 50, Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(report.completed(), 10_000);
        assert_eq!(report.concurrency, 50);
    }

    #[tokio::test]
    async fn test_single_worker_single_invocation() {
        let report = Sampler::new()
            .submit_run(noop_task(), 1, 1, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(report.completed(), 1);
    }

    #[tokio::test]
    async fn test_more_workers_than_invocations() {
        let report = Sampler::new()
            .submit_run(noop_task(), 3, 16, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(report.completed(), 3);
    }

    #[tokio::test]
    async fn test_zero_inputs_are_rejected() {
        let sampler = Sampler::new();
        assert!(sampler
            .submit_run(noop_task(), 0, 4, Duration::from_secs(1))
            .await
            .is_err());
        assert!(sampler
            .submit_run(noop_task(), 4, 0, Duration::from_secs(1))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_deadline_truncates_pending_tasks() {
        let task: Arc<dyn Task> = Arc::new(FnTask::new("hang", || async {
            std::future::pending::<()>().await;
            Ok(TaskOutcome::default())
        }));

        let deadline = Duration::from_millis(200);
        let started = Instant::now();
        let report = Sampler::new()
            .submit_run(task, 10, 2, deadline)
            .await
            .unwrap();
        let waited = started.elapsed();

        assert!(report.timed_out);
        assert_eq!(report.completed(), 0);
        assert_eq!(report.incomplete, 10);
        assert!(waited >= deadline);
        assert!(waited < deadline + Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_partial_results_at_deadline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let task: Arc<dyn Task> = Arc::new(FnTask::new("first-fast", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n >= 5 {
                    std::future::pending::<()>().await;
                }
                Ok(TaskOutcome::default())
            }
        }));

        let report = Sampler::new()
            .submit_run(task, 20, 1, Duration::from_millis(300))
            .await
            .unwrap();

        assert!(report.timed_out);
        assert_eq!(report.completed(), 5);
        assert_eq!(report.incomplete, 15);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let task: Arc<dyn Task> = Arc::new(FnTask::new("flaky", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n % 5 == 0 {
                    return Err(AppError::not_found("1234"));
                }
                std::thread::sleep(Duration::from_millis(20));
                Ok(TaskOutcome::default())
            }
        }));

        let report = Sampler::new()
            .submit_run(task, 50, 8, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(report.completed(), 50);
        assert_eq!(report.failed_count(), 10);
        assert_eq!(report.success_count(), 40);

        // Failing neighbours do not distort the successful timings
        for sample in report.samples.iter().filter(|s| s.is_success()) {
            assert!(
                (20..60).contains(&sample.duration_ms),
                "success took {}ms",
                sample.duration_ms
            );
        }
        assert!(report
            .samples
            .iter()
            .filter(|s| !s.is_success())
            .all(|s| s.duration_ms < 20));
    }

    #[tokio::test]
    async fn test_timeout_errors_are_classified() {
        let task: Arc<dyn Task> = Arc::new(FnTask::new("slow", || async {
            Err::<TaskOutcome, _>(AppError::timeout("request timed out"))
        }));

        let report = Sampler::new()
            .submit_run(task, 4, 2, Duration::from_secs(5))
            .await
            .unwrap();

        assert!(report
            .samples
            .iter()
            .all(|s| s.status == InvocationStatus::Timeout));
    }

    #[tokio::test]
    async fn test_panics_are_isolated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let task: Arc<dyn Task> = Arc::new(FnTask::new("panicky", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n % 4 == 0 {
                    panic!("invocation {} exploded", n);
                }
                Ok(TaskOutcome::default())
            }
        }));

        let mut logger = Logger::quiet("SAMPLER");
        logger.set_level(LogLevel::Debug);
        let sampler = Sampler::with_logger(SamplerLogger::new(logger));
        let report = sampler
            .submit_run(task, 40, 4, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(report.completed(), 40);
        assert_eq!(report.failed_count(), 10);
        assert_eq!(
            report
                .samples
                .iter()
                .filter(|s| s.status == InvocationStatus::Failed)
                .count(),
            10
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (current, max) = (Arc::clone(&in_flight), Arc::clone(&peak));

        let task: Arc<dyn Task> = Arc::new(FnTask::new("sleep", move || {
            let current = Arc::clone(&current);
            let max = Arc::clone(&max);
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                max.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(5));
                current.fetch_sub(1, Ordering::SeqCst);
                Ok(TaskOutcome::default())
            }
        }));

        let sampler = Sampler::new();
        let report = sampler
            .submit_run(task, 150, 30, Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(report.completed(), 150);
        assert!(peak.load(Ordering::SeqCst) <= 30);
        assert!(sampler.registry().peak_busy() <= 30);
        assert!(report
            .samples
            .iter()
            .all(|s| (5..30).contains(&s.duration_ms)));

        // Five rounds of 5ms each across 30 workers
        assert!(report.elapsed >= Duration::from_millis(25));
        assert!(report.elapsed < Duration::from_millis(500), "run took {:?}", report.elapsed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_deadline_holds_when_tasks_block_their_thread() {
        let task: Arc<dyn Task> = Arc::new(FnTask::new("blocking", || async {
            std::thread::sleep(Duration::from_secs(3));
            Ok(TaskOutcome::default())
        }));

        let deadline = Duration::from_millis(200);
        let started = Instant::now();
        let report = Sampler::new()
            .submit_run(task, 10, 4, deadline)
            .await
            .unwrap();
        let waited = started.elapsed();

        assert!(report.timed_out);
        assert_eq!(report.completed(), 0);
        assert_eq!(report.incomplete, 10);
        assert!(waited >= deadline);
        assert!(waited < Duration::from_secs(1), "waited {:?}", waited);
    }

    #[tokio::test]
    async fn test_blocking_tasks_use_every_worker() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (current, max) = (Arc::clone(&in_flight), Arc::clone(&peak));

        let task: Arc<dyn Task> = Arc::new(FnTask::new("blocking", move || {
            let current = Arc::clone(&current);
            let max = Arc::clone(&max);
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                max.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(50));
                current.fetch_sub(1, Ordering::SeqCst);
                Ok(TaskOutcome::default())
            }
        }));

        // Single-threaded caller runtime; four workers still run side by side
        let report = Sampler::new()
            .submit_run(task, 8, 4, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(report.completed(), 8);
        assert_eq!(peak.load(Ordering::SeqCst), 4);
        assert!(report.samples.iter().all(|s| s.duration_ms >= 50));
        assert!(report.elapsed < Duration::from_millis(300), "run took {:?}", report.elapsed);
    }

    #[tokio::test]
    async fn test_invocations_run_on_named_worker_threads() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let task: Arc<dyn Task> = Arc::new(FnTask::new("where", move || {
            let record = Arc::clone(&record);
            async move {
                let name = thread::current().name().map(String::from);
                record.lock().unwrap().push((name, invocation_in_progress()));
                Ok(TaskOutcome::default())
            }
        }));

        Sampler::new()
            .submit_run(task, 6, 2, Duration::from_secs(5))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 6);
        for (name, invoking) in seen.iter() {
            assert!(name.as_deref().unwrap_or("").starts_with(WORKER_THREAD_PREFIX));
            assert!(*invoking);
        }
        assert!(!invocation_in_progress());
    }

    #[tokio::test]
    async fn test_start_times_are_within_run() {
        let before = Utc::now();
        let report = Sampler::new()
            .submit_run(noop_task(), 20, 4, Duration::from_secs(5))
            .await
            .unwrap();
        let after = Utc::now();

        assert!(report
            .samples
            .iter()
            .all(|s| s.start_time >= before && s.start_time <= after));
    }

    #[tokio::test]
    async fn test_workers_stop_after_drain() {
        let sampler = Sampler::new();
        sampler
            .submit_run(noop_task(), 10, 3, Duration::from_secs(5))
            .await
            .unwrap();

        let snapshot = sampler.registry().snapshot();
        assert_eq!(snapshot.workers, vec![WorkerState::Stopped; 3]);
        assert_eq!(snapshot.pending(), 0);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
