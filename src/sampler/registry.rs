//! Live view of the sampler's worker pool
//!
//! Workers report state transitions here; the diagnostic snapshotter reads a
//! consistent copy while the run is in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

/// What a single worker is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerState {
    /// Waiting for the next invocation
    Idle,
    /// Running an invocation
    Busy {
        invocation: u32,
        since: DateTime<Utc>,
    },
    /// Job queue drained or run stopped
    Stopped,
}

impl WorkerState {
    pub fn label(&self) -> &'static str {
        match self {
            WorkerState::Idle => "IDLE",
            WorkerState::Busy { .. } => "BUSY",
            WorkerState::Stopped => "STOPPED",
        }
    }
}

/// Point-in-time copy of the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub task_name: String,
    pub taken_at: DateTime<Utc>,
    pub workers: Vec<WorkerState>,
    pub submitted: u32,
    pub completed: u32,
    pub peak_busy: usize,
}

impl RegistrySnapshot {
    pub fn busy(&self) -> usize {
        self.workers
            .iter()
            .filter(|w| matches!(w, WorkerState::Busy { .. }))
            .count()
    }

    pub fn pending(&self) -> u32 {
        self.submitted.saturating_sub(self.completed)
    }
}

#[derive(Debug, Default)]
struct Workers {
    task_name: String,
    states: Vec<WorkerState>,
    busy: usize,
}

/// Shared worker table plus run counters
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    workers: Mutex<Workers>,
    submitted: AtomicU32,
    completed: AtomicU32,
    peak_busy: AtomicUsize,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare the table for a new run of `worker_count` workers
    pub fn reset(&self, task_name: &str, worker_count: usize, submitted: u32) {
        let mut workers = self.lock();
        workers.task_name = task_name.to_string();
        workers.states = vec![WorkerState::Idle; worker_count];
        workers.busy = 0;
        drop(workers);

        self.submitted.store(submitted, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.peak_busy.store(0, Ordering::SeqCst);
    }

    pub fn mark_busy(&self, worker_id: usize, invocation: u32) {
        let mut workers = self.lock();
        let previous = Self::set_state(
            &mut workers,
            worker_id,
            WorkerState::Busy {
                invocation,
                since: Utc::now(),
            },
        );
        if matches!(previous, Some(WorkerState::Idle | WorkerState::Stopped)) {
            workers.busy += 1;
        }
        self.peak_busy.fetch_max(workers.busy, Ordering::SeqCst);
    }

    /// Record a finished invocation and return the worker to idle
    pub fn mark_idle(&self, worker_id: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.leave_busy(worker_id, WorkerState::Idle);
    }

    pub fn mark_stopped(&self, worker_id: usize) {
        self.leave_busy(worker_id, WorkerState::Stopped);
    }

    pub fn completed(&self) -> u32 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> u32 {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously busy workers seen this run
    pub fn peak_busy(&self) -> usize {
        self.peak_busy.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let workers = self.lock();
        RegistrySnapshot {
            task_name: workers.task_name.clone(),
            taken_at: Utc::now(),
            workers: workers.states.clone(),
            submitted: self.submitted(),
            completed: self.completed(),
            peak_busy: self.peak_busy(),
        }
    }

    fn leave_busy(&self, worker_id: usize, state: WorkerState) {
        let mut workers = self.lock();
        let previous = Self::set_state(&mut workers, worker_id, state);
        if matches!(previous, Some(WorkerState::Busy { .. })) {
            workers.busy = workers.busy.saturating_sub(1);
        }
    }

    fn set_state(workers: &mut Workers, worker_id: usize, state: WorkerState) -> Option<WorkerState> {
        workers
            .states
            .get_mut(worker_id)
            .map(|slot| std::mem::replace(slot, state))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Workers> {
        self.workers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_starts_idle() {
        let registry = WorkerRegistry::new();
        registry.reset("noop", 3, 10);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.task_name, "noop");
        assert_eq!(snapshot.workers, vec![WorkerState::Idle; 3]);
        assert_eq!(snapshot.submitted, 10);
        assert_eq!(snapshot.pending(), 10);
        assert_eq!(snapshot.busy(), 0);
    }

    #[test]
    fn test_busy_idle_transitions() {
        let registry = WorkerRegistry::new();
        registry.reset("noop", 2, 4);

        registry.mark_busy(0, 0);
        registry.mark_busy(1, 1);
        assert_eq!(registry.snapshot().busy(), 2);
        assert_eq!(registry.peak_busy(), 2);

        registry.mark_idle(0);
        registry.mark_idle(1);
        registry.mark_busy(0, 2);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.busy(), 1);
        assert_eq!(snapshot.completed, 2);
        assert_eq!(snapshot.peak_busy, 2);
        assert!(matches!(snapshot.workers[0], WorkerState::Busy { invocation: 2, .. }));

        registry.mark_idle(0);
        registry.mark_stopped(0);
        registry.mark_stopped(1);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.workers, vec![WorkerState::Stopped; 2]);
        assert_eq!(snapshot.busy(), 0);
    }

    #[test]
    fn test_unknown_worker_is_ignored() {
        let registry = WorkerRegistry::new();
        registry.reset("noop", 1, 1);
        registry.mark_busy(5, 0);
        registry.mark_stopped(5);
        assert_eq!(registry.snapshot().busy(), 0);
    }
}
