//! Periodic diagnostic snapshots of the running process
//!
//! While a run is in flight the harness can write, at a fixed interval, one
//! text file per snapshot named `thread<yyMMdd-HHmmss.SSS>.txt`. Each file
//! lists the process threads (Linux only) and the sampler worker table.
//! Snapshot failures are logged and skipped; they never affect the run.

use crate::error::{AppError, Result};
use crate::logging::DiagnosticsLogger;
use crate::sampler::{RegistrySnapshot, WorkerRegistry, WorkerState};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Timestamp layout used in snapshot file names
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%y%m%d-%H%M%S%.3f";

/// One OS thread of this process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub tid: u64,
    pub name: String,
    pub state: String,
}

/// Writes snapshot files into a directory
#[derive(Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
    registry: Arc<WorkerRegistry>,
    logger: DiagnosticsLogger,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>, registry: Arc<WorkerRegistry>) -> Self {
        Self::with_logger(dir, registry, DiagnosticsLogger::quiet())
    }

    pub fn with_logger(dir: impl Into<PathBuf>, registry: Arc<WorkerRegistry>, logger: DiagnosticsLogger) -> Self {
        Self {
            dir: dir.into(),
            registry,
            logger,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a snapshot taken at `at`
    pub fn file_name(at: DateTime<Local>) -> String {
        format!("thread{}.txt", at.format(SNAPSHOT_TIMESTAMP_FORMAT))
    }

    /// Write one snapshot; returns the file path, or `None` if it failed
    pub async fn write_snapshot(&self, at: DateTime<Local>) -> Option<PathBuf> {
        let content = render_snapshot(at, &self.registry.snapshot(), &process_threads());
        let path = self.dir.join(Self::file_name(at));

        match write_new(&path, &content).await {
            Ok(written) => {
                self.logger.log_snapshot_written(&written, content.len()).await;
                Some(written)
            }
            Err(e) => {
                self.logger.log_snapshot_failure(&path, &e).await;
                None
            }
        }
    }
}

/// Create `path` without clobbering an earlier snapshot from the same millisecond
async fn write_new(path: &Path, content: &str) -> Result<PathBuf> {
    use tokio::io::AsyncWriteExt;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    for attempt in 0..100u32 {
        let candidate = if attempt == 0 {
            path.to_path_buf()
        } else {
            path.with_file_name(format!("{}-{}.txt", stem, attempt))
        };

        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(mut file) => {
                file.write_all(content.as_bytes()).await?;
                file.flush().await?;
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::io(format!("Too many snapshots named like {}", path.display())))
}

/// Render the text body of one snapshot
pub fn render_snapshot(at: DateTime<Local>, workers: &RegistrySnapshot, threads: &[ThreadInfo]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Snapshot {}", at.format("%Y-%m-%d %H:%M:%S%.3f %z"));
    let _ = writeln!(out, "Process {} ({} {})", std::process::id(), crate::PKG_NAME, crate::VERSION);
    let _ = writeln!(out);

    let _ = writeln!(out, "Run: {}", if workers.task_name.is_empty() { "-" } else { &workers.task_name });
    let _ = writeln!(
        out,
        "  submitted={} completed={} pending={} busy={} peak_busy={}",
        workers.submitted,
        workers.completed,
        workers.pending(),
        workers.busy(),
        workers.peak_busy
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Workers ({}):", workers.workers.len());
    for (id, state) in workers.workers.iter().enumerate() {
        match state {
            WorkerState::Busy { invocation, since } => {
                let running_ms = (workers.taken_at - *since).num_milliseconds().max(0);
                let _ = writeln!(
                    out,
                    "  worker-{:<4} {:<8} invocation={} running={}ms",
                    id,
                    state.label(),
                    invocation,
                    running_ms
                );
            }
            _ => {
                let _ = writeln!(out, "  worker-{:<4} {}", id, state.label());
            }
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Threads ({}):", threads.len());
    for thread in threads {
        let _ = writeln!(out, "  \"{}\" tid={} state={}", thread.name, thread.tid, thread.state);
    }

    out
}

/// Threads of the current process, empty where the platform offers no cheap view
#[cfg(target_os = "linux")]
pub fn process_threads() -> Vec<ThreadInfo> {
    let Ok(entries) = std::fs::read_dir("/proc/self/task") else {
        return Vec::new();
    };

    let mut threads: Vec<ThreadInfo> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let tid = entry.file_name().to_string_lossy().parse::<u64>().ok()?;
            let stat = std::fs::read_to_string(entry.path().join("stat")).ok()?;
            parse_task_stat(tid, &stat)
        })
        .collect();

    threads.sort_by_key(|t| t.tid);
    threads
}

#[cfg(not(target_os = "linux"))]
pub fn process_threads() -> Vec<ThreadInfo> {
    Vec::new()
}

/// Parse `/proc/<pid>/task/<tid>/stat`: `tid (comm) S ...`
pub fn parse_task_stat(tid: u64, stat: &str) -> Option<ThreadInfo> {
    // comm may itself contain parentheses, so split on the last ')'
    let open = stat.find('(')?;
    let close = stat.rfind(')')?;
    let name = stat.get(open + 1..close)?.to_string();
    let state = stat.get(close + 1..)?.split_whitespace().next()?;

    let state = match state {
        "R" => "RUNNING",
        "S" => "SLEEPING",
        "D" => "WAITING",
        "Z" => "ZOMBIE",
        "T" | "t" => "STOPPED",
        "I" => "IDLE",
        other => other,
    };

    Some(ThreadInfo {
        tid,
        name,
        state: state.to_string(),
    })
}

/// Periodic snapshot loop owned by the harness
pub struct Snapshotter {
    stop: watch::Sender<bool>,
    handle: JoinHandle<usize>,
}

impl Snapshotter {
    /// Write a snapshot now and then every `interval` until stopped
    pub fn start(writer: SnapshotWriter, interval: Duration) -> Self {
        let (stop, mut stopped) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut written = 0usize;
            loop {
                if writer.write_snapshot(Local::now()).await.is_some() {
                    written += 1;
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }
            written
        });

        Self { stop, handle }
    }

    /// Signal the loop and wait for it; returns how many snapshots were written
    pub async fn stop(self) -> usize {
        let _ = self.stop.send(true);
        self.handle.await.unwrap_or(0)
    }
}
