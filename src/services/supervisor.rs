//! Worker process supervision.
//!
//! A fixed-interval poll loop keeps the worker alive across source
//! mutations: external edits trigger a snapshot-and-restart, crashes
//! trigger bounded self-correction, and exhausted corrections trigger a
//! rollback to the most recent snapshot. Polling is deliberate — the
//! source may be rewritten by tooling that emits no change
//! notifications, so re-reading the file each cycle is the only
//! reliable signal.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::time::{timeout, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::domain::models::{WorkerConfig, WorkerEvent, WorkerState};
use crate::domain::ports::SourceRepairer;
use crate::services::change_detector::{self, Fingerprint};
use crate::services::snapshot_store::{SnapshotError, SnapshotStore};

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to launch worker `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("worker kept crashing and no snapshot is available for rollback")]
    NoSnapshot,

    #[error("rollback failed: {0}")]
    Rollback(#[source] SnapshotError),

    #[error("i/o while polling worker: {0}")]
    Io(#[from] std::io::Error),
}

/// The live worker process plus its captured error stream.
struct WorkerHandle {
    child: Child,
    pid: Option<i32>,
    stderr: Arc<Mutex<String>>,
    started_at: Instant,
}

impl WorkerHandle {
    fn captured_stderr(&self) -> String {
        self.stderr
            .lock()
            .map_or_else(|poisoned| poisoned.into_inner().clone(), |guard| guard.clone())
    }
}

/// Launches, monitors, restarts, and terminates the worker process.
pub struct ProcessSupervisor {
    config: WorkerConfig,
    source: PathBuf,
    snapshots: SnapshotStore,
    repairer: Arc<dyn SourceRepairer>,
    state: WorkerState,
    worker: Option<WorkerHandle>,
    fix_attempts: u32,
    last_fingerprint: Fingerprint,
    shutdown: watch::Receiver<bool>,
}

impl ProcessSupervisor {
    pub fn new(
        config: WorkerConfig,
        snapshots: SnapshotStore,
        repairer: Arc<dyn SourceRepairer>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let source = PathBuf::from(&config.source_path);
        Self {
            config,
            source,
            snapshots,
            repairer,
            state: WorkerState::NotRunning,
            worker: None,
            fix_attempts: 0,
            last_fingerprint: Fingerprint::absent(),
            shutdown,
        }
    }

    #[must_use]
    pub fn state(&self) -> WorkerState {
        self.state
    }

    #[must_use]
    pub fn fix_attempts(&self) -> u32 {
        self.fix_attempts
    }

    /// Pid of the current worker, if one is running.
    #[must_use]
    pub fn worker_pid(&self) -> Option<i32> {
        self.worker.as_ref().and_then(|handle| handle.pid)
    }

    /// Record the initial fingerprint and launch the worker.
    ///
    /// A launch failure here (missing executable) is fatal.
    pub async fn start(&mut self) -> Result<(), SupervisorError> {
        self.last_fingerprint = change_detector::fingerprint(&self.source).await;
        self.launch().await
    }

    /// Supervise until shutdown is signalled or a terminal failure
    /// occurs. The worker is always terminated before this returns.
    #[instrument(skip(self), fields(source = %self.source.display()))]
    pub async fn run(&mut self) -> Result<(), SupervisorError> {
        self.start().await?;
        let result = self.poll_loop().await;
        self.shutdown().await;
        result
    }

    async fn poll_loop(&mut self) -> Result<(), SupervisorError> {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if *shutdown.borrow() {
                        return Ok(());
                    }
                    self.poll_once().await?;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// One supervision cycle: liveness first, then stability, then the
    /// source fingerprint.
    pub async fn poll_once(&mut self) -> Result<(), SupervisorError> {
        let exit = match self.worker.as_mut() {
            Some(handle) => handle.child.try_wait()?,
            None => None,
        };
        if let Some(status) = exit {
            return self.handle_exit(status).await;
        }

        if self.fix_attempts > 0 {
            let stable_for = Duration::from_secs(self.config.stable_after_secs);
            if self
                .worker
                .as_ref()
                .is_some_and(|handle| handle.started_at.elapsed() >= stable_for)
            {
                info!(
                    attempts = self.fix_attempts,
                    "worker stable after restart; resetting fix attempts"
                );
                self.fix_attempts = 0;
            }
        }

        let (changed, current) =
            change_detector::has_changed(&self.source, &self.last_fingerprint).await;
        if changed {
            info!(fingerprint = %current, "source change detected");
            self.restart_for_change(current).await?;
        }

        Ok(())
    }

    /// Stop the worker and leave the loop-ready state behind.
    pub async fn shutdown(&mut self) {
        info!(state = %self.state, "supervisor shutting down");
        self.terminate_worker().await;
        self.state = self.state.next(WorkerEvent::Stopped);
    }

    async fn launch(&mut self) -> Result<(), SupervisorError> {
        let mut command = Command::new(&self.config.command);
        command
            .args(&self.config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| SupervisorError::Launch {
            command: self.config.command.clone(),
            source,
        })?;

        let pid = child.id().map(|id| id as i32);
        let stderr_buf = Arc::new(Mutex::new(String::new()));
        if let Some(stderr) = child.stderr.take() {
            let buf = Arc::clone(&stderr_buf);
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "worker", "{line}");
                    if let Ok(mut guard) = buf.lock() {
                        guard.push_str(&line);
                        guard.push('\n');
                    }
                }
            });
        }

        self.worker = Some(WorkerHandle {
            child,
            pid,
            stderr: stderr_buf,
            started_at: Instant::now(),
        });
        self.state = self.state.next(WorkerEvent::Launched);
        info!(pid, command = %self.config.command, "worker launched");
        Ok(())
    }

    async fn handle_exit(&mut self, status: ExitStatus) -> Result<(), SupervisorError> {
        let stderr = self
            .worker
            .take()
            .map(|handle| handle.captured_stderr())
            .unwrap_or_default();

        if status.success() {
            info!("worker exited cleanly; relaunching");
            self.state = self.state.next(WorkerEvent::CleanExit);
            self.settle().await;
            return self.launch().await;
        }

        error!(
            code = status.code(),
            stderr_bytes = stderr.len(),
            "worker crashed"
        );
        self.state = self.state.next(WorkerEvent::Crashed);

        if self.fix_attempts < self.config.max_fix_attempts {
            self.fix_attempts += 1;
            info!(
                attempt = self.fix_attempts,
                max = self.config.max_fix_attempts,
                "invoking self-correction"
            );
            if let Err(err) = self.repairer.repair(&self.source, &stderr).await {
                warn!(%err, "self-correction attempt failed");
            }
            self.settle().await;
            // The repair rewrote the source; refresh the fingerprint so
            // the relaunch is not mistaken for an external edit.
            self.last_fingerprint = change_detector::fingerprint(&self.source).await;
            self.launch().await
        } else {
            self.rollback().await
        }
    }

    async fn rollback(&mut self) -> Result<(), SupervisorError> {
        warn!(
            attempts = self.fix_attempts,
            "fix attempts exhausted; rolling back to latest snapshot"
        );

        let latest = match self.snapshots.latest(&self.source).await {
            Ok(latest) => latest,
            Err(err) => {
                self.state = self.state.next(WorkerEvent::RollbackImpossible);
                error!(%err, "could not query snapshot store");
                return Err(SupervisorError::Rollback(err));
            }
        };

        let Some(snapshot) = latest else {
            self.state = self.state.next(WorkerEvent::RollbackImpossible);
            error!("no snapshot available; supervisor cannot recover");
            return Err(SupervisorError::NoSnapshot);
        };

        if let Err(err) = self.snapshots.restore(&self.source, &snapshot).await {
            self.state = self.state.next(WorkerEvent::RollbackImpossible);
            error!(%err, "snapshot restore failed");
            return Err(SupervisorError::Rollback(err));
        }

        self.fix_attempts = 0;
        self.last_fingerprint = change_detector::fingerprint(&self.source).await;
        info!(
            snapshot = %snapshot.path.display(),
            created_at = %snapshot.created_at,
            "rolled back to last known-good snapshot"
        );
        self.launch().await
    }

    async fn restart_for_change(&mut self, current: Fingerprint) -> Result<(), SupervisorError> {
        self.state = self.state.next(WorkerEvent::SourceChanged);
        self.terminate_worker().await;

        // Snapshot the *new* content: an external edit is presumed
        // intentional and becomes the next rollback target.
        if let Err(err) = self.snapshots.backup(&self.source).await {
            warn!(%err, "snapshot of changed source failed; continuing");
        }

        self.last_fingerprint = current;
        self.launch().await
    }

    async fn terminate_worker(&mut self) {
        let Some(mut handle) = self.worker.take() else {
            return;
        };

        if let Some(pid) = handle.pid {
            debug!(pid, "sending SIGTERM to worker");
            if let Err(err) = signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
                warn!(%err, "SIGTERM failed");
            }
        }

        let grace = Duration::from_secs(self.config.grace_period_secs);
        match timeout(grace, handle.child.wait()).await {
            Ok(Ok(status)) => debug!(code = status.code(), "worker terminated"),
            Ok(Err(err)) => warn!(%err, "error waiting for worker exit"),
            Err(_) => {
                warn!(
                    grace_secs = self.config.grace_period_secs,
                    "grace period expired; force-killing worker"
                );
                if let Err(err) = handle.child.kill().await {
                    warn!(%err, "force kill failed");
                }
            }
        }
    }

    async fn settle(&self) {
        tokio::time::sleep(Duration::from_secs(self.config.settle_delay_secs)).await;
    }
}
