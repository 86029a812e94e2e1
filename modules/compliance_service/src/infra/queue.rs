//! In-process job queue backed by a tokio channel and a pool of workers
//!
//! `channel()` splits the queue in two: the `WorkerPoolQueue` handle is given
//! to producers (workflow, event handlers, REST), the `JobReceiver` is handed to
//! `WorkerPool::spawn` once the job handler exists. Each job is attempted up to
//! `max_attempts` times with `retry_delay` between attempts.

use crate::domain::jobs::{Job, JobHandler, JobQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Producer side of the queue
#[derive(Clone)]
pub struct WorkerPoolQueue {
    tx: mpsc::UnboundedSender<Job>,
}

/// Consumer side of the queue, shared by all workers
pub struct JobReceiver {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
}

pub fn channel() -> (WorkerPoolQueue, JobReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        WorkerPoolQueue { tx },
        JobReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

#[async_trait::async_trait]
impl JobQueue for WorkerPoolQueue {
    async fn enqueue(&self, job: Job) -> anyhow::Result<()> {
        tracing::debug!(job = job.name(), "job enqueued");
        self.tx
            .send(job)
            .map_err(|e| anyhow::anyhow!("job queue is closed, dropping {}", e.0.name()))
    }
}

/// Retry policy and size of the pool
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub workers: usize,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

pub struct WorkerPool {
    handler: Arc<dyn JobHandler>,
    settings: WorkerSettings,
}

impl WorkerPool {
    pub fn new(handler: Arc<dyn JobHandler>, settings: WorkerSettings) -> Self {
        Self { handler, settings }
    }

    /// Start the workers. They stop when `cancel` fires or the queue closes.
    pub fn spawn(self, receiver: JobReceiver, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        let workers = self.settings.workers.max(1);
        tracing::info!(workers, max_attempts = self.settings.max_attempts, "starting job workers");

        (0..workers)
            .map(|worker_id| {
                let rx = receiver.rx.clone();
                let handler = self.handler.clone();
                let settings = self.settings;
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    run_worker(worker_id, rx, handler, settings, cancel).await;
                })
            })
            .collect()
    }
}

async fn run_worker(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    handler: Arc<dyn JobHandler>,
    settings: WorkerSettings,
    cancel: CancellationToken,
) {
    loop {
        let next = {
            let mut rx = rx.lock().await;
            tokio::select! {
                _ = cancel.cancelled() => None,
                job = rx.recv() => job,
            }
        };
        let Some(job) = next else {
            tracing::debug!(worker_id, "job worker stopped");
            return;
        };

        execute(worker_id, &job, handler.as_ref(), settings, &cancel).await;
    }
}

async fn execute(
    worker_id: usize,
    job: &Job,
    handler: &dyn JobHandler,
    settings: WorkerSettings,
    cancel: &CancellationToken,
) {
    let max_attempts = settings.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match handler.handle(job).await {
            Ok(()) => {
                tracing::debug!(worker_id, job = job.name(), attempt, "job completed");
                return;
            }
            Err(e) if attempt < max_attempts => {
                tracing::warn!(
                    worker_id,
                    job = job.name(),
                    attempt,
                    max_attempts,
                    error = %e,
                    "job failed, retrying"
                );
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::warn!(job = job.name(), "shutdown during retry backoff, job abandoned");
                        return;
                    }
                    _ = tokio::time::sleep(settings.retry_delay) => {}
                }
            }
            Err(e) => {
                tracing::error!(
                    worker_id,
                    job = ?job,
                    attempts = max_attempts,
                    error = %e,
                    "job failed permanently"
                );
                handler.on_exhausted(job, &e).await;
            }
        }
    }
}
