use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::error::RenderFailure;
use crate::layout::Page;
use crate::models::page::{PosterSize, RenderedPage};
use crate::services::executor::RenderExecutor;

/// One unit of render work: a planned page plus the theme and canvas
/// it renders with. Ids are process-local and appear in logs.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub id: u64,
    pub page: Page,
    pub theme: String,
    pub size: PosterSize,
    pub submitted_at: DateTime<Utc>,
}

struct QueuedJob {
    job: RenderJob,
    reply: oneshot::Sender<Result<RenderedPage, RenderFailure>>,
}

enum QueueCommand {
    Job(QueuedJob),
    Shutdown,
}

/// FIFO render queue with at most one job in flight.
///
/// A single worker task owns the only path to the executor: it takes
/// commands off the channel in arrival order and awaits each render to
/// completion before touching the next, so jobs start strictly in
/// submission order and never overlap. A job failure travels only to
/// its submitter; the worker moves on to the next job regardless.
///
/// There is no watchdog: a render that never completes stalls the
/// queue. The executor's settle delay is bounded, which keeps the
/// engine itself from waiting forever on content, but a genuine engine
/// hang is not detected here.
pub struct RenderQueue {
    tx: mpsc::UnboundedSender<QueueCommand>,
    next_job_id: AtomicU64,
    executor: Arc<RenderExecutor>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RenderQueue {
    pub fn new(executor: Arc<RenderExecutor>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(worker_loop(rx, executor.clone()));

        Self {
            tx,
            next_job_id: AtomicU64::new(1),
            executor,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueue one page and wait for its result. Fails with a
    /// queue-closed render failure once [`RenderQueue::shutdown`] has
    /// run.
    pub async fn submit(
        &self,
        page: Page,
        theme: String,
        size: PosterSize,
    ) -> Result<RenderedPage, RenderFailure> {
        let job = RenderJob {
            id: self.next_job_id.fetch_add(1, Ordering::Relaxed),
            page,
            theme,
            size,
            submitted_at: Utc::now(),
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(QueueCommand::Job(QueuedJob {
                job,
                reply: reply_tx,
            }))
            .map_err(|_| RenderFailure::queue_closed())?;

        // A dropped reply sender means the worker stopped before
        // reaching this job.
        reply_rx.await.map_err(|_| RenderFailure::queue_closed())?
    }

    /// Drain jobs already queued, stop the worker, then close the
    /// engine gracefully. Safe to call more than once.
    pub async fn shutdown(&self) {
        // The shutdown command queues behind pending jobs, so those
        // still drain in order.
        let _ = self.tx.send(QueueCommand::Shutdown);

        let worker = self.worker.lock().await.take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "Queue worker ended abnormally");
            }
        }

        self.executor.shutdown().await;
    }
}

async fn worker_loop(mut rx: mpsc::UnboundedReceiver<QueueCommand>, executor: Arc<RenderExecutor>) {
    while let Some(command) = rx.recv().await {
        match command {
            QueueCommand::Job(QueuedJob { job, reply }) => {
                tracing::debug!(
                    job = job.id,
                    page = job.page.index,
                    theme = %job.theme,
                    "Job started"
                );

                let result = executor.render(&job).await;

                if reply.send(result).is_err() {
                    tracing::debug!(job = job.id, "Submitter went away before the result");
                }
            }
            QueueCommand::Shutdown => {
                tracing::info!("Render queue shutting down");
                break;
            }
        }
    }
}
