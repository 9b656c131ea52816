//! Worker pool and dispatch loop.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{info, warn};

use crate::metrics;
use crate::queue::QueueClient;

use super::runner::JobPipeline;
use super::types::{Job, JobOutcome};
use super::PipelineConfig;

/// Delay before retrying after a failed receive call.
const RECEIVE_RETRY_DELAY: Duration = Duration::from_secs(5);

/// A fixed pool of serial workers fed by one bounded job channel.
///
/// Concurrency is "N independent serial pipelines": workers never share
/// job state, and the dispatcher blocking on a full channel is what
/// throttles how far the queue is read ahead of processing capacity.
pub struct WorkerPool {
    config: PipelineConfig,
    pipeline: Arc<JobPipeline>,
    queue: Arc<dyn QueueClient>,
    shutdown_tx: broadcast::Sender<()>,
}

impl WorkerPool {
    /// Creates a pool over the given pipeline and queue client.
    pub fn new(
        config: PipelineConfig,
        pipeline: Arc<JobPipeline>,
        queue: Arc<dyn QueueClient>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            pipeline,
            queue,
            shutdown_tx,
        }
    }

    /// Signals the dispatch loop to stop pulling new batches. In-flight
    /// and already-queued jobs drain before `run` returns.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Runs the dispatch loop and workers until shutdown.
    pub async fn run(&self) {
        let (job_tx, job_rx) = mpsc::channel::<Job>(self.config.channel_depth);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut workers = Vec::with_capacity(self.config.workers);
        for worker_id in 1..=self.config.workers {
            let rx = Arc::clone(&job_rx);
            let pipeline = Arc::clone(&self.pipeline);
            workers.push(tokio::spawn(worker_loop(worker_id, rx, pipeline)));
        }
        info!("started {} workers", self.config.workers);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("dispatcher received shutdown signal");
                    break;
                }
                batch = self.queue.receive() => match batch {
                    Ok(messages) => {
                        for message in messages {
                            let job = Job::from_message(message);
                            // Blocks when the channel is full: backpressure.
                            if job_tx.send(job).await.is_err() {
                                warn!("job channel closed, stopping dispatcher");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        metrics::QUEUE_RECEIVE_ERRORS.inc();
                        warn!("receive failed, retrying: {}", e);
                        tokio::time::sleep(RECEIVE_RETRY_DELAY).await;
                    }
                }
            }
        }

        // Closing the channel lets each worker finish its current job,
        // drain the backlog, and exit.
        drop(job_tx);
        for handle in workers {
            let _ = handle.await;
        }
        info!("worker pool drained");
    }
}

/// One worker: a serial consumer of the shared job channel.
///
/// A job's failure is fully contained by the pipeline; nothing here can
/// take the worker down, so one poisoned job never stalls the pool.
async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    pipeline: Arc<JobPipeline>,
) {
    info!(worker_id, "worker started");
    loop {
        let job = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(job) = job else {
            break;
        };

        metrics::JOBS_IN_FLIGHT.inc();
        let outcome = pipeline.run(&job).await;
        metrics::JOBS_IN_FLIGHT.dec();
        metrics::JOBS_TOTAL.with_label_values(&[outcome.label()]).inc();

        match &outcome {
            JobOutcome::Delivered => {
                info!(worker_id, job_id = %job.id, "job delivered")
            }
            JobOutcome::Skipped(reason) => {
                info!(worker_id, job_id = %job.id, "job skipped ({})", reason)
            }
            JobOutcome::Failed(reason) => {
                warn!(worker_id, job_id = %job.id, "job failed, left for redelivery: {}", reason)
            }
        }
    }
    info!(worker_id, "worker stopped");
}
