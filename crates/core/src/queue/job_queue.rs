//! Bounded-concurrency FIFO job queue.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::QueueConfig;
use crate::metrics;

use super::{AddOutcome, JobRunner, QueueStatus, QueuedJob};

struct QueueInner {
    waiting: VecDeque<QueuedJob>,
    active: HashMap<String, QueuedJob>,
}

/// FIFO generation job queue with bounded concurrency.
///
/// Admission (`add_job`) and the duplicate check happen under one lock, so
/// an order can never be admitted twice. A background drain loop started by
/// [`start`](JobQueue::start) pops jobs while slots are free and hands them
/// to the configured [`JobRunner`]; job failures are logged and the loop
/// keeps draining.
pub struct JobQueue {
    config: QueueConfig,
    runner: Arc<dyn JobRunner>,
    inner: Arc<Mutex<QueueInner>>,
    wake: Arc<Notify>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    drain_handle: Mutex<Option<JoinHandle<()>>>,
}

impl JobQueue {
    pub fn new(config: QueueConfig, runner: Arc<dyn JobRunner>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            runner,
            inner: Arc::new(Mutex::new(QueueInner {
                waiting: VecDeque::new(),
                active: HashMap::new(),
            })),
            wake: Arc::new(Notify::new()),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            drain_handle: Mutex::new(None),
        }
    }

    /// Start the background drain loop. Idempotent.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("job queue already running");
            return;
        }

        info!(
            max_concurrent = self.config.max_concurrent,
            "starting job queue"
        );

        let inner = Arc::clone(&self.inner);
        let runner = Arc::clone(&self.runner);
        let wake = Arc::clone(&self.wake);
        let running = Arc::clone(&self.running);
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                Self::drain(&inner, &runner, &wake, &config);

                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = wake.notified() => {}
                    _ = tokio::time::sleep(Duration::from_millis(500)) => {}
                }
            }
            running.store(false, Ordering::SeqCst);
            info!("job queue drain loop stopped");
        });

        *self.drain_handle.lock().unwrap() = Some(handle);
    }

    /// Stop the drain loop and wait for jobs already running to finish;
    /// nothing new starts.
    pub async fn stop(&self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }

        info!("stopping job queue");
        let _ = self.shutdown_tx.send(());

        let handle = self.drain_handle.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        // In-flight runners complete before stop() returns, so a process
        // shutdown never aborts a job mid-protocol. Each job task notifies
        // `wake` when it settles; the tick covers a missed notification.
        loop {
            if self.inner.lock().unwrap().active.is_empty() {
                return;
            }
            tokio::select! {
                _ = self.wake.notified() => {}
                _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Admit an order unless it is already waiting or running.
    pub fn add_job(&self, order_id: &str) -> AddOutcome {
        let outcome = {
            let mut guard = self.inner.lock().unwrap();

            if guard.active.contains_key(order_id) {
                AddOutcome::AlreadyActive
            } else if guard.waiting.iter().any(|j| j.order_id == order_id) {
                AddOutcome::AlreadyQueued
            } else {
                guard.waiting.push_back(QueuedJob::new(order_id));
                AddOutcome::Added {
                    position: guard.waiting.len() - 1,
                }
            }
        };

        match &outcome {
            AddOutcome::Added { position } => {
                debug!(order_id, position, "job admitted");
                metrics::JOBS_ENQUEUED.inc();
                self.wake.notify_one();
            }
            other => {
                debug!(order_id, ?other, "job not admitted");
            }
        }

        outcome
    }

    /// Whether the order is waiting or running.
    pub fn is_job_active(&self, order_id: &str) -> bool {
        let guard = self.inner.lock().unwrap();
        guard.active.contains_key(order_id)
            || guard.waiting.iter().any(|j| j.order_id == order_id)
    }

    /// Position among waiting jobs, if the order is waiting.
    pub fn position(&self, order_id: &str) -> Option<usize> {
        let guard = self.inner.lock().unwrap();
        guard.waiting.iter().position(|j| j.order_id == order_id)
    }

    /// Rough wait estimate for a queue position.
    pub fn estimated_wait_secs(&self, position: usize) -> u64 {
        position as u64 * self.config.avg_processing_secs
    }

    pub fn status(&self) -> QueueStatus {
        let guard = self.inner.lock().unwrap();
        QueueStatus {
            queue_length: guard.waiting.len(),
            waiting: guard.waiting.iter().map(|j| j.order_id.clone()).collect(),
            active: guard.active.keys().cloned().collect(),
            is_processing: !guard.active.is_empty(),
        }
    }

    /// Pop and launch jobs while slots are free. The pop and the move into
    /// the active set happen under the lock, which is what keeps the
    /// concurrency bound exact.
    fn drain(
        inner: &Arc<Mutex<QueueInner>>,
        runner: &Arc<dyn JobRunner>,
        wake: &Arc<Notify>,
        config: &QueueConfig,
    ) {
        loop {
            let job = {
                let mut guard = inner.lock().unwrap();
                if guard.active.len() >= config.max_concurrent {
                    return;
                }
                match guard.waiting.pop_front() {
                    Some(job) => {
                        guard.active.insert(job.order_id.clone(), job.clone());
                        job
                    }
                    None => return,
                }
            };

            let inner = Arc::clone(inner);
            let runner = Arc::clone(runner);
            let wake = Arc::clone(wake);
            let max_auto_retries = config.max_auto_retries;

            tokio::spawn(async move {
                let order_id = job.order_id.clone();
                debug!(%order_id, attempts = job.attempts, "job started");

                let result = runner.run(&order_id).await;

                {
                    let mut guard = inner.lock().unwrap();
                    guard.active.remove(&order_id);

                    match result {
                        Ok(()) => {
                            metrics::JOBS_SETTLED.with_label_values(&["success"]).inc();
                            debug!(%order_id, "job finished");
                        }
                        Err(e) => {
                            metrics::JOBS_SETTLED.with_label_values(&["failed"]).inc();
                            warn!(%order_id, "job failed: {}", e);

                            if job.attempts < max_auto_retries {
                                info!(
                                    %order_id,
                                    attempt = job.attempts + 1,
                                    "re-admitting failed job"
                                );
                                guard.waiting.push_back(QueuedJob {
                                    order_id: order_id.clone(),
                                    attempts: job.attempts + 1,
                                    queued_at: Utc::now(),
                                });
                            }
                        }
                    }
                }

                wake.notify_one();
            });
        }
    }
}
