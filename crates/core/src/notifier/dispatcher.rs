//! Notification dispatch worker.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::NotifierConfig;
use crate::error_sink::{ErrorContext, ErrorSink};
use crate::metrics;

use super::{NotificationJob, NotificationTransport};

/// A notification that exhausted its delivery attempts.
#[derive(Debug, Clone, Serialize)]
pub struct FailedNotification {
    pub order_id: String,
    pub recipient: String,
    pub attempts: u32,
    pub last_error: String,
    pub failed_at: DateTime<Utc>,
}

/// Snapshot of the dispatcher for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatus {
    pub queue_length: usize,
    /// Jobs in the queue that have already failed at least once.
    pub jobs_with_retries: usize,
    pub permanent_failures: usize,
    pub sent_total: u64,
    pub failed_total: u64,
    pub oldest_queued_at: Option<DateTime<Utc>>,
}

/// A queued delivery, optionally deferred until its retry delay elapses.
struct PendingDelivery {
    job: NotificationJob,
    not_before: Option<Instant>,
}

struct DispatcherInner {
    queue: VecDeque<PendingDelivery>,
    permanent_failures: Vec<FailedNotification>,
    sent_total: u64,
    failed_total: u64,
}

/// Single-worker FIFO notification dispatcher.
///
/// A failed job goes to the back of the queue with an incremented attempt
/// count, eligible again once `retry_delay_ms` has elapsed; the delay
/// defers only the failed job, never the healthy jobs queued behind it.
/// After `max_retries` retries a [`FailedNotification`] is recorded and the
/// worker moves on.
pub struct NotificationDispatcher {
    config: NotifierConfig,
    transport: Arc<dyn NotificationTransport>,
    error_sink: Arc<dyn ErrorSink>,
    inner: Arc<Mutex<DispatcherInner>>,
    wake: Arc<Notify>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    worker_handle: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationDispatcher {
    pub fn new(
        config: NotifierConfig,
        transport: Arc<dyn NotificationTransport>,
        error_sink: Arc<dyn ErrorSink>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            transport,
            error_sink,
            inner: Arc::new(Mutex::new(DispatcherInner {
                queue: VecDeque::new(),
                permanent_failures: Vec::new(),
                sent_total: 0,
                failed_total: 0,
            })),
            wake: Arc::new(Notify::new()),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            worker_handle: Mutex::new(None),
        }
    }

    /// Start the delivery worker. Idempotent.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("notification dispatcher already running");
            return;
        }

        info!(
            max_retries = self.config.max_retries,
            retry_delay_ms = self.config.retry_delay_ms,
            "starting notification dispatcher"
        );

        let inner = Arc::clone(&self.inner);
        let transport = Arc::clone(&self.transport);
        let error_sink = Arc::clone(&self.error_sink);
        let wake = Arc::clone(&self.wake);
        let running = Arc::clone(&self.running);
        let config = self.config.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            Self::run_worker(inner, transport, error_sink, wake, config, shutdown_rx).await;
            running.store(false, Ordering::SeqCst);
            info!("notification dispatcher stopped");
        });

        *self.worker_handle.lock().unwrap() = Some(handle);
    }

    /// Stop the worker. A delivery in flight finishes first.
    pub async fn stop(&self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }

        info!("stopping notification dispatcher");
        let _ = self.shutdown_tx.send(());

        let handle = self.worker_handle.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Queue a notification for delivery.
    pub fn enqueue(&self, job: NotificationJob) {
        {
            let mut guard = self.inner.lock().unwrap();
            guard.queue.push_back(PendingDelivery {
                job,
                not_before: None,
            });
        }
        metrics::NOTIFICATIONS_ENQUEUED.inc();
        self.wake.notify_one();
    }

    pub fn status(&self) -> DispatcherStatus {
        let guard = self.inner.lock().unwrap();
        DispatcherStatus {
            queue_length: guard.queue.len(),
            jobs_with_retries: guard.queue.iter().filter(|p| p.job.attempts > 0).count(),
            permanent_failures: guard.permanent_failures.len(),
            sent_total: guard.sent_total,
            failed_total: guard.failed_total,
            oldest_queued_at: guard.queue.front().map(|p| p.job.queued_at),
        }
    }

    /// Notifications that exhausted their retries.
    pub fn permanent_failures(&self) -> Vec<FailedNotification> {
        self.inner.lock().unwrap().permanent_failures.clone()
    }

    async fn run_worker(
        inner: Arc<Mutex<DispatcherInner>>,
        transport: Arc<dyn NotificationTransport>,
        error_sink: Arc<dyn ErrorSink>,
        wake: Arc<Notify>,
        config: NotifierConfig,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        loop {
            // Take the oldest job whose retry delay has elapsed; deferred
            // jobs are skipped, not waited on.
            let (job, next_eligible) = {
                let now = Instant::now();
                let mut guard = inner.lock().unwrap();
                match guard
                    .queue
                    .iter()
                    .position(|p| p.not_before.is_none_or(|t| t <= now))
                {
                    Some(idx) => (guard.queue.remove(idx).map(|p| p.job), None),
                    None => (None, guard.queue.iter().filter_map(|p| p.not_before).min()),
                }
            };

            let Some(mut job) = job else {
                match next_eligible {
                    Some(at) => {
                        tokio::select! {
                            _ = shutdown_rx.recv() => return,
                            _ = wake.notified() => continue,
                            _ = tokio::time::sleep_until(at) => continue,
                        }
                    }
                    None => {
                        tokio::select! {
                            _ = shutdown_rx.recv() => return,
                            _ = wake.notified() => continue,
                            _ = tokio::time::sleep(Duration::from_millis(500)) => continue,
                        }
                    }
                }
            };

            match transport.send(&job).await {
                Ok(delivery_id) => {
                    info!(
                        order_id = %job.order_id,
                        recipient = %job.recipient,
                        delivery_id = %delivery_id.0,
                        "notification sent"
                    );
                    metrics::NOTIFICATIONS_SETTLED
                        .with_label_values(&["sent"])
                        .inc();
                    inner.lock().unwrap().sent_total += 1;
                }
                Err(e) => {
                    job.attempts += 1;

                    if job.attempts <= config.max_retries {
                        warn!(
                            order_id = %job.order_id,
                            attempt = job.attempts,
                            "notification failed, re-queueing: {}",
                            e
                        );
                        metrics::NOTIFICATIONS_SETTLED
                            .with_label_values(&["retried"])
                            .inc();
                        inner.lock().unwrap().queue.push_back(PendingDelivery {
                            job,
                            not_before: Some(
                                Instant::now() + Duration::from_millis(config.retry_delay_ms),
                            ),
                        });
                    } else {
                        warn!(
                            order_id = %job.order_id,
                            attempts = job.attempts,
                            "notification permanently failed: {}",
                            e
                        );
                        metrics::NOTIFICATIONS_SETTLED
                            .with_label_values(&["failed"])
                            .inc();
                        error_sink.record(
                            &format!("notification permanently failed: {}", e),
                            ErrorContext::new("notifier").with_order_id(job.order_id.clone()),
                        );

                        let mut guard = inner.lock().unwrap();
                        guard.failed_total += 1;
                        guard.permanent_failures.push(FailedNotification {
                            order_id: job.order_id,
                            recipient: job.recipient,
                            attempts: job.attempts,
                            last_error: e.to_string(),
                            failed_at: Utc::now(),
                        });
                    }
                }
            }

            // Drain the rest of the queue before going back to waiting, but
            // bail out promptly on shutdown.
            if shutdown_rx.try_recv().is_ok() {
                return;
            }
        }
    }
}
