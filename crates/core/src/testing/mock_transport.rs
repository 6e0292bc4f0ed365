//! Mock notification transport for tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::notifier::{DeliveryId, NotificationError, NotificationJob, NotificationTransport};

/// Scriptable in-memory notification transport.
pub struct MockNotificationTransport {
    sent: Mutex<Vec<NotificationJob>>,
    send_count: AtomicUsize,
    /// Fail the next N sends regardless of order.
    fail_remaining: AtomicUsize,
    /// Always fail these orders.
    fail_orders: Mutex<HashSet<String>>,
}

impl MockNotificationTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            send_count: AtomicUsize::new(0),
            fail_remaining: AtomicUsize::new(0),
            fail_orders: Mutex::new(HashSet::new()),
        }
    }

    /// Fail the next `n` delivery attempts.
    pub fn fail_next(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Fail every delivery attempt for the given order.
    pub fn fail_order(&self, order_id: &str) {
        self.fail_orders.lock().unwrap().insert(order_id.to_string());
    }

    /// Total delivery attempts, including failures.
    pub fn send_count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }

    pub fn sent_order_ids(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|j| j.order_id.clone())
            .collect()
    }

    pub fn sent_recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|j| j.recipient.clone())
            .collect()
    }
}

impl Default for MockNotificationTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationTransport for MockNotificationTransport {
    async fn send(&self, job: &NotificationJob) -> Result<DeliveryId, NotificationError> {
        let n = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;

        if self.fail_orders.lock().unwrap().contains(&job.order_id) {
            return Err(NotificationError::Api("mock scripted failure".to_string()));
        }

        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(NotificationError::Connection(
                "mock transient failure".to_string(),
            ));
        }

        self.sent.lock().unwrap().push(job.clone());
        Ok(DeliveryId(format!("mock-delivery-{}", n)))
    }
}
