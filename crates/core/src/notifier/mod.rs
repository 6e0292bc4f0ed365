//! Customer notifications.
//!
//! A single-worker FIFO dispatcher delivers "your video is ready" emails
//! through a [`NotificationTransport`]. Failed deliveries are retried a
//! bounded number of times by demoting the job to the back of the queue;
//! jobs that exhaust their retries are kept as permanent-failure records.

mod dispatcher;
mod resend;
mod template;
mod transport;

pub use dispatcher::{DispatcherStatus, FailedNotification, NotificationDispatcher};
pub use resend::ResendTransport;
pub use transport::{
    DeliveryId, NotificationError, NotificationJob, NotificationPayload, NotificationTransport,
};
