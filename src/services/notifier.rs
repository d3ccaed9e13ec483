use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::errors::ServiceResult;
use crate::models::notification::RenderedMessage;
use crate::models::user::User;

/// Transport that actually delivers a rendered notification.
///
/// Failures are non-fatal to every caller in the engine.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(
        &self,
        recipient_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> ServiceResult<()>;
}

/// Best-effort notification fan-out.
///
/// One message per recipient; per-recipient failures are caught, logged
/// and counted, and never block sibling sends or the state transition
/// that produced the batch. Recipient de-duplication across overlapping
/// audiences is the caller's responsibility.
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    delivery_failures: AtomicU64,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            delivery_failures: AtomicU64::new(0),
        }
    }

    /// Submits a batch in the background and returns immediately, so a
    /// slow or failing sink never delays a meeting-mutation response.
    pub fn dispatch(self: &Arc<Self>, recipients: Vec<User>, rendered: RenderedMessage) {
        if recipients.is_empty() {
            debug!("Empty recipient set, nothing to dispatch");
            return;
        }

        let notifier = Arc::clone(self);
        tokio::spawn(async move {
            notifier.send_batch(&recipients, &rendered).await;
        });
    }

    /// Sends one message per recipient, returning how many were delivered.
    pub async fn send_batch(&self, recipients: &[User], rendered: &RenderedMessage) -> usize {
        let mut delivered = 0;

        for recipient in recipients {
            debug!("Sending '{}' to {}", rendered.subject, recipient.email);

            match self
                .sink
                .send(
                    &recipient.email,
                    &rendered.subject,
                    &rendered.text,
                    &rendered.html,
                )
                .await
            {
                Ok(()) => {
                    delivered += 1;
                }
                Err(e) => {
                    self.delivery_failures.fetch_add(1, Ordering::Relaxed);
                    error!("Failed to send notification to {}: {}", recipient.email, e);
                }
            }
        }

        info!(
            "Dispatched '{}' to {}/{} recipients",
            rendered.subject,
            delivered,
            recipients.len()
        );

        delivered
    }

    /// Total per-recipient delivery failures since startup.
    pub fn delivery_failures(&self) -> u64 {
        self.delivery_failures.load(Ordering::Relaxed)
    }
}
