//! Notification capability
//!
//! Confirmation delivery is a capability injected into the ingestor at
//! construction time. The creation path treats it as fire-and-forget; the
//! manual resend path awaits it and surfaces failure.

mod webhook;

pub use webhook::WebhookSender;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::Order;

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification endpoint returned status {0}")]
    Status(u16),

    #[error("Notification request failed: {0}")]
    Transport(String),
}

/// Confirmation delivery capability
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Deliver a confirmation for the given order
    ///
    /// A returned error is terminal for this attempt; retries are the
    /// caller's decision (manual resend endpoint).
    async fn send(&self, order: &Order) -> Result<(), NotifyError>;
}

/// Log-only sender for deployments without a configured channel
pub struct NoopSender;

#[async_trait]
impl NotificationSender for NoopSender {
    async fn send(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            order_number = %order.order_number,
            city = %order.customer.city,
            total = order.order_summary.total_price,
            "Confirmation notification (log only)"
        );
        Ok(())
    }
}
