//! Webhook notification sender
//!
//! Posts the full order document to a configured HTTP endpoint; the
//! downstream service owns templating and the actual delivery channel.

use async_trait::async_trait;
use serde_json::json;

use super::{NotificationSender, NotifyError};
use crate::db::models::Order;

pub struct WebhookSender {
    client: reqwest::Client,
    url: String,
}

impl WebhookSender {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl NotificationSender for WebhookSender {
    async fn send(&self, order: &Order) -> Result<(), NotifyError> {
        let payload = json!({
            "event": "order.confirmation",
            "order": order,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        tracing::info!(
            order_number = %order.order_number,
            "Confirmation notification delivered"
        );
        Ok(())
    }
}
