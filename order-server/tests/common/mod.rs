//! Shared integration test fixtures

// not every test binary uses every fixture
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use order_server::orders::IngestError;
use order_server::{Config, NotificationSender, NotifyError, Order, OrderRequest, ServerState};
use serde_json::{Value, json};

/// Sender that records every delivery attempt
pub struct RecordingSender {
    calls: AtomicUsize,
    pub fail: bool,
}

impl RecordingSender {
    pub fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, _order: &Order) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(NotifyError::Status(502))
        } else {
            Ok(())
        }
    }
}

/// Test state wired to an in-memory store and a recording sender
pub fn test_state(sender: Arc<RecordingSender>) -> ServerState {
    let config = Config {
        http_port: 0,
        environment: "development".into(),
        timezone: chrono_tz::UTC,
        notify_webhook_url: None,
        log_level: "warn".into(),
        log_dir: None,
    };
    let repo = Arc::new(order_server::MemoryOrderRepository::new());
    ServerState::new(config, repo, sender)
}

/// Ingest a submission, retrying on order-number collisions
///
/// The timestamp-based numbering scheme can collide when many orders are
/// created within one millisecond; the store rejects the duplicate and
/// callers retry.
pub async fn ingest(state: &ServerState, body: &Value) -> Order {
    loop {
        let request: OrderRequest = serde_json::from_value(body.clone()).unwrap();
        match state.ingestor.ingest(request).await {
            Ok(order) => return order,
            Err(IngestError::DuplicateOrderNumber) => continue,
            Err(e) => panic!("ingest failed: {}", e),
        }
    }
}

/// A complete valid order submission
pub fn sample_request(email: &str, city: &str) -> Value {
    json!({
        "customer": {
            "fullName": "Amel Ben Salah",
            "phone": "21612345678",
            "email": email,
            "city": city,
            "address": "12 Rue des Oliviers"
        },
        "products": [
            { "name": "Basil", "price": 10, "quantity": 2 },
            { "name": "Mint", "price": 2.5, "quantity": 1 }
        ]
    })
}
