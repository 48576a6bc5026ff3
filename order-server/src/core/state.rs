use std::sync::Arc;

use crate::core::Config;
use crate::db::repository::{MemoryOrderRepository, OrderRepository};
use crate::notify::{NoopSender, NotificationSender, WebhookSender};
use crate::orders::{AnalyticsAggregator, OrderIngestor};

/// Shared application state - holds the injected capabilities and the
/// core components built on top of them
///
/// Cloning is shallow (`Arc` all the way down), so handlers receive a
/// cheap copy per request.
///
/// | Field | Description |
/// |-------|-------------|
/// | config | configuration (immutable) |
/// | repo | order store capability |
/// | notifier | confirmation delivery capability |
/// | ingestor | order ingestion pipeline |
/// | analytics | dashboard aggregation engine |
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// Order store capability
    pub repo: Arc<dyn OrderRepository>,
    /// Notification delivery capability
    pub notifier: Arc<dyn NotificationSender>,
    /// Order ingestion pipeline
    pub ingestor: Arc<OrderIngestor>,
    /// Dashboard aggregation engine
    pub analytics: Arc<AnalyticsAggregator>,
}

impl ServerState {
    /// Build state from explicit capabilities
    ///
    /// The ingestor and aggregator are constructed here so their
    /// dependencies are injected exactly once, at process startup.
    pub fn new(
        config: Config,
        repo: Arc<dyn OrderRepository>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        let ingestor = Arc::new(OrderIngestor::new(Arc::clone(&repo), Arc::clone(&notifier)));
        let analytics = Arc::new(AnalyticsAggregator::new(Arc::clone(&repo), config.timezone));

        Self {
            config,
            repo,
            notifier,
            ingestor,
            analytics,
        }
    }

    /// Initialize state with the default capability implementations
    ///
    /// - Store: in-memory reference repository
    /// - Notifier: webhook sender when `NOTIFY_WEBHOOK_URL` is set,
    ///   log-only sender otherwise
    pub fn initialize(config: &Config) -> Self {
        let repo: Arc<dyn OrderRepository> = Arc::new(MemoryOrderRepository::new());

        let notifier: Arc<dyn NotificationSender> = match &config.notify_webhook_url {
            Some(url) => Arc::new(WebhookSender::new(url.clone())),
            None => {
                tracing::warn!("NOTIFY_WEBHOOK_URL not set, confirmations will be logged only");
                Arc::new(NoopSender)
            }
        };

        Self::new(config.clone(), repo, notifier)
    }
}
