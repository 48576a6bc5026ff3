//! Order domain logic
//!
//! - [`ingestor`] - the order ingestion pipeline
//! - [`analytics`] - the dashboard aggregation engine
//! - [`money`] - decimal-backed monetary helpers

pub mod analytics;
pub mod ingestor;
pub mod money;

pub use analytics::{AnalyticsAggregator, DashboardSnapshot};
pub use ingestor::{IngestError, OrderIngestor, OrderRequest};
