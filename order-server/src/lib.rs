//! Order Server - order management backend for a retail storefront
//!
//! # Architecture Overview
//!
//! Two components composed through a shared order store:
//!
//! - **OrderIngestor** (`orders::ingestor`): validates and normalizes an
//!   untrusted order submission, computes canonical totals, persists the
//!   order and dispatches a best-effort confirmation notification.
//! - **AnalyticsAggregator** (`orders::analytics`): folds the order
//!   collection into a read-only dashboard snapshot.
//!
//! Persistence and notification delivery are capabilities injected at
//! startup ([`OrderRepository`], [`NotificationSender`]); the core never
//! owns their implementation.
//!
//! # Module Structure
//!
//! ```text
//! order-server/src/
//! ├── core/          # Config, ServerState, HTTP server
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # Order model and repository layer
//! ├── orders/        # Ingestion pipeline and analytics engine
//! ├── notify/        # Notification capability and senders
//! └── utils/         # Errors, logging, time helpers
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod notify;
pub mod orders;
pub mod utils;

// Re-export public types
pub use self::core::{Config, Server, ServerState};
pub use db::models::{Order, OrderStatus};
pub use db::repository::{MemoryOrderRepository, OrderRepository};
pub use notify::{NotificationSender, NotifyError};
pub use orders::{AnalyticsAggregator, DashboardSnapshot, OrderIngestor, OrderRequest};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
