//! Repository module - the order store capability
//!
//! [`OrderRepository`] is the single persistence seam of the system: the
//! ingestor writes through it, the analytics engine reads through it, and
//! the HTTP handlers use its query surface. Backends only need per-document
//! atomicity; there is no cross-document transaction.

pub mod memory;

pub use memory::MemoryOrderRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::models::{Order, OrderStatus};

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Filter over the order collection
///
/// `status` is compared against the serialized status string, so an
/// unknown value simply matches nothing. `city` is a case-insensitive
/// substring match on `customer.city`. The date range applies to
/// `order_date` (inclusive on both ends).
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub city: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = &self.status
            && order.status.as_str() != status
        {
            return false;
        }
        if let Some(city) = &self.city
            && !order
                .customer
                .city
                .to_lowercase()
                .contains(&city.to_lowercase())
        {
            return false;
        }
        if let Some(start) = self.start_date
            && order.order_date < start
        {
            return false;
        }
        if let Some(end) = self.end_date
            && order.order_date > end
        {
            return false;
        }
        true
    }
}

/// Sortable order fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    OrderDate,
    CreatedAt,
    UpdatedAt,
    TotalPrice,
    OrderNumber,
    Status,
}

impl SortField {
    /// Parse a `sortBy` query value; unknown fields fall back to orderDate
    pub fn parse(value: &str) -> Self {
        match value {
            "createdAt" => SortField::CreatedAt,
            "updatedAt" => SortField::UpdatedAt,
            "totalPrice" => SortField::TotalPrice,
            "orderNumber" => SortField::OrderNumber,
            "status" => SortField::Status,
            _ => SortField::OrderDate,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse a `sortOrder` query value; anything but "asc" means descending
    pub fn parse(value: &str) -> Self {
        if value == "asc" {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

/// Sort specification
#[derive(Debug, Clone, Copy)]
pub struct OrderSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for OrderSort {
    fn default() -> Self {
        Self {
            field: SortField::OrderDate,
            order: SortOrder::Desc,
        }
    }
}

/// Pagination window (1-based page)
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 100,
        }
    }
}

/// Order store capability
///
/// The store assigns `id`, `created_at` and `updated_at`; callers own
/// everything else. `order_number` uniqueness is enforced at write time.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order; rejects duplicate order numbers
    async fn create(&self, order: Order) -> RepoResult<Order>;

    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>>;

    /// Filtered, sorted, paginated listing
    async fn find(&self, filter: &OrderFilter, sort: OrderSort, page: Page)
        -> RepoResult<Vec<Order>>;

    async fn count(&self, filter: &OrderFilter) -> RepoResult<u64>;

    /// Full-document replace; `id`, `order_number` and `created_at` are
    /// preserved from the stored document, `updated_at` is bumped
    async fn update(&self, id: &str, order: Order) -> RepoResult<Order>;

    /// Targeted, idempotent field update: `email_sent = true`,
    /// `email_sent_at = at`
    async fn mark_email_sent(&self, id: &str, at: DateTime<Utc>) -> RepoResult<()>;

    /// Apply a status to every matching order; returns the modified count
    async fn update_status_bulk(&self, ids: &[String], status: OrderStatus) -> RepoResult<u64>;

    /// Delete by id; Ok(false) when the id is unknown
    async fn delete(&self, id: &str) -> RepoResult<bool>;

    /// Distinct `customer.email` values across all orders
    async fn distinct_customer_emails(&self) -> RepoResult<Vec<String>>;

    /// Snapshot scan of the full collection, in stable store order
    async fn all(&self) -> RepoResult<Vec<Order>>;
}
