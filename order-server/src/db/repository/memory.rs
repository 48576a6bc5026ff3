//! In-memory order store
//!
//! Reference implementation of [`OrderRepository`]. A single `RwLock`
//! guards the maps, which gives per-call atomicity and nothing more: the
//! create path reserves the order number and inserts the document under
//! one write guard, so a concurrent duplicate surfaces as
//! [`RepoError::Duplicate`] on the second writer. Iteration order (and
//! therefore sort tie-breaking) is the `BTreeMap` key order, which is
//! stable across calls.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{OrderFilter, OrderRepository, OrderSort, Page, RepoError, RepoResult, SortField, SortOrder};
use crate::db::models::{Order, OrderStatus};

#[derive(Default)]
struct StoreInner {
    /// Documents keyed by id
    orders: BTreeMap<String, Order>,
    /// order_number -> id uniqueness index
    numbers: HashMap<String, String>,
}

/// In-memory reference store
#[derive(Default)]
pub struct MemoryOrderRepository {
    inner: RwLock<StoreInner>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_orders(orders: &mut [Order], sort: OrderSort) {
    orders.sort_by(|a, b| {
        let ordering = match sort.field {
            SortField::OrderDate => a.order_date.cmp(&b.order_date),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::TotalPrice => a
                .order_summary
                .total_price
                .partial_cmp(&b.order_summary.total_price)
                .unwrap_or(std::cmp::Ordering::Equal),
            SortField::OrderNumber => a.order_number.cmp(&b.order_number),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        };
        match sort.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn create(&self, mut order: Order) -> RepoResult<Order> {
        let mut inner = self.inner.write();

        if inner.numbers.contains_key(&order.order_number) {
            return Err(RepoError::Duplicate(format!(
                "order number {}",
                order.order_number
            )));
        }

        let now = Utc::now();
        order.id = Uuid::new_v4().to_string();
        order.created_at = now;
        order.updated_at = now;

        inner
            .numbers
            .insert(order.order_number.clone(), order.id.clone());
        inner.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        Ok(self.inner.read().orders.get(id).cloned())
    }

    async fn find(
        &self,
        filter: &OrderFilter,
        sort: OrderSort,
        page: Page,
    ) -> RepoResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .inner
            .read()
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();

        sort_orders(&mut orders, sort);

        let limit = page.limit.max(1) as usize;
        let skip = (page.page.max(1) - 1) as usize * limit;
        Ok(orders.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, filter: &OrderFilter) -> RepoResult<u64> {
        Ok(self
            .inner
            .read()
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .count() as u64)
    }

    async fn update(&self, id: &str, order: Order) -> RepoResult<Order> {
        let mut inner = self.inner.write();
        let existing = inner
            .orders
            .get_mut(id)
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))?;

        let mut replacement = order;
        replacement.id = existing.id.clone();
        replacement.order_number = existing.order_number.clone();
        replacement.created_at = existing.created_at;
        replacement.updated_at = Utc::now();

        *existing = replacement.clone();
        Ok(replacement)
    }

    async fn mark_email_sent(&self, id: &str, at: DateTime<Utc>) -> RepoResult<()> {
        let mut inner = self.inner.write();
        let order = inner
            .orders
            .get_mut(id)
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))?;

        order.email_sent = true;
        order.email_sent_at = Some(at);
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status_bulk(&self, ids: &[String], status: OrderStatus) -> RepoResult<u64> {
        let mut inner = self.inner.write();
        let mut modified = 0;
        for id in ids {
            if let Some(order) = inner.orders.get_mut(id)
                && order.status != status
            {
                order.status = status;
                order.updated_at = Utc::now();
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn delete(&self, id: &str) -> RepoResult<bool> {
        let mut inner = self.inner.write();
        match inner.orders.remove(id) {
            Some(order) => {
                inner.numbers.remove(&order.order_number);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn distinct_customer_emails(&self) -> RepoResult<Vec<String>> {
        let emails: BTreeSet<String> = self
            .inner
            .read()
            .orders
            .values()
            .map(|o| o.customer.email.clone())
            .collect();
        Ok(emails.into_iter().collect())
    }

    async fn all(&self) -> RepoResult<Vec<Order>> {
        Ok(self.inner.read().orders.values().cloned().collect())
    }
}
