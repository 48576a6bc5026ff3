//! Dashboard aggregation engine
//!
//! One snapshot scan of the order collection feeds a pure fold that
//! produces every dashboard metric in a single pass. The fold is plain
//! data-in data-out, so each metric is unit-testable without a store.
//!
//! Revenue metrics exclude cancelled orders; counts include them. All
//! rate denominators are zero-guarded.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::db::models::{Order, OrderStatus};
use crate::db::repository::OrderRepository;
use crate::orders::money;
use crate::utils::time;

/// How many products the leaderboard keeps
const TOP_PRODUCTS_LIMIT: usize = 10;

/// How many orders the recent list keeps
const RECENT_ORDERS_LIMIT: usize = 5;

/// Trailing window of the time series, in days
const OVER_TIME_WINDOW_DAYS: i64 = 30;

// ============================================================================
// Snapshot Types
// ============================================================================

/// Per-status order counts
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct OrdersByStatus {
    pub pending: u64,
    pub confirmed: u64,
    pub preparing: u64,
    pub shipped: u64,
    pub delivered: u64,
    pub cancelled: u64,
}

/// Product leaderboard entry, keyed by product name
///
/// The `_id` field name is kept for dashboard compatibility.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopProduct {
    #[serde(rename = "_id")]
    pub name: String,
    #[serde(rename = "totalQuantity")]
    pub total_quantity: i64,
    #[serde(rename = "totalRevenue")]
    pub total_revenue: f64,
    #[serde(rename = "orderCount")]
    pub order_count: u64,
}

/// One calendar day of the trailing time series
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayBucket {
    #[serde(rename = "_id")]
    pub day: String,
    pub count: u64,
    pub revenue: f64,
}

/// Full dashboard payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub total_orders: u64,
    pub total_revenue: f64,
    pub pending_orders: u64,
    pub confirmed_orders: u64,
    pub preparing_orders: u64,
    pub shipped_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,
    pub avg_order_value: f64,
    pub today_orders: u64,
    pub today_revenue: f64,
    pub total_customers: u64,
    pub customer_retention_rate: f64,
    pub avg_order_processing_time: f64,
    pub cancellation_rate: f64,
    pub orders_by_status: OrdersByStatus,
    pub revenue_by_status: BTreeMap<String, f64>,
    pub revenue_by_payment_method: BTreeMap<String, f64>,
    pub top_products: Vec<TopProduct>,
    pub recent_orders: Vec<Order>,
    pub orders_over_time: Vec<DayBucket>,
}

// ============================================================================
// Aggregator
// ============================================================================

/// Dashboard aggregation engine
///
/// Reads through the repository, computes in the business timezone.
pub struct AnalyticsAggregator {
    repo: Arc<dyn OrderRepository>,
    timezone: Tz,
}

impl AnalyticsAggregator {
    pub fn new(repo: Arc<dyn OrderRepository>, timezone: Tz) -> Self {
        Self { repo, timezone }
    }

    /// Compute the full dashboard from a point-in-time collection snapshot
    pub async fn compute_snapshot(&self) -> crate::db::repository::RepoResult<DashboardSnapshot> {
        let orders = self.repo.all().await?;
        let customers = self.repo.distinct_customer_emails().await?;
        Ok(fold(&orders, customers.len() as u64, self.timezone))
    }
}

/// The aggregation itself: one pass over the snapshot
pub fn fold(orders: &[Order], total_customers: u64, tz: Tz) -> DashboardSnapshot {
    let now = Utc::now();
    let today = time::today_start(tz);
    let window_start = now - Duration::days(OVER_TIME_WINDOW_DAYS);

    let mut by_status = OrdersByStatus::default();
    let mut revenue_total = 0.0;
    let mut revenue_by_status: BTreeMap<String, f64> = BTreeMap::new();
    let mut revenue_by_payment: BTreeMap<String, f64> = BTreeMap::new();
    let mut today_orders = 0u64;
    let mut today_revenue = 0.0;
    let mut products: HashMap<String, TopProduct> = HashMap::new();
    let mut over_time: BTreeMap<String, DayBucket> = BTreeMap::new();
    let mut orders_per_customer: HashMap<&str, u64> = HashMap::new();
    let mut processing_hours_sum = 0.0;
    let mut processing_count = 0u64;

    for order in orders {
        let total = order.order_summary.total_price;
        let cancelled = order.status == OrderStatus::Cancelled;

        match order.status {
            OrderStatus::Pending => by_status.pending += 1,
            OrderStatus::Confirmed => by_status.confirmed += 1,
            OrderStatus::Preparing => by_status.preparing += 1,
            OrderStatus::Shipped => by_status.shipped += 1,
            OrderStatus::Delivered => by_status.delivered += 1,
            OrderStatus::Cancelled => by_status.cancelled += 1,
        }

        if !cancelled {
            revenue_total += total;
            *revenue_by_status
                .entry(order.status.as_str().to_string())
                .or_insert(0.0) += total;
            *revenue_by_payment
                .entry(order.payment_method.clone())
                .or_insert(0.0) += total;
        }

        if order.order_date >= today {
            today_orders += 1;
            if !cancelled {
                today_revenue += total;
            }
        }

        // cancelled orders stay in the leaderboard and the time series
        for item in &order.products {
            let entry = products.entry(item.name.clone()).or_insert(TopProduct {
                name: item.name.clone(),
                total_quantity: 0,
                total_revenue: 0.0,
                order_count: 0,
            });
            entry.total_quantity += item.quantity;
            entry.total_revenue += item.subtotal;
            entry.order_count += 1;
        }

        if order.order_date >= window_start {
            let bucket = over_time
                .entry(time::day_key(order.order_date, tz))
                .or_insert_with(|| DayBucket {
                    day: time::day_key(order.order_date, tz),
                    count: 0,
                    revenue: 0.0,
                });
            bucket.count += 1;
            bucket.revenue += total;
        }

        *orders_per_customer
            .entry(order.customer.email.as_str())
            .or_insert(0) += 1;

        if order.status == OrderStatus::Shipped {
            let elapsed = order.updated_at - order.created_at;
            processing_hours_sum += elapsed.num_milliseconds() as f64 / 3_600_000.0;
            processing_count += 1;
        }
    }

    let total_orders = orders.len() as u64;
    let total_revenue = money::round2(revenue_total);

    let non_cancelled = total_orders - by_status.cancelled;
    let avg_order_value = if non_cancelled > 0 {
        money::round2(revenue_total / non_cancelled as f64)
    } else {
        0.0
    };

    let repeat_customers = orders_per_customer.values().filter(|&&c| c > 1).count() as u64;
    let customer_retention_rate = if total_customers > 0 {
        money::round2(repeat_customers as f64 / total_customers as f64 * 100.0)
    } else {
        0.0
    };

    let avg_order_processing_time = if processing_count > 0 {
        money::round2(processing_hours_sum / processing_count as f64)
    } else {
        0.0
    };

    let cancellation_rate = if total_orders > 0 {
        money::round2(by_status.cancelled as f64 / total_orders as f64 * 100.0)
    } else {
        0.0
    };

    let mut top_products: Vec<TopProduct> = products.into_values().collect();
    top_products.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity).then(a.name.cmp(&b.name)));
    top_products.truncate(TOP_PRODUCTS_LIMIT);
    for product in &mut top_products {
        product.total_revenue = money::round2(product.total_revenue);
    }

    let mut recent_orders: Vec<Order> = orders.to_vec();
    recent_orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_orders.truncate(RECENT_ORDERS_LIMIT);

    // BTreeMap gives the ascending day order for free
    let orders_over_time = over_time
        .into_values()
        .map(|mut bucket| {
            bucket.revenue = money::round2(bucket.revenue);
            bucket
        })
        .collect();

    let revenue_by_status = revenue_by_status
        .into_iter()
        .map(|(k, v)| (k, money::round2(v)))
        .collect();
    let revenue_by_payment_method = revenue_by_payment
        .into_iter()
        .map(|(k, v)| (k, money::round2(v)))
        .collect();

    DashboardSnapshot {
        total_orders,
        total_revenue,
        pending_orders: by_status.pending,
        confirmed_orders: by_status.confirmed,
        preparing_orders: by_status.preparing,
        shipped_orders: by_status.shipped,
        delivered_orders: by_status.delivered,
        cancelled_orders: by_status.cancelled,
        avg_order_value,
        today_orders,
        today_revenue: money::round2(today_revenue),
        total_customers,
        customer_retention_rate,
        avg_order_processing_time,
        cancellation_rate,
        orders_by_status: by_status,
        revenue_by_status,
        revenue_by_payment_method,
        top_products,
        recent_orders,
        orders_over_time,
    }
}
