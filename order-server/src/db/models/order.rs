//! Order document model
//!
//! The central entity: a customer purchase request with line items,
//! computed totals and a status lifecycle. Wire format is camelCase JSON,
//! identical to the dashboard's existing document shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All six statuses, in lifecycle order
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a lowercase status string
    pub fn parse(value: &str) -> Option<OrderStatus> {
        OrderStatus::ALL.iter().copied().find(|s| s.as_str() == value)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One product entry within an order
///
/// `subtotal` is a point-in-time snapshot (`price × quantity` at ingestion)
/// and is never recomputed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub subtotal: f64,
    #[serde(default)]
    pub image: String,
}

/// Customer contact and delivery details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    pub address: String,
}

/// Derived monetary totals (see the ingestor's fallback policy)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub products_total: f64,
    pub delivery_fee: f64,
    pub total_price: f64,
    pub total_items: i64,
}

/// Delivery destination and estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
    pub city: String,
    pub address: String,
    pub estimated_delivery: DateTime<Utc>,
}

/// Order document
///
/// `id`, `created_at` and `updated_at` are store-managed; `order_number`
/// is immutable once assigned and globally unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub customer: Customer,
    pub products: Vec<LineItem>,
    pub order_summary: OrderSummary,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub payment_method: String,
    pub delivery_info: DeliveryInfo,
    pub email_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_sent_at: Option<DateTime<Utc>>,
    /// Free-text note, editable by dashboard operators post-creation
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
