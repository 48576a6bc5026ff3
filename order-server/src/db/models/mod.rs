//! Document models

pub mod order;
pub mod serde_helpers;

pub use order::{Customer, DeliveryInfo, LineItem, Order, OrderStatus, OrderSummary};
