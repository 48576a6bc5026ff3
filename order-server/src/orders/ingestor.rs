//! Order ingestion pipeline
//!
//! Converts an untrusted order submission into a valid, persisted
//! [`Order`], then attempts (but does not guarantee) a confirmation
//! notification. Validation fails fast with no partial writes; the
//! notification runs on a detached task after the write and never affects
//! the ingest result.
//!
//! All construction-time defaulting lives here (order number, delivery
//! fee, payment method, delivery estimate) so the policy is testable
//! independent of the store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::serde_helpers::{lenient_f64, lenient_i64};
use crate::db::models::{Customer, DeliveryInfo, LineItem, Order, OrderStatus, OrderSummary};
use crate::db::repository::{OrderRepository, RepoError};
use crate::notify::NotificationSender;
use crate::orders::money;
use crate::utils::AppError;

/// Flat delivery fee applied when the caller does not supply one
pub const DEFAULT_DELIVERY_FEE: f64 = 7.0;

/// Default payment method
pub const DEFAULT_PAYMENT_METHOD: &str = "cash_on_delivery";

/// Order number prefix (kept from the legacy numbering scheme)
const ORDER_NUMBER_PREFIX: &str = "PL";

/// Delivery estimate offset from the order date
const ESTIMATED_DELIVERY_DAYS: i64 = 3;

// ============================================================================
// Request Types
// ============================================================================

/// Raw order submission
///
/// Numeric fields deserialize leniently (JSON number or numeric string);
/// unparsable values become `None` and are treated as falsy by the
/// validation guards and the summary fallback policy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default)]
    pub customer: Option<CustomerRequest>,
    #[serde(default)]
    pub products: Vec<LineItemRequest>,
    #[serde(default)]
    pub order_summary: Option<SummaryRequest>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Caller-supplied totals; each field independently overrides the
/// computed fallback when present and non-zero
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub products_total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub delivery_fee: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_items: Option<i64>,
}

// ============================================================================
// Errors
// ============================================================================

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<String>,
    },

    #[error("Order number already exists")]
    DuplicateOrderNumber,

    #[error("Failed to send confirmation for order {0}")]
    Notification(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl IngestError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Validation { message, errors } => AppError::Validation { message, errors },
            IngestError::DuplicateOrderNumber => AppError::DuplicateOrderNumber,
            IngestError::Notification(_) => AppError::Notification,
            IngestError::Repo(repo) => repo.into(),
        }
    }
}

// ============================================================================
// Ingestor
// ============================================================================

/// Order ingestion pipeline
///
/// Capabilities are injected at construction; lifecycle is owned by the
/// process entry point.
pub struct OrderIngestor {
    repo: Arc<dyn OrderRepository>,
    notifier: Arc<dyn NotificationSender>,
}

impl OrderIngestor {
    pub fn new(repo: Arc<dyn OrderRepository>, notifier: Arc<dyn NotificationSender>) -> Self {
        Self { repo, notifier }
    }

    /// Validate, normalize, persist and dispatch
    ///
    /// Success means the order is durably written; the confirmation
    /// notification is best-effort and runs out-of-band.
    pub async fn ingest(&self, request: OrderRequest) -> Result<Order, IngestError> {
        let customer = validate(&request)?;
        let products = normalize_products(&request.products);
        let order_summary = compute_summary(request.order_summary.as_ref(), &products);

        let order_date = Utc::now();
        let order = Order {
            // store-managed fields, assigned on create
            id: String::new(),
            created_at: order_date,
            updated_at: order_date,

            order_number: generate_order_number(),
            delivery_info: DeliveryInfo {
                city: customer.city.clone(),
                address: customer.address.clone(),
                estimated_delivery: order_date + Duration::days(ESTIMATED_DELIVERY_DAYS),
            },
            customer,
            products,
            order_summary,
            status: OrderStatus::Pending,
            order_date,
            payment_method: request
                .payment_method
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            email_sent: false,
            email_sent_at: None,
            note: String::new(),
        };

        let created = self.repo.create(order).await.map_err(|e| match e {
            RepoError::Duplicate(_) => IngestError::DuplicateOrderNumber,
            other => IngestError::Repo(other),
        })?;

        tracing::info!(
            order_number = %created.order_number,
            total = created.order_summary.total_price,
            "Order persisted"
        );

        self.dispatch_confirmation(created.clone());
        Ok(created)
    }

    /// Manual confirmation resend - synchronous, surfaces failure
    ///
    /// Marks the order as sent only when the sender reports success; a
    /// failed resend leaves `email_sent` unchanged.
    pub async fn resend_confirmation(&self, id: &str) -> Result<Order, IngestError> {
        let order = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| IngestError::Repo(RepoError::NotFound(format!("Order {} not found", id))))?;

        match self.notifier.send(&order).await {
            Ok(()) => {
                self.repo.mark_email_sent(&order.id, Utc::now()).await?;
                tracing::info!(order_number = %order.order_number, "Confirmation resent");
                Ok(order)
            }
            Err(e) => {
                tracing::error!(
                    order_number = %order.order_number,
                    error = %e,
                    "Confirmation resend failed"
                );
                Err(IngestError::Notification(order.order_number))
            }
        }
    }

    /// Fire-and-forget confirmation dispatch
    ///
    /// The mark-as-sent write is a second, independent write; it may race
    /// with later operator mutations (last-write-wins, accepted).
    fn dispatch_confirmation(&self, order: Order) {
        let notifier = Arc::clone(&self.notifier);
        let repo = Arc::clone(&self.repo);
        tokio::spawn(async move {
            match notifier.send(&order).await {
                Ok(()) => {
                    if let Err(e) = repo.mark_email_sent(&order.id, Utc::now()).await {
                        tracing::warn!(
                            order_number = %order.order_number,
                            error = %e,
                            "Confirmation sent but mark-as-sent write failed"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        order_number = %order.order_number,
                        error = %e,
                        "Confirmation dispatch failed"
                    );
                }
            }
        });
    }
}

// ============================================================================
// Validation
// ============================================================================

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

/// Structural validation - fails fast, collects all missing customer
/// fields into one error, reports the 1-based index of the first bad
/// product line
fn validate(request: &OrderRequest) -> Result<Customer, IngestError> {
    let Some(customer) = &request.customer else {
        return Err(IngestError::validation("Customer information is required"));
    };

    if request.products.is_empty() {
        return Err(IngestError::validation(
            "Products array is required and cannot be empty",
        ));
    }

    let required = [
        ("fullName", &customer.full_name),
        ("phone", &customer.phone),
        ("email", &customer.email),
        ("city", &customer.city),
        ("address", &customer.address),
    ];
    let missing: Vec<String> = required
        .iter()
        .filter(|(_, value)| blank(value))
        .map(|(name, _)| name.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(IngestError::Validation {
            message: format!("Missing required customer fields: {}", missing.join(", ")),
            errors: missing,
        });
    }

    for (index, product) in request.products.iter().enumerate() {
        let price_ok = product.price.is_some_and(|p| p != 0.0);
        let quantity_ok = product.quantity.is_some_and(|q| q != 0);
        if blank(&product.name) || !price_ok || !quantity_ok {
            return Err(IngestError::validation(format!(
                "Product {} is missing required fields (name, price, or quantity)",
                index + 1
            )));
        }
    }

    Ok(Customer {
        full_name: customer.full_name.clone().unwrap_or_default(),
        phone: customer.phone.clone().unwrap_or_default(),
        email: customer.email.clone().unwrap_or_default(),
        city: customer.city.clone().unwrap_or_default(),
        postal_code: customer.postal_code.clone().unwrap_or_default(),
        address: customer.address.clone().unwrap_or_default(),
    })
}

// ============================================================================
// Normalization and totals
// ============================================================================

fn normalize_products(products: &[LineItemRequest]) -> Vec<LineItem> {
    products
        .iter()
        .map(|item| {
            let price = item.price.unwrap_or(0.0);
            let quantity = item.quantity.unwrap_or(0);
            LineItem {
                product_id: item
                    .product_id
                    .clone()
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| format!("prod-{}", Uuid::new_v4())),
                name: item.name.clone().unwrap_or_default(),
                price,
                quantity,
                subtotal: money::line_subtotal(price, quantity),
                image: item.image.clone().unwrap_or_default(),
            }
        })
        .collect()
}

/// Zero and absent overrides both fall back (legacy falsy semantics)
fn override_f64(value: Option<f64>, fallback: f64) -> f64 {
    match value {
        Some(v) if v != 0.0 => v,
        _ => fallback,
    }
}

fn override_i64(value: Option<i64>, fallback: i64) -> i64 {
    match value {
        Some(v) if v != 0 => v,
        _ => fallback,
    }
}

/// Totals with the caller-override fallback policy
///
/// Each field independently prefers the caller's value; the fallbacks are
/// one shared computation (the legacy implementation recomputed
/// `products_total` inside the `total_price` fallback, with an identical
/// result since both derive from the same inputs).
fn compute_summary(summary: Option<&SummaryRequest>, products: &[LineItem]) -> OrderSummary {
    let computed_products_total = money::sum2(products.iter().map(|p| p.subtotal));
    let computed_total_items: i64 = products.iter().map(|p| p.quantity).sum();

    let products_total = override_f64(
        summary.and_then(|s| s.products_total),
        computed_products_total,
    );
    let delivery_fee = override_f64(summary.and_then(|s| s.delivery_fee), DEFAULT_DELIVERY_FEE);
    let total_price = override_f64(
        summary.and_then(|s| s.total_price),
        money::round2(products_total + delivery_fee),
    );
    let total_items = override_i64(summary.and_then(|s| s.total_items), computed_total_items);

    OrderSummary {
        products_total,
        delivery_fee,
        total_price,
        total_items,
    }
}

/// Order number: fixed prefix + millisecond timestamp + random 0-999 suffix
///
/// Collisions are possible under concurrent creation; the store rejects
/// the duplicate and the caller may retry.
fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = rand::thread_rng().gen_range(0..1000);
    format!("{}{}{}", ORDER_NUMBER_PREFIX, millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::MemoryOrderRepository;
    use crate::notify::NotifyError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sender that records calls and fails on demand
    struct RecordingSender {
        calls: AtomicUsize,
        fail: bool,
    }

    impl RecordingSender {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
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

    fn ingestor(fail_notify: bool) -> (OrderIngestor, Arc<MemoryOrderRepository>, Arc<RecordingSender>) {
        let repo = Arc::new(MemoryOrderRepository::new());
        let sender = RecordingSender::new(fail_notify);
        let ingestor = OrderIngestor::new(repo.clone(), sender.clone());
        (ingestor, repo, sender)
    }

    fn request_json(body: serde_json::Value) -> OrderRequest {
        serde_json::from_value(body).unwrap()
    }

    fn valid_request() -> OrderRequest {
        request_json(serde_json::json!({
            "customer": {
                "fullName": "Amel Ben Salah",
                "phone": "21612345",
                "email": "amel@example.com",
                "city": "Tunis",
                "address": "12 Rue des Oliviers"
            },
            "products": [
                { "name": "Basil", "price": 10, "quantity": 2 }
            ]
        }))
    }

    async fn wait_for_email_sent(repo: &MemoryOrderRepository, id: &str) -> bool {
        for _ in 0..100 {
            if let Some(order) = repo.find_by_id(id).await.unwrap()
                && order.email_sent
            {
                return true;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        false
    }

    #[tokio::test]
    async fn computes_default_totals() {
        let (ingestor, _, _) = ingestor(false);
        let order = ingestor.ingest(valid_request()).await.unwrap();

        assert_eq!(order.order_summary.products_total, 20.0);
        assert_eq!(order.order_summary.delivery_fee, 7.0);
        assert_eq!(order.order_summary.total_price, 27.0);
        assert_eq!(order.order_summary.total_items, 2);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, "cash_on_delivery");
        assert_eq!(order.customer.postal_code, "");
        assert_eq!(
            order.delivery_info.estimated_delivery - order.order_date,
            Duration::days(3)
        );
    }

    #[tokio::test]
    async fn order_number_has_prefix_and_timestamp() {
        let (ingestor, _, _) = ingestor(false);
        let order = ingestor.ingest(valid_request()).await.unwrap();

        assert!(order.order_number.starts_with("PL"));
        let digits = &order.order_number[2..];
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
        // 13-digit millis plus a 1-3 digit suffix
        assert!(digits.len() >= 14 && digits.len() <= 16);
    }

    #[tokio::test]
    async fn missing_customer_fields_are_all_reported() {
        let (ingestor, _, _) = ingestor(false);
        let request = request_json(serde_json::json!({
            "customer": {
                "fullName": "Amel Ben Salah",
                "email": "amel@example.com",
                "address": "12 Rue des Oliviers"
            },
            "products": [{ "name": "Basil", "price": 10, "quantity": 2 }]
        }));

        let err = ingestor.ingest(request).await.unwrap_err();
        match err {
            IngestError::Validation { message, errors } => {
                assert_eq!(errors, vec!["phone".to_string(), "city".to_string()]);
                assert!(message.contains("phone"));
                assert!(message.contains("city"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn zero_price_is_rejected_but_one_cent_passes() {
        let (ingestor, _, _) = ingestor(false);

        let rejected = request_json(serde_json::json!({
            "customer": {
                "fullName": "A", "phone": "1", "email": "a@b.c",
                "city": "Tunis", "address": "x"
            },
            "products": [{ "name": "Basil", "price": 0, "quantity": 2 }]
        }));
        let err = ingestor.ingest(rejected).await.unwrap_err();
        assert!(matches!(err, IngestError::Validation { .. }));
        assert!(err.to_string().contains("Product 1"));

        let accepted = request_json(serde_json::json!({
            "customer": {
                "fullName": "A", "phone": "1", "email": "a@b.c",
                "city": "Tunis", "address": "x"
            },
            "products": [{ "name": "Basil", "price": 0.01, "quantity": 2 }]
        }));
        let order = ingestor.ingest(accepted).await.unwrap();
        assert_eq!(order.order_summary.products_total, 0.02);
    }

    #[tokio::test]
    async fn missing_customer_and_empty_products_fail_fast() {
        let (ingestor, _, _) = ingestor(false);

        let err = ingestor.ingest(OrderRequest::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Customer information is required");

        let no_products = request_json(serde_json::json!({
            "customer": {
                "fullName": "A", "phone": "1", "email": "a@b.c",
                "city": "Tunis", "address": "x"
            },
            "products": []
        }));
        let err = ingestor.ingest(no_products).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Products array is required and cannot be empty"
        );
    }

    #[tokio::test]
    async fn caller_overrides_win_but_zero_falls_back() {
        let (ingestor, _, _) = ingestor(false);
        let request = request_json(serde_json::json!({
            "customer": {
                "fullName": "A", "phone": "1", "email": "a@b.c",
                "city": "Tunis", "address": "x"
            },
            "products": [{ "name": "Basil", "price": 10, "quantity": 2 }],
            "orderSummary": {
                "productsTotal": "25.5",
                "deliveryFee": 0,
                "totalItems": 5
            }
        }));

        let order = ingestor.ingest(request).await.unwrap();
        assert_eq!(order.order_summary.products_total, 25.5);
        // zero is falsy: flat fee applies
        assert_eq!(order.order_summary.delivery_fee, 7.0);
        // no totalPrice override: computed from the overridden components
        assert_eq!(order.order_summary.total_price, 32.5);
        assert_eq!(order.order_summary.total_items, 5);
    }

    #[tokio::test]
    async fn string_prices_are_coerced() {
        let (ingestor, _, _) = ingestor(false);
        let request = request_json(serde_json::json!({
            "customer": {
                "fullName": "A", "phone": "1", "email": "a@b.c",
                "city": "Tunis", "address": "x"
            },
            "products": [{ "name": "Basil", "price": "10.5", "quantity": "3" }]
        }));

        let order = ingestor.ingest(request).await.unwrap();
        assert_eq!(order.products[0].price, 10.5);
        assert_eq!(order.products[0].quantity, 3);
        assert_eq!(order.products[0].subtotal, 31.5);
        assert_eq!(order.order_summary.total_items, 3);
    }

    #[tokio::test]
    async fn generated_product_ids_are_unique_within_request() {
        let (ingestor, _, _) = ingestor(false);
        let request = request_json(serde_json::json!({
            "customer": {
                "fullName": "A", "phone": "1", "email": "a@b.c",
                "city": "Tunis", "address": "x"
            },
            "products": [
                { "name": "Basil", "price": 10, "quantity": 1 },
                { "name": "Mint", "price": 5, "quantity": 1 }
            ]
        }));

        let order = ingestor.ingest(request).await.unwrap();
        assert_ne!(order.products[0].product_id, order.products[1].product_id);
        assert!(order.products[0].product_id.starts_with("prod-"));
    }

    #[tokio::test]
    async fn successful_dispatch_marks_email_sent() {
        let (ingestor, repo, sender) = ingestor(false);
        let order = ingestor.ingest(valid_request()).await.unwrap();
        assert!(!order.email_sent);

        assert!(wait_for_email_sent(&repo, &order.id).await);
        assert_eq!(sender.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_dispatch_leaves_order_unmarked() {
        let (ingestor, repo, sender) = ingestor(true);
        let order = ingestor.ingest(valid_request()).await.unwrap();

        // ingest succeeded even though delivery will fail
        assert!(!wait_for_email_sent(&repo, &order.id).await);
        assert!(sender.calls.load(Ordering::SeqCst) >= 1);
        let stored = repo.find_by_id(&order.id).await.unwrap().unwrap();
        assert!(!stored.email_sent);
        assert!(stored.email_sent_at.is_none());
    }

    #[tokio::test]
    async fn resend_marks_only_on_success() {
        let (ingestor, repo, _) = ingestor(true);
        let order = ingestor.ingest(valid_request()).await.unwrap();

        let err = ingestor.resend_confirmation(&order.id).await.unwrap_err();
        assert!(matches!(err, IngestError::Notification(_)));
        let stored = repo.find_by_id(&order.id).await.unwrap().unwrap();
        assert!(!stored.email_sent);

        // same store, now with a working sender
        let working = OrderIngestor::new(repo.clone(), RecordingSender::new(false));
        working.resend_confirmation(&order.id).await.unwrap();
        let stored = repo.find_by_id(&order.id).await.unwrap().unwrap();
        assert!(stored.email_sent);
        assert!(stored.email_sent_at.is_some());
    }

    #[tokio::test]
    async fn resend_unknown_order_is_not_found() {
        let (ingestor, _, _) = ingestor(false);
        let err = ingestor.resend_confirmation("missing").await.unwrap_err();
        assert!(matches!(err, IngestError::Repo(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_order_number_is_a_distinct_error() {
        struct DuplicateRepo;

        #[async_trait]
        impl OrderRepository for DuplicateRepo {
            async fn create(&self, order: Order) -> crate::db::repository::RepoResult<Order> {
                Err(RepoError::Duplicate(format!(
                    "order number {}",
                    order.order_number
                )))
            }
            async fn find_by_id(
                &self,
                _id: &str,
            ) -> crate::db::repository::RepoResult<Option<Order>> {
                Ok(None)
            }
            async fn find(
                &self,
                _filter: &crate::db::repository::OrderFilter,
                _sort: crate::db::repository::OrderSort,
                _page: crate::db::repository::Page,
            ) -> crate::db::repository::RepoResult<Vec<Order>> {
                Ok(Vec::new())
            }
            async fn count(
                &self,
                _filter: &crate::db::repository::OrderFilter,
            ) -> crate::db::repository::RepoResult<u64> {
                Ok(0)
            }
            async fn update(
                &self,
                id: &str,
                _order: Order,
            ) -> crate::db::repository::RepoResult<Order> {
                Err(RepoError::NotFound(id.to_string()))
            }
            async fn mark_email_sent(
                &self,
                _id: &str,
                _at: chrono::DateTime<Utc>,
            ) -> crate::db::repository::RepoResult<()> {
                Ok(())
            }
            async fn update_status_bulk(
                &self,
                _ids: &[String],
                _status: OrderStatus,
            ) -> crate::db::repository::RepoResult<u64> {
                Ok(0)
            }
            async fn delete(&self, _id: &str) -> crate::db::repository::RepoResult<bool> {
                Ok(false)
            }
            async fn distinct_customer_emails(
                &self,
            ) -> crate::db::repository::RepoResult<Vec<String>> {
                Ok(Vec::new())
            }
            async fn all(&self) -> crate::db::repository::RepoResult<Vec<Order>> {
                Ok(Vec::new())
            }
        }

        let ingestor = OrderIngestor::new(Arc::new(DuplicateRepo), RecordingSender::new(false));
        let err = ingestor.ingest(valid_request()).await.unwrap_err();
        assert!(matches!(err, IngestError::DuplicateOrderNumber));
    }
}
