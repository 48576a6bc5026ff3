//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{Order, OrderStatus};
use crate::db::repository::{OrderFilter, OrderSort, Page, SortField, SortOrder};
use crate::orders::{DashboardSnapshot, OrderRequest};
use crate::utils::{AppError, AppResult, time};

/// Query params for listing orders
///
/// Dates accept RFC 3339 or plain YYYY-MM-DD (resolved to midnight in the
/// business timezone). Unknown `sortBy` values fall back to orderDate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub status: Option<String>,
    pub city: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    100
}

fn default_sort_by() -> String {
    "orderDate".to_string()
}

fn default_sort_order() -> String {
    "desc".to_string()
}

/// Paginated listing response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
    pub total_pages: u64,
    pub current_page: i64,
    pub total: u64,
}

/// List orders with filtering, sorting and pagination
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<OrderListResponse>> {
    let tz = state.config.timezone;
    let filter = OrderFilter {
        status: query.status.filter(|s| !s.is_empty()),
        city: query.city.filter(|c| !c.is_empty()),
        start_date: query
            .start_date
            .as_deref()
            .map(|d| time::parse_datetime_param(d, tz))
            .transpose()?,
        end_date: query
            .end_date
            .as_deref()
            .map(|d| time::parse_datetime_param(d, tz))
            .transpose()?,
    };
    let sort = OrderSort {
        field: SortField::parse(&query.sort_by),
        order: SortOrder::parse(&query.sort_order),
    };
    let page = Page {
        page: query.page.max(1),
        limit: query.limit.max(1),
    };

    let orders = state.repo.find(&filter, sort, page).await?;
    let total = state.repo.count(&filter).await?;

    Ok(Json(OrderListResponse {
        orders,
        total_pages: total.div_ceil(page.limit as u64),
        current_page: page.page,
        total,
    }))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state
        .repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;
    Ok(Json(order))
}

/// Create response wrapper
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub message: String,
    pub order: Order,
}

/// Submit a new order
pub async fn create(
    State(state): State<ServerState>,
    Json(request): Json<OrderRequest>,
) -> AppResult<(StatusCode, Json<CreateOrderResponse>)> {
    let order = state.ingestor.ingest(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            message: "Order created successfully".to_string(),
            order,
        }),
    ))
}

/// Operator-editable fields
///
/// The update surface is deliberately narrow: totals, products and
/// customer data are immutable after ingestion.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub note: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateOrderResponse {
    pub message: String,
    pub order: Order,
}

/// Update an order's operator-editable fields
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateOrderRequest>,
) -> AppResult<Json<UpdateOrderResponse>> {
    let mut order = state
        .repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    if let Some(status) = &request.status {
        order.status = OrderStatus::parse(status)
            .ok_or_else(|| AppError::validation(format!("Invalid status: {}", status)))?;
    }
    if let Some(note) = request.note {
        order.note = note;
    }
    if let Some(payment_method) = request.payment_method {
        order.payment_method = payment_method;
    }

    let order = state.repo.update(&id, order).await?;
    Ok(Json(UpdateOrderResponse {
        message: "Order updated successfully".to_string(),
        order,
    }))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Delete an order
pub async fn delete_order(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    if !state.repo.delete(&id).await? {
        return Err(AppError::not_found("Order not found"));
    }
    Ok(Json(MessageResponse {
        message: "Order deleted successfully".to_string(),
    }))
}

/// Dashboard statistics
pub async fn dashboard(State(state): State<ServerState>) -> AppResult<Json<DashboardSnapshot>> {
    let snapshot = state.analytics.compute_snapshot().await?;
    Ok(Json(snapshot))
}

/// Resend the confirmation for an existing order
///
/// Unlike the create path this awaits delivery and surfaces failure.
pub async fn resend_email(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.ingestor.resend_confirmation(&id).await?;
    Ok(Json(MessageResponse {
        message: "Order confirmation email sent successfully".to_string(),
    }))
}

/// Bulk status update request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusRequest {
    #[serde(default)]
    pub order_ids: Vec<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusResponse {
    pub message: String,
    pub modified_count: u64,
}

/// Apply one status to many orders; unknown ids are skipped
pub async fn bulk_status(
    State(state): State<ServerState>,
    Json(request): Json<BulkStatusRequest>,
) -> AppResult<Json<BulkStatusResponse>> {
    let status = match request.status.as_deref() {
        Some(s) if !s.is_empty() && !request.order_ids.is_empty() => s,
        _ => return Err(AppError::validation("Order IDs and status are required")),
    };
    let status = OrderStatus::parse(status)
        .ok_or_else(|| AppError::validation(format!("Invalid status: {}", status)))?;

    let modified_count = state
        .repo
        .update_status_bulk(&request.order_ids, status)
        .await?;

    Ok(Json(BulkStatusResponse {
        message: format!("Updated {} orders to status: {}", modified_count, status),
        modified_count,
    }))
}
