//! Orders API Module
//!
//! Order intake, operator queries and mutations, and the dashboard
//! statistics endpoint.
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /orders | GET | Filtered, sorted, paginated listing |
//! | /orders | POST | Submit a new order |
//! | /orders/stats/dashboard | GET | Dashboard statistics |
//! | /orders/bulk/status | PATCH | Bulk status update |
//! | /orders/{id} | GET/PUT/DELETE | Single-order operations |
//! | /orders/{id}/resend-email | POST | Manual confirmation resend |

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/orders", get(handler::list).post(handler::create))
        // Static segments registered before /{id} captures
        .route("/orders/stats/dashboard", get(handler::dashboard))
        .route("/orders/bulk/status", patch(handler::bulk_status))
        .route("/orders/{id}/resend-email", post(handler::resend_email))
        .route(
            "/orders/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete_order),
        )
}
