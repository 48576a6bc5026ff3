//! Dashboard statistics over a live ingested collection

mod common;

use common::{RecordingSender, ingest, sample_request, test_state};
use order_server::OrderStatus;

#[tokio::test]
async fn status_counts_always_sum_to_total() {
    let sender = RecordingSender::new(false);
    let state = test_state(sender);

    let statuses = OrderStatus::ALL;
    for i in 0..1000 {
        let order = ingest(&state, &sample_request(&format!("c{}@x.c", i % 9), "Tunis")).await;
        state
            .repo
            .update_status_bulk(&[order.id], statuses[i % statuses.len()])
            .await
            .unwrap();
    }

    let snapshot = state.analytics.compute_snapshot().await.unwrap();
    assert_eq!(snapshot.total_orders, 1000);
    let sum = snapshot.pending_orders
        + snapshot.confirmed_orders
        + snapshot.preparing_orders
        + snapshot.shipped_orders
        + snapshot.delivered_orders
        + snapshot.cancelled_orders;
    assert_eq!(sum, snapshot.total_orders);
    assert_eq!(snapshot.orders_by_status.pending, snapshot.pending_orders);
    assert_eq!(snapshot.total_customers, 9);
}

#[tokio::test]
async fn revenue_excludes_cancelled_orders() {
    let sender = RecordingSender::new(false);
    let state = test_state(sender);

    // every sample order totals 29.5
    let kept = ingest(&state, &sample_request("a@x.c", "Tunis")).await;
    let cancelled = ingest(&state, &sample_request("b@x.c", "Sfax")).await;
    state
        .repo
        .update_status_bulk(&[cancelled.id], OrderStatus::Cancelled)
        .await
        .unwrap();

    let snapshot = state.analytics.compute_snapshot().await.unwrap();
    assert_eq!(snapshot.total_orders, 2);
    assert_eq!(snapshot.total_revenue, kept.order_summary.total_price);
    assert_eq!(snapshot.avg_order_value, kept.order_summary.total_price);
    assert_eq!(snapshot.cancellation_rate, 50.0);
    assert!(!snapshot.revenue_by_status.contains_key("cancelled"));

    // both orders are from today and count toward the time series
    assert_eq!(snapshot.today_orders, 2);
    assert_eq!(snapshot.today_revenue, kept.order_summary.total_price);
    assert_eq!(snapshot.orders_over_time.len(), 1);
    assert_eq!(snapshot.orders_over_time[0].count, 2);
}

#[tokio::test]
async fn empty_store_produces_zeroed_dashboard() {
    let sender = RecordingSender::new(false);
    let state = test_state(sender);

    let snapshot = state.analytics.compute_snapshot().await.unwrap();
    assert_eq!(snapshot.total_orders, 0);
    assert_eq!(snapshot.avg_order_value, 0.0);
    assert_eq!(snapshot.customer_retention_rate, 0.0);
    assert_eq!(snapshot.cancellation_rate, 0.0);
    assert!(snapshot.recent_orders.is_empty());
}

#[tokio::test]
async fn top_products_aggregate_across_orders() {
    let sender = RecordingSender::new(false);
    let state = test_state(sender);

    for i in 0..3 {
        ingest(&state, &sample_request(&format!("c{}@x.c", i), "Tunis")).await;
    }

    let snapshot = state.analytics.compute_snapshot().await.unwrap();
    // sample orders carry Basil x2 and Mint x1
    assert_eq!(snapshot.top_products[0].name, "Basil");
    assert_eq!(snapshot.top_products[0].total_quantity, 6);
    assert_eq!(snapshot.top_products[0].order_count, 3);
    assert_eq!(snapshot.top_products[0].total_revenue, 60.0);
    assert_eq!(snapshot.top_products[1].name, "Mint");
    assert_eq!(snapshot.top_products[1].total_quantity, 3);
}

#[tokio::test]
async fn retention_rate_counts_repeat_emails() {
    let sender = RecordingSender::new(false);
    let state = test_state(sender);

    for email in ["repeat@x.c", "repeat@x.c", "once@x.c", "also-once@x.c"] {
        ingest(&state, &sample_request(email, "Tunis")).await;
    }

    let snapshot = state.analytics.compute_snapshot().await.unwrap();
    assert_eq!(snapshot.total_customers, 3);
    // 1 of 3 distinct customers ordered more than once
    assert_eq!(snapshot.customer_retention_rate, 33.33);
}
