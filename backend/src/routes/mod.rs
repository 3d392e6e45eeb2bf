//! Route definitions for the Spare Parts Management Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - inventory
        .nest("/inventory", inventory_routes())
        // Protected routes - stock ledger
        .nest("/transactions", transaction_routes())
        // Protected routes - procurement
        .nest("/purchasing", purchasing_routes())
        // Protected routes - suppliers
        .nest("/suppliers", supplier_routes())
        // Protected routes - order schedules
        .nest("/orderschedules", schedule_routes())
        // Protected routes - dashboard
        .nest("/dashboard", dashboard_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Inventory routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_inventory).post(handlers::create_inventory_item),
        )
        .route("/bulk-update", post(handlers::bulk_update_inventory))
        .route("/bulk-delete", post(handlers::bulk_delete_inventory))
        .route("/low-stock", get(handlers::list_low_stock))
        .route(
            "/reorder-suggestions",
            get(handlers::list_reorder_suggestions),
        )
        .route(
            "/:item_id",
            get(handlers::get_inventory_item)
                .put(handlers::update_inventory_item)
                .delete(handlers::delete_inventory_item),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock ledger routes (protected)
fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_transactions).post(handlers::record_transaction),
        )
        .route(
            "/:txn_id",
            get(handlers::get_transaction)
                .put(handlers::amend_transaction)
                .delete(handlers::delete_transaction),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Procurement routes (protected)
fn purchasing_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/pr",
            get(handlers::list_purchase_requests).post(handlers::create_purchase_request),
        )
        .route("/pr/:pr_id", get(handlers::get_purchase_request))
        .route("/pr/:pr_id/approve", post(handlers::approve_purchase_request))
        .route(
            "/pr/:pr_id/convert-to-po",
            post(handlers::convert_to_purchase_order),
        )
        .route("/po", get(handlers::list_purchase_orders))
        .route("/po/:po_id", get(handlers::get_purchase_order))
        .route("/po/:po_id/receive", post(handlers::receive_purchase_order))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Supplier routes (protected)
fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route("/bulk-update", post(handlers::bulk_update_suppliers))
        .route(
            "/:supplier_id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::delete_supplier),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Order schedule routes (protected)
fn schedule_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_schedules).post(handlers::create_schedule),
        )
        .route(
            "/:schedule_id",
            get(handlers::get_schedule)
                .put(handlers::update_schedule)
                .delete(handlers::delete_schedule),
        )
        .route(
            "/:schedule_id/status",
            axum::routing::patch(handlers::set_schedule_status),
        )
        .route("/:schedule_id/reschedule", post(handlers::reschedule))
        .route("/:schedule_id/receive", post(handlers::receive_schedule))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Dashboard routes (protected)
fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(handlers::dashboard_summary))
        .route_layer(middleware::from_fn(auth_middleware))
}
