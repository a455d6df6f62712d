//! Route definitions for the Opsline inventory API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/kitchen", kitchen_routes())
        .nest("/items", item_routes())
        .nest("/stock", stock_routes())
}

/// Kitchen refill routes
fn kitchen_routes() -> Router<AppState> {
    Router::new()
        .route("/refill", post(handlers::refill_kitchen))
        .route("/refill/validate", post(handlers::validate_refill))
}

/// Item and recipe routes
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/:item_id", get(handlers::get_item))
        .route("/:item_id/requirements", get(handlers::get_item_requirements))
}

/// Stock level and movement routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/levels/items/:item_id/locations/:location_id",
            get(handlers::get_stock_level),
        )
        .route("/movements", post(handlers::record_movement))
        .route("/movements/items/:item_id", get(handlers::get_item_movements))
        .route(
            "/movements/reference/:reference_type/:reference_id",
            get(handlers::get_movements_by_reference),
        )
}
