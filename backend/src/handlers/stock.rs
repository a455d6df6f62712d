//! HTTP handlers for stock levels and stock movements

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{ItemId, LocationId, StockLevel, StockMovement};

use crate::error::AppResult;
use crate::middleware::Operator;
use crate::services::stock::RecordMovementInput;
use crate::services::StockService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MovementHistoryQuery {
    pub location_id: Option<LocationId>,
}

/// Get the stock level of an item at a location
pub async fn get_stock_level(
    State(state): State<AppState>,
    Path((item_id, location_id)): Path<(ItemId, LocationId)>,
) -> AppResult<Json<StockLevel>> {
    let service = StockService::new(state.db);
    let level = service.get_stock_level(item_id, location_id).await?;
    Ok(Json(level))
}

/// Record a standalone stock movement
pub async fn record_movement(
    State(state): State<AppState>,
    Operator(performed_by): Operator,
    Json(input): Json<RecordMovementInput>,
) -> AppResult<(StatusCode, Json<StockMovement>)> {
    let service = StockService::new(state.db);
    let movement = service.record_movement(input, performed_by).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// Movement history of an item, newest first
pub async fn get_item_movements(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
    Query(query): Query<MovementHistoryQuery>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let service = StockService::new(state.db);
    let movements = service
        .get_item_movement_history(item_id, query.location_id)
        .await?;
    Ok(Json(movements))
}

/// Movements written for a business reference such as a refill
pub async fn get_movements_by_reference(
    State(state): State<AppState>,
    Path((reference_type, reference_id)): Path<(String, i64)>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let service = StockService::new(state.db);
    let movements = service
        .get_movements_by_reference(&reference_type, reference_id)
        .await?;
    Ok(Json(movements))
}
