//! HTTP handlers for kitchen refill endpoints

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use shared::{ItemId, RefillRequest, RefillResult, StockShortage};

use crate::error::AppResult;
use crate::middleware::Operator;
use crate::services::RefillKitchenService;
use crate::AppState;

/// Produce prepared items from raw materials at a kitchen location
pub async fn refill_kitchen(
    State(state): State<AppState>,
    Operator(performed_by): Operator,
    Json(request): Json<RefillRequest>,
) -> AppResult<(StatusCode, Json<RefillResult>)> {
    let service = RefillKitchenService::new(state.db, state.config.refill.clone());
    let result = service.refill_kitchen_items(request, performed_by).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Check a refill against current stock; an empty map means it can proceed
pub async fn validate_refill(
    State(state): State<AppState>,
    Json(request): Json<RefillRequest>,
) -> AppResult<Json<BTreeMap<ItemId, StockShortage>>> {
    let service = RefillKitchenService::new(state.db, state.config.refill.clone());
    let shortages = service.validate_sufficient_stock(&request).await?;
    Ok(Json(shortages))
}
