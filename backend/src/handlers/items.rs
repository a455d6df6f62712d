//! HTTP handlers for item and recipe endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{ItemId, ItemWithIngredients, RawMaterialRequirement};

use crate::error::AppResult;
use crate::services::ItemService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RequirementsQuery {
    pub quantity: Decimal,
}

/// Get an item with its recipe lines
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
) -> AppResult<Json<ItemWithIngredients>> {
    let service = ItemService::new(state.db);
    let item = service.get_item_with_ingredients(item_id).await?;
    Ok(Json(item))
}

/// Preview the raw materials needed to produce a quantity of an item
pub async fn get_item_requirements(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
    Query(query): Query<RequirementsQuery>,
) -> AppResult<Json<Vec<RawMaterialRequirement>>> {
    let service = ItemService::new(state.db);
    let requirements = service
        .calculate_requirements(item_id, query.quantity, state.config.refill.quantity_scale)
        .await?;
    Ok(Json(requirements))
}
