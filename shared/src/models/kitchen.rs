//! Kitchen refill request and result models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::UnitType;
use crate::types::{ItemId, LocationId, MovementId};
use crate::validation::validate_quantity_precision;

/// One prepared item to produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefillItemRequest {
    pub item_id: ItemId,
    pub quantity: Decimal,
}

/// Batch refill of prepared items at one kitchen location
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefillRequest {
    pub location_id: LocationId,
    #[validate(
        length(min = 1, message = "At least one item is required"),
        custom = "validate_refill_items"
    )]
    pub items: Vec<RefillItemRequest>,
    #[validate(length(max = 1000))]
    pub remarks: Option<String>,
}

fn validate_refill_items(items: &[RefillItemRequest]) -> Result<(), ValidationError> {
    if items.iter().any(|item| item.quantity <= Decimal::ZERO) {
        let mut err = ValidationError::new("positive_quantity");
        err.message = Some("Quantity must be greater than 0".into());
        return Err(err);
    }
    if let Some(message) = items
        .iter()
        .find_map(|item| validate_quantity_precision(item.quantity).err())
    {
        let mut err = ValidationError::new("quantity_precision");
        err.message = Some(message.into());
        return Err(err);
    }
    Ok(())
}

/// Leaf raw material required to produce something
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterialRequirement {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: Decimal,
    pub unit_type: UnitType,
}

/// Raw material consumed by one refilled item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterialUsage {
    pub ingredient_item_id: ItemId,
    pub ingredient_item_name: String,
    pub total_quantity: Decimal,
    pub unit_type: UnitType,
    pub stock_movement_id: Option<MovementId>,
}

/// Outcome for one requested item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefillItemResult {
    pub item_id: ItemId,
    pub item_name: String,
    pub refill_quantity: Decimal,
    pub raw_materials_used: Vec<RawMaterialUsage>,
    pub inbound_movement_id: MovementId,
}

/// Outcome of a committed refill batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefillResult {
    pub refill_id: Uuid,
    pub location_id: LocationId,
    pub total_items_refilled: usize,
    pub refill_results: Vec<RefillItemResult>,
    pub message: String,
    pub refilled_at: DateTime<Utc>,
}

/// Raw material whose available stock does not cover the requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockShortage {
    pub item_id: ItemId,
    pub item_name: String,
    pub required: Decimal,
    pub available: Decimal,
    pub shortage: Decimal,
    pub unit_type: UnitType,
}
