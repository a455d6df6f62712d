//! Stock level and stock movement models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParseEnumError;
use crate::types::{ItemId, LocationId, MovementId, OperatorId, StockEffect};

/// Types of stock movements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockMovementType {
    Inbound,
    Outbound,
    Transfer,
    Waste,
    Damage,
    Expired,
    Adjustment,
}

impl StockMovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockMovementType::Inbound => "INBOUND",
            StockMovementType::Outbound => "OUTBOUND",
            StockMovementType::Transfer => "TRANSFER",
            StockMovementType::Waste => "WASTE",
            StockMovementType::Damage => "DAMAGE",
            StockMovementType::Expired => "EXPIRED",
            StockMovementType::Adjustment => "ADJUSTMENT",
        }
    }

    /// How a movement of this type changes the stock level
    pub fn effect(&self) -> StockEffect {
        match self {
            StockMovementType::Inbound => StockEffect::Increase,
            StockMovementType::Outbound
            | StockMovementType::Waste
            | StockMovementType::Damage
            | StockMovementType::Expired => StockEffect::Decrease,
            StockMovementType::Adjustment => StockEffect::Signed,
            // Transfers move stock between two locations and are booked by the transfer workflow
            StockMovementType::Transfer => StockEffect::None,
        }
    }

    /// Signed change to `current_stock` for a movement of `quantity`
    pub fn stock_delta(&self, quantity: Decimal) -> Decimal {
        match self.effect() {
            StockEffect::Increase => quantity.abs(),
            StockEffect::Decrease => -quantity.abs(),
            StockEffect::Signed => quantity,
            StockEffect::None => Decimal::ZERO,
        }
    }
}

impl std::fmt::Display for StockMovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for StockMovementType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "INBOUND" => Ok(StockMovementType::Inbound),
            "OUTBOUND" => Ok(StockMovementType::Outbound),
            "TRANSFER" => Ok(StockMovementType::Transfer),
            "WASTE" => Ok(StockMovementType::Waste),
            "DAMAGE" => Ok(StockMovementType::Damage),
            "EXPIRED" => Ok(StockMovementType::Expired),
            "ADJUSTMENT" => Ok(StockMovementType::Adjustment),
            _ => Err(ParseEnumError::new("stock movement type", value)),
        }
    }
}

/// Stock of one item at one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub id: i64,
    pub item_id: ItemId,
    pub location_id: LocationId,
    pub current_stock: Decimal,
    pub reserved_stock: Decimal,
    pub available_stock: Decimal,
    pub par_level_min: Decimal,
    pub par_level_max: Decimal,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result of applying a signed delta to a stock level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub previous: Decimal,
    pub current: Decimal,
    /// Set when a decrement exceeded the stock on hand and was cut at zero
    pub clamped: bool,
}

/// Apply `delta` to `current`, never going below zero
pub fn apply_stock_delta(current: Decimal, delta: Decimal) -> StockChange {
    let next = current + delta;
    if next < Decimal::ZERO {
        StockChange {
            previous: current,
            current: Decimal::ZERO,
            clamped: true,
        }
    } else {
        StockChange {
            previous: current,
            current: next,
            clamped: false,
        }
    }
}

impl StockLevel {
    /// Apply a signed delta, keeping `available_stock` consistent
    pub fn apply_delta(&mut self, delta: Decimal) -> StockChange {
        let change = apply_stock_delta(self.current_stock, delta);
        self.current_stock = change.current;
        self.available_stock = self.current_stock - self.reserved_stock;
        change
    }
}

/// Append-only stock ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub item_id: ItemId,
    pub location_id: LocationId,
    pub movement_type: StockMovementType,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    /// Groups the rows written by one refill batch
    pub correlation_id: Option<Uuid>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub remarks: Option<String>,
    pub performed_by: Option<OperatorId>,
    pub movement_date: DateTime<Utc>,
}

/// Total cost of a movement, when the unit cost is known
pub fn movement_total_cost(unit_cost: Option<Decimal>, quantity: Decimal) -> Option<Decimal> {
    unit_cost.and_then(|cost| cost.checked_mul(quantity.abs()))
}
