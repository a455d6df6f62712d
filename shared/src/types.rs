//! Common types used across the platform

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Database identifier of an item
pub type ItemId = i64;

/// Database identifier of a location (kitchen, store, warehouse)
pub type LocationId = i64;

/// Database identifier of a stock movement
pub type MovementId = i64;

/// Operator identifier recorded as `performed_by` on movements
pub type OperatorId = i64;

/// Number of decimal places kept on computed quantities
pub const DEFAULT_QUANTITY_SCALE: u32 = 4;

/// Decimal places of every persisted quantity column (`NUMERIC(18,4)`)
pub const STORED_QUANTITY_SCALE: u32 = 4;

/// Reference type written on movements emitted by a kitchen refill
pub const REFILL_REFERENCE_TYPE: &str = "REFILL_KITCHEN";

/// Round a computed quantity to `scale` decimal places (midpoint away from zero)
pub fn round_quantity(quantity: Decimal, scale: u32) -> Decimal {
    quantity.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Stock direction implied by a movement type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockEffect {
    Increase,
    Decrease,
    /// Quantity is applied with its own sign
    Signed,
    None,
}
