//! Validation utilities for the Opsline inventory platform

use rust_decimal::Decimal;

use crate::models::StockMovementType;
use crate::types::STORED_QUANTITY_SCALE;

// ============================================================================
// Quantity Validations
// ============================================================================

/// Validate a production or refill quantity
pub fn validate_refill_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be greater than 0");
    }
    validate_quantity_precision(quantity)
}

/// Reject quantities finer than the stored precision; trailing zeros are fine
pub fn validate_quantity_precision(quantity: Decimal) -> Result<(), &'static str> {
    if quantity.normalize().scale() > STORED_QUANTITY_SCALE {
        return Err("Quantity supports at most 4 decimal places");
    }
    Ok(())
}

/// Validate the quantity of a stock movement for its type.
///
/// Adjustments carry a sign and only have to be non-zero; every other
/// movement type states a positive amount.
pub fn validate_movement_quantity(
    movement_type: StockMovementType,
    quantity: Decimal,
) -> Result<(), &'static str> {
    match movement_type {
        StockMovementType::Adjustment if quantity.is_zero() => {
            return Err("Adjustment quantity must not be zero");
        }
        StockMovementType::Adjustment => {}
        _ if quantity <= Decimal::ZERO => return Err("Quantity must be greater than zero"),
        _ => {}
    }
    validate_quantity_precision(quantity)
}

/// Validate a unit cost, when given
pub fn validate_unit_cost(unit_cost: Option<Decimal>) -> Result<(), &'static str> {
    match unit_cost {
        Some(cost) if cost < Decimal::ZERO => Err("Unit cost cannot be negative"),
        _ => Ok(()),
    }
}

/// Validate the number of decimal places kept on computed quantities.
///
/// Computed quantities are booked as movements, so they may not be finer than
/// the stored precision.
pub fn validate_quantity_scale(scale: u32) -> Result<(), &'static str> {
    if scale > STORED_QUANTITY_SCALE {
        return Err("Quantity scale must be at most 4");
    }
    Ok(())
}

// ============================================================================
// Reference Validations
// ============================================================================

/// Validate a movement reference type (e.g. "PO", "TRANSFER", "REFILL_KITCHEN")
pub fn validate_reference_type(reference_type: &str) -> Result<(), &'static str> {
    if reference_type.is_empty() || reference_type.len() > 50 {
        return Err("Reference type must be 1-50 characters");
    }
    if !reference_type
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return Err("Reference type must be uppercase alphanumeric or underscore");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_refill_quantity() {
        assert!(validate_refill_quantity(dec("0.5")).is_ok());
        assert!(validate_refill_quantity(Decimal::ZERO).is_err());
        assert!(validate_refill_quantity(dec("-3")).is_err());
    }

    #[test]
    fn test_quantity_finer_than_storage_is_rejected() {
        assert!(validate_refill_quantity(dec("1.2345")).is_ok());
        assert!(validate_refill_quantity(dec("1.23450000")).is_ok());
        assert!(validate_refill_quantity(dec("1.23456")).is_err());
        assert!(validate_refill_quantity(dec("0.00001")).is_err());
        assert!(validate_movement_quantity(StockMovementType::Inbound, dec("0.00004")).is_err());
        assert!(validate_movement_quantity(StockMovementType::Adjustment, dec("-0.00001")).is_err());
        assert!(validate_movement_quantity(StockMovementType::Adjustment, dec("-0.0001")).is_ok());
    }

    #[test]
    fn test_validate_movement_quantity_positive_types() {
        for movement_type in [
            StockMovementType::Inbound,
            StockMovementType::Outbound,
            StockMovementType::Waste,
            StockMovementType::Damage,
            StockMovementType::Expired,
            StockMovementType::Transfer,
        ] {
            assert!(validate_movement_quantity(movement_type, dec("1")).is_ok());
            assert!(validate_movement_quantity(movement_type, dec("-1")).is_err());
            assert!(validate_movement_quantity(movement_type, Decimal::ZERO).is_err());
        }
    }

    #[test]
    fn test_validate_adjustment_quantity() {
        assert!(validate_movement_quantity(StockMovementType::Adjustment, dec("-4")).is_ok());
        assert!(validate_movement_quantity(StockMovementType::Adjustment, dec("4")).is_ok());
        assert!(validate_movement_quantity(StockMovementType::Adjustment, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_validate_unit_cost() {
        assert!(validate_unit_cost(None).is_ok());
        assert!(validate_unit_cost(Some(Decimal::ZERO)).is_ok());
        assert!(validate_unit_cost(Some(dec("-0.01"))).is_err());
    }

    #[test]
    fn test_validate_quantity_scale() {
        assert!(validate_quantity_scale(0).is_ok());
        assert!(validate_quantity_scale(4).is_ok());
        assert!(validate_quantity_scale(5).is_err());
        assert!(validate_quantity_scale(28).is_err());
    }

    #[test]
    fn test_validate_reference_type() {
        assert!(validate_reference_type("REFILL_KITCHEN").is_ok());
        assert!(validate_reference_type("PO").is_ok());
        assert!(validate_reference_type("").is_err());
        assert!(validate_reference_type("refill").is_err());
        assert!(validate_reference_type(&"X".repeat(51)).is_err());
    }
}
