//! Kitchen refill planning
//!
//! A plan is the full set of raw-material requirements of a refill batch,
//! computed before anything is written. Building a plan is all-or-nothing: if
//! any requested item fails to decompose, no plan exists.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::bom::{decompose, RecipeBook};
use crate::error::BomError;
use crate::models::{
    RawMaterialRequirement, RefillRequest, StockMovementType, StockShortage, UnitType,
};
use crate::types::{ItemId, LocationId};

/// One requested item with the raw materials it consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedRefill {
    pub item_id: ItemId,
    pub item_name: String,
    pub unit_type: UnitType,
    pub unit_cost: Option<Decimal>,
    pub quantity: Decimal,
    pub raw_materials: Vec<RawMaterialRequirement>,
}

/// Requirements of a whole refill batch at one location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefillPlan {
    pub location_id: LocationId,
    pub items: Vec<PlannedRefill>,
}

impl RefillPlan {
    /// Decompose every requested item, in request order
    pub fn build(book: &RecipeBook, request: &RefillRequest, scale: u32) -> Result<Self, BomError> {
        let items = request
            .items
            .iter()
            .map(|requested| {
                let item = book.require_active(requested.item_id)?;
                let raw_materials = decompose(book, requested.item_id, requested.quantity, scale)?;
                Ok(PlannedRefill {
                    item_id: item.id,
                    item_name: item.name.clone(),
                    unit_type: item.unit_type,
                    unit_cost: item.unit_cost,
                    quantity: requested.quantity,
                    raw_materials,
                })
            })
            .collect::<Result<Vec<_>, BomError>>()?;

        Ok(Self {
            location_id: request.location_id,
            items,
        })
    }

    /// Raw materials needed by the whole batch, summed across requested items
    pub fn total_requirements(&self) -> Result<Vec<RawMaterialRequirement>, BomError> {
        let mut totals: BTreeMap<ItemId, RawMaterialRequirement> = BTreeMap::new();
        for requirement in self.items.iter().flat_map(|item| &item.raw_materials) {
            match totals.get_mut(&requirement.item_id) {
                Some(total) => {
                    total.quantity = total
                        .quantity
                        .checked_add(requirement.quantity)
                        .ok_or(BomError::QuantityOverflow {
                            item_id: requirement.item_id,
                        })?;
                }
                None => {
                    totals.insert(requirement.item_id, requirement.clone());
                }
            }
        }
        Ok(totals.into_values().collect())
    }

    /// Every item whose stock level the batch changes, ascending
    pub fn touched_item_ids(&self) -> Vec<ItemId> {
        let ids: BTreeSet<ItemId> = self
            .items
            .iter()
            .flat_map(|item| {
                std::iter::once(item.item_id).chain(item.raw_materials.iter().map(|raw| raw.item_id))
            })
            .collect();
        ids.into_iter().collect()
    }
}

/// One stock movement booked by a refill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefillBooking {
    pub item_id: ItemId,
    pub movement_type: StockMovementType,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
}

impl PlannedRefill {
    /// Movements producing this item, in booking order.
    ///
    /// Raw materials are booked out before the item is booked in. Raw amounts
    /// that round to zero are not booked.
    pub fn bookings(&self, book: &RecipeBook) -> Vec<RefillBooking> {
        self.raw_materials
            .iter()
            .filter(|raw| !raw.quantity.is_zero())
            .map(|raw| RefillBooking {
                item_id: raw.item_id,
                movement_type: StockMovementType::Outbound,
                quantity: raw.quantity,
                unit_cost: book.get(raw.item_id).and_then(|material| material.unit_cost),
            })
            .chain(std::iter::once(RefillBooking {
                item_id: self.item_id,
                movement_type: StockMovementType::Inbound,
                quantity: self.quantity,
                unit_cost: self.unit_cost,
            }))
            .collect()
    }
}

/// Compare requirements with available stock.
///
/// Items without a stock row count as zero available. An empty map means the
/// requirements can be fully satisfied.
pub fn find_shortages(
    requirements: &[RawMaterialRequirement],
    available: &HashMap<ItemId, Decimal>,
) -> BTreeMap<ItemId, StockShortage> {
    requirements
        .iter()
        .filter_map(|requirement| {
            let on_hand = available
                .get(&requirement.item_id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            (on_hand < requirement.quantity).then(|| {
                (
                    requirement.item_id,
                    StockShortage {
                        item_id: requirement.item_id,
                        item_name: requirement.name.clone(),
                        required: requirement.quantity,
                        available: on_hand,
                        shortage: requirement.quantity - on_hand,
                        unit_type: requirement.unit_type,
                    },
                )
            })
        })
        .collect()
}
