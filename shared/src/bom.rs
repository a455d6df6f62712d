//! Recipe (bill of materials) decomposition
//!
//! Expands a request to produce N units of an item into the flat list of leaf
//! raw materials it consumes. Recipes nest: an ingredient may itself be a
//! prepared item with its own recipe.
//!
//! Scaling depends on depth. Lines of the requested item are quantities per
//! unit of output and are simply multiplied by the requested quantity. Lines
//! of a nested recipe describe one batch of that recipe, whose output is the
//! sum of its line quantities, so they are scaled by `needed / batch_output`.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BomError;
use crate::models::{RawMaterialRequirement, RecipeItem, UnitType};
use crate::types::{round_quantity, ItemId};

/// In-memory recipe graph: every item reachable from the items being produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<RecipeItem>", into = "Vec<RecipeItem>")]
pub struct RecipeBook {
    items: HashMap<ItemId, RecipeItem>,
}

impl RecipeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: RecipeItem) {
        self.items.insert(item.id, item);
    }

    pub fn get(&self, item_id: ItemId) -> Option<&RecipeItem> {
        self.items.get(&item_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an item, failing with `ItemNotFound`
    pub fn require(&self, item_id: ItemId) -> Result<&RecipeItem, BomError> {
        self.get(item_id).ok_or(BomError::ItemNotFound(item_id))
    }

    /// Look up an item that may be requested for production
    pub fn require_active(&self, item_id: ItemId) -> Result<&RecipeItem, BomError> {
        let item = self.require(item_id)?;
        if !item.status.is_active() {
            return Err(BomError::ItemNotFound(item_id));
        }
        Ok(item)
    }
}

impl FromIterator<RecipeItem> for RecipeBook {
    fn from_iter<I: IntoIterator<Item = RecipeItem>>(iter: I) -> Self {
        let mut book = RecipeBook::new();
        for item in iter {
            book.insert(item);
        }
        book
    }
}

impl From<Vec<RecipeItem>> for RecipeBook {
    fn from(items: Vec<RecipeItem>) -> Self {
        items.into_iter().collect()
    }
}

impl From<RecipeBook> for Vec<RecipeItem> {
    fn from(book: RecipeBook) -> Self {
        let mut items: Vec<RecipeItem> = book.items.into_values().collect();
        items.sort_by_key(|item| item.id);
        items
    }
}

/// Leaf quantities summed by raw material id
#[derive(Debug, Default)]
struct RawMaterialTotals {
    totals: BTreeMap<ItemId, (Decimal, UnitType)>,
}

impl RawMaterialTotals {
    fn add(&mut self, item_id: ItemId, quantity: Decimal, unit_type: UnitType) -> Option<()> {
        match self.totals.get_mut(&item_id) {
            // Units are taken from the first line that reached this material
            Some((total, _)) => *total = total.checked_add(quantity)?,
            None => {
                self.totals.insert(item_id, (quantity, unit_type));
            }
        }
        Some(())
    }

    /// Add `quantity` units of a nested recipe whose per-unit leaves are known
    fn add_scaled(&mut self, per_unit: &RawMaterialTotals, quantity: Decimal) -> Option<()> {
        for (item_id, (ratio, unit_type)) in &per_unit.totals {
            self.add(*item_id, ratio.checked_mul(quantity)?, *unit_type)?;
        }
        Some(())
    }

    fn into_requirements(self, book: &RecipeBook, scale: u32) -> Vec<RawMaterialRequirement> {
        self.totals
            .into_iter()
            .map(|(item_id, (quantity, unit_type))| RawMaterialRequirement {
                item_id,
                name: book
                    .get(item_id)
                    .map(|item| item.name.clone())
                    .unwrap_or_default(),
                quantity: round_quantity(quantity, scale),
                unit_type,
            })
            .collect()
    }
}

/// Compute the raw materials consumed by producing `quantity` of `item_id`.
///
/// The result holds one entry per distinct raw material, sorted by item id.
/// A raw item requested directly consumes nothing and yields an empty list.
pub fn decompose(
    book: &RecipeBook,
    item_id: ItemId,
    quantity: Decimal,
    scale: u32,
) -> Result<Vec<RawMaterialRequirement>, BomError> {
    let item = book.require_active(item_id)?;
    let mut totals = RawMaterialTotals::default();
    if item.has_ingredient() {
        let mut expansion = Expansion::new(book);
        expansion.add_lines(item, LineScale::PerUnit(quantity), &mut totals)?;
    }
    Ok(totals.into_requirements(book, scale))
}

/// How the line quantities of a recipe become required amounts
#[derive(Debug, Clone, Copy)]
enum LineScale {
    /// Lines are per unit of output, times the amount needed
    PerUnit(Decimal),
    /// Lines make one batch yielding this much, scaled to one unit of output
    PerBatch(Decimal),
}

impl LineScale {
    /// Scale of a nested recipe; a zero batch output counts lines per unit
    fn nested(item: &RecipeItem) -> Option<Self> {
        let base = item.recipe_base()?;
        Some(if base.is_zero() {
            LineScale::PerUnit(Decimal::ONE)
        } else {
            LineScale::PerBatch(base)
        })
    }

    fn apply(self, line_quantity: Decimal) -> Option<Decimal> {
        match self {
            LineScale::PerUnit(quantity) => line_quantity.checked_mul(quantity),
            LineScale::PerBatch(base) => line_quantity.checked_div(base),
        }
    }
}

/// Depth-first walk of the recipe graph.
///
/// Nested recipes scale linearly with the amount pulled from them, so the
/// leaves of one unit of each nested recipe are computed once and reused by
/// every path that reaches it.
struct Expansion<'a> {
    book: &'a RecipeBook,
    path: Vec<ItemId>,
    per_unit: HashMap<ItemId, RawMaterialTotals>,
}

impl<'a> Expansion<'a> {
    fn new(book: &'a RecipeBook) -> Self {
        Self {
            book,
            path: Vec::new(),
            per_unit: HashMap::new(),
        }
    }

    fn add_lines(
        &mut self,
        item: &RecipeItem,
        scale: LineScale,
        totals: &mut RawMaterialTotals,
    ) -> Result<(), BomError> {
        let book = self.book;
        let overflow = || BomError::QuantityOverflow { item_id: item.id };

        self.path.push(item.id);
        for line in item.active_ingredients() {
            let required = scale.apply(line.quantity).ok_or_else(overflow)?;
            let component = book.require(line.ingredient_item_id)?;
            if component.has_ingredient() {
                self.expand_nested(component)?;
                if let Some(leaves) = self.per_unit.get(&component.id) {
                    totals.add_scaled(leaves, required).ok_or_else(overflow)?;
                }
            } else {
                totals
                    .add(component.id, required, line.unit_type)
                    .ok_or_else(overflow)?;
            }
        }
        self.path.pop();

        Ok(())
    }

    /// Record the leaves of one unit of a nested recipe, unless already known
    fn expand_nested(&mut self, item: &RecipeItem) -> Result<(), BomError> {
        if self.per_unit.contains_key(&item.id) {
            return Ok(());
        }
        if self.path.contains(&item.id) {
            let mut cycle = self.path.clone();
            cycle.push(item.id);
            return Err(BomError::CyclicRecipe {
                item_id: item.id,
                path: cycle,
            });
        }

        let scale =
            LineScale::nested(item).ok_or(BomError::QuantityOverflow { item_id: item.id })?;
        let mut leaves = RawMaterialTotals::default();
        self.add_lines(item, scale, &mut leaves)?;
        self.per_unit.insert(item.id, leaves);
        Ok(())
    }
}
