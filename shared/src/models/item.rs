//! Item and recipe (bill of materials) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;
use crate::types::ItemId;

/// An inventory item: a raw material or a prepared (composite) product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub item_code: String,
    pub name: String,
    pub unit_type: UnitType,
    pub unit_cost: Option<Decimal>,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Active,
    Inactive,
    Deleted,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Active => "active",
            ItemStatus::Inactive => "inactive",
            ItemStatus::Deleted => "deleted",
        }
    }

    /// Only active items may be requested for production
    pub fn is_active(&self) -> bool {
        matches!(self, ItemStatus::Active)
    }
}

impl TryFrom<String> for ItemStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(ItemStatus::Active),
            "inactive" => Ok(ItemStatus::Inactive),
            "deleted" => Ok(ItemStatus::Deleted),
            _ => Err(ParseEnumError::new("item status", value)),
        }
    }
}

/// Unit of measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitType {
    Pcs,
    Kg,
    G,
    L,
    Ml,
    M2,
    M3,
    Lm,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Pcs => "PCS",
            UnitType::Kg => "KG",
            UnitType::G => "G",
            UnitType::L => "L",
            UnitType::Ml => "ML",
            UnitType::M2 => "M2",
            UnitType::M3 => "M3",
            UnitType::Lm => "LM",
        }
    }
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for UnitType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "PCS" => Ok(UnitType::Pcs),
            "KG" => Ok(UnitType::Kg),
            "G" => Ok(UnitType::G),
            "L" => Ok(UnitType::L),
            "ML" => Ok(UnitType::Ml),
            "M2" => Ok(UnitType::M2),
            "M3" => Ok(UnitType::M3),
            "LM" => Ok(UnitType::Lm),
            _ => Err(ParseEnumError::new("unit type", value)),
        }
    }
}

/// One line of an item's recipe: `quantity` of `ingredient_item_id` per batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub ingredient_item_id: ItemId,
    pub quantity: Decimal,
    pub unit_type: UnitType,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// An item together with its recipe, as needed by decomposition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeItem {
    pub id: ItemId,
    pub name: String,
    pub unit_type: UnitType,
    pub unit_cost: Option<Decimal>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub ingredients: Vec<RecipeLine>,
}

impl RecipeItem {
    /// Recipe lines that take part in production
    pub fn active_ingredients(&self) -> impl Iterator<Item = &RecipeLine> {
        self.ingredients.iter().filter(|line| line.is_active)
    }

    /// An item is composite when at least one active recipe line exists
    pub fn has_ingredient(&self) -> bool {
        self.active_ingredients().next().is_some()
    }

    /// Total output of one batch of this item's recipe, `None` on overflow
    pub fn recipe_base(&self) -> Option<Decimal> {
        self.active_ingredients()
            .try_fold(Decimal::ZERO, |base, line| base.checked_add(line.quantity))
    }
}

/// Recipe line enriched with the ingredient's name, for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemIngredient {
    pub ingredient_item_id: ItemId,
    pub ingredient_item_name: String,
    pub quantity: Decimal,
    pub unit_type: UnitType,
    pub description: Option<String>,
    pub is_active: bool,
}

/// Item with its recipe lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemWithIngredients {
    #[serde(flatten)]
    pub item: Item,
    pub has_ingredient: bool,
    pub ingredients: Vec<ItemIngredient>,
}
