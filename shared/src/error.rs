//! Domain errors raised by the pure inventory logic

use thiserror::Error;

use crate::types::ItemId;

/// Errors from recipe (bill of materials) decomposition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BomError {
    #[error("Item {0} not found")]
    ItemNotFound(ItemId),

    #[error("Recipe of item {item_id} is cyclic (path: {})", format_path(.path))]
    CyclicRecipe { item_id: ItemId, path: Vec<ItemId> },

    #[error("Quantity overflow computing requirements of item {item_id}")]
    QuantityOverflow { item_id: ItemId },
}

/// Error returned when a stored enum value is not recognised
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

fn format_path(path: &[ItemId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
