//! WebAssembly module for the Opsline inventory platform
//!
//! Lets the kitchen client preview a refill offline:
//! - Raw-material requirements of a prepared item
//! - Shortages against a snapshot of available stock

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;

use shared::{decompose, find_shortages, validate_refill_quantity, RecipeBook};

/// Raw materials consumed by producing `quantity` of `item_id`.
///
/// `recipe_book_json` is a list of items with their recipe lines; `quantity`
/// is a decimal string. Returns the requirements as a JSON list.
#[wasm_bindgen]
pub fn preview_raw_materials(
    recipe_book_json: &str,
    item_id: i64,
    quantity: &str,
) -> Result<String, JsValue> {
    raw_materials_json(recipe_book_json, item_id, quantity).map_err(|e| JsValue::from_str(&e))
}

/// Shortages of `requirements_json` against `available_json`.
///
/// `available_json` maps item ids to available quantities. Returns a JSON
/// object keyed by item id; `{}` means nothing is short.
#[wasm_bindgen]
pub fn check_shortages(requirements_json: &str, available_json: &str) -> Result<String, JsValue> {
    shortages_json(requirements_json, available_json).map_err(|e| JsValue::from_str(&e))
}

fn raw_materials_json(
    recipe_book_json: &str,
    item_id: ItemId,
    quantity: &str,
) -> Result<String, String> {
    let book: RecipeBook = serde_json::from_str(recipe_book_json)
        .map_err(|e| format!("Invalid recipe book JSON: {}", e))?;
    let quantity =
        Decimal::from_str(quantity.trim()).map_err(|e| format!("Invalid quantity: {}", e))?;
    validate_refill_quantity(quantity)?;

    let requirements =
        decompose(&book, item_id, quantity, DEFAULT_QUANTITY_SCALE).map_err(|e| e.to_string())?;
    serde_json::to_string(&requirements).map_err(|e| e.to_string())
}

fn shortages_json(requirements_json: &str, available_json: &str) -> Result<String, String> {
    let requirements: Vec<RawMaterialRequirement> = serde_json::from_str(requirements_json)
        .map_err(|e| format!("Invalid requirements JSON: {}", e))?;
    let available: HashMap<ItemId, Decimal> = serde_json::from_str(available_json)
        .map_err(|e| format!("Invalid stock JSON: {}", e))?;

    serde_json::to_string(&find_shortages(&requirements, &available)).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const BOOK: &str = r#"[
        {"id": 1, "name": "Royal Squad", "unit_type": "PCS", "unit_cost": null, "ingredients": [
            {"ingredient_item_id": 10, "quantity": "500", "unit_type": "G"},
            {"ingredient_item_id": 2, "quantity": "500", "unit_type": "G"},
            {"ingredient_item_id": 13, "quantity": "1", "unit_type": "PCS"}
        ]},
        {"id": 2, "name": "Chocolate Syrup", "unit_type": "G", "unit_cost": null, "ingredients": [
            {"ingredient_item_id": 10, "quantity": "200", "unit_type": "G"},
            {"ingredient_item_id": 11, "quantity": "1000", "unit_type": "G"}
        ]},
        {"id": 10, "name": "Sugar", "unit_type": "G", "unit_cost": "0.02"},
        {"id": 11, "name": "Cacao", "unit_type": "G", "unit_cost": null},
        {"id": 13, "name": "Box", "unit_type": "PCS", "unit_cost": null}
    ]"#;

    #[test]
    fn test_preview_raw_materials() {
        let json = raw_materials_json(BOOK, 1, "2").unwrap();
        let reqs: Vec<RawMaterialRequirement> = serde_json::from_str(&json).unwrap();

        let quantities: Vec<(ItemId, Decimal)> =
            reqs.iter().map(|r| (r.item_id, r.quantity)).collect();
        // 1000 g of syrup drawn from a 1200 g batch
        assert_eq!(
            quantities,
            vec![
                (10, Decimal::from_str("1166.6667").unwrap()),
                (11, Decimal::from_str("833.3333").unwrap()),
                (13, Decimal::from(2)),
            ]
        );
    }

    #[test]
    fn test_preview_rejects_bad_input() {
        assert!(raw_materials_json("not json", 1, "2").is_err());
        assert!(raw_materials_json(BOOK, 1, "two").is_err());
        assert!(raw_materials_json(BOOK, 1, "0").is_err());
        assert_eq!(
            raw_materials_json(BOOK, 1, "1.23456").unwrap_err(),
            "Quantity supports at most 4 decimal places"
        );
        assert_eq!(raw_materials_json(BOOK, 99, "1").unwrap_err(), "Item 99 not found");
    }

    #[test]
    fn test_check_shortages() {
        let requirements = raw_materials_json(BOOK, 1, "2").unwrap();
        let json = shortages_json(&requirements, r#"{"10": "5000", "11": "500"}"#).unwrap();
        let shortages: Value = serde_json::from_str(&json).unwrap();

        let keys: Vec<&String> = shortages.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["11", "13"]);
        assert_eq!(shortages["13"]["available"], "0");
        assert_eq!(shortages["11"]["item_name"], "Cacao");
    }

    #[test]
    fn test_no_shortages_is_empty_object() {
        let requirements = raw_materials_json(BOOK, 1, "1").unwrap();
        let json =
            shortages_json(&requirements, r#"{"10": 5000, "11": 5000, "13": 10}"#).unwrap();
        assert_eq!(json, "{}");
    }
}
