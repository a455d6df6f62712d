//! Seed data for tests that run against a live database.
//!
//! These tests are `#[ignore]`d; run them with `DATABASE_URL` pointing at a
//! Postgres server and `cargo test -- --ignored`. Each test gets a fresh
//! database with the migrations applied.

use std::str::FromStr;

use rust_decimal::Decimal;
use shared::{ItemId, LocationId};
use sqlx::PgPool;

pub const KITCHEN: LocationId = 1;

pub const BROWNIE: ItemId = 1;
pub const GOLD_BROWNIE: ItemId = 2;
pub const ICED_TEA: ItemId = 3;
pub const BRINE: ItemId = 4;
pub const PICKLE: ItemId = 5;
pub const SUGAR: ItemId = 10;
pub const CACAO: ItemId = 11;
pub const BOX: ItemId = 13;
pub const LID: ItemId = 14;
pub const SALT: ItemId = 15;
pub const WATER: ItemId = 16;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Kitchen with raw materials, prepared items and their recipes.
///
/// `stock` sets the opening stock of raw materials at the kitchen.
pub async fn seed_kitchen(pool: &PgPool, stock: &[(ItemId, &str)]) {
    sqlx::query("INSERT INTO locations (id, name) VALUES ($1, 'Main Kitchen')")
        .bind(KITCHEN)
        .execute(pool)
        .await
        .unwrap();

    // Gold Brownie's unit cost makes the total cost of a large inbound
    // movement overflow its NUMERIC(18,4) column
    let items: [(ItemId, &str, &str, Option<&str>); 11] = [
        (SUGAR, "Sugar", "G", Some("0.02")),
        (CACAO, "Cacao", "G", Some("0.10")),
        (BOX, "Box", "PCS", Some("1.50")),
        (LID, "Lid", "PCS", Some("0.50")),
        (SALT, "Salt", "G", None),
        (WATER, "Water", "ML", None),
        (BROWNIE, "Brownie", "PCS", Some("25")),
        (GOLD_BROWNIE, "Gold Brownie", "PCS", Some("90000000000000")),
        (ICED_TEA, "Iced Tea", "PCS", Some("15")),
        (BRINE, "Brine", "ML", None),
        (PICKLE, "Pickle", "PCS", None),
    ];
    for (id, name, unit_type, unit_cost) in items {
        sqlx::query(
            "INSERT INTO items (id, item_code, name, unit_type, unit_cost) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(format!("ITM-{:03}", id))
        .bind(name)
        .bind(unit_type)
        .bind(unit_cost.map(dec))
        .execute(pool)
        .await
        .unwrap();
    }

    let lines: [(ItemId, ItemId, &str, &str); 9] = [
        (BROWNIE, SUGAR, "50", "G"),
        (BROWNIE, CACAO, "20", "G"),
        (GOLD_BROWNIE, SUGAR, "10", "G"),
        (GOLD_BROWNIE, BOX, "1", "PCS"),
        (ICED_TEA, SUGAR, "20", "G"),
        (ICED_TEA, LID, "1", "PCS"),
        (BRINE, SALT, "1", "G"),
        (BRINE, WATER, "99999", "ML"),
        (PICKLE, BRINE, "1", "ML"),
    ];
    for (item_id, ingredient_item_id, quantity, unit_type) in lines {
        sqlx::query(
            "INSERT INTO item_ingredients (item_id, ingredient_item_id, quantity, unit_type) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(item_id)
        .bind(ingredient_item_id)
        .bind(dec(quantity))
        .bind(unit_type)
        .execute(pool)
        .await
        .unwrap();
    }

    for (item_id, quantity) in stock {
        sqlx::query(
            "INSERT INTO stock_levels (item_id, location_id, current_stock) VALUES ($1, $2, $3)",
        )
        .bind(item_id)
        .bind(KITCHEN)
        .bind(dec(quantity))
        .execute(pool)
        .await
        .unwrap();
    }
}

/// Current stock at the kitchen; zero when the item has no stock row
pub async fn stock_of(pool: &PgPool, item_id: ItemId) -> Decimal {
    sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE((SELECT current_stock FROM stock_levels \
         WHERE item_id = $1 AND location_id = $2), 0)",
    )
    .bind(item_id)
    .bind(KITCHEN)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn movement_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stock_movements")
        .fetch_one(pool)
        .await
        .unwrap()
}
