//! Item and recipe (bill of materials) service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    decompose, validate_refill_quantity, Item, ItemId, ItemIngredient, ItemStatus,
    ItemWithIngredients, RawMaterialRequirement, RecipeBook, RecipeItem, RecipeLine, UnitType,
};
use sqlx::{Executor, FromRow, PgPool, Postgres};

use crate::error::{AppError, AppResult};

/// Item service for reading items and their recipes
#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
}

/// Row for item queries
#[derive(Debug, FromRow)]
struct ItemRow {
    id: ItemId,
    item_code: String,
    name: String,
    #[sqlx(try_from = "String")]
    unit_type: UnitType,
    unit_cost: Option<Decimal>,
    #[sqlx(try_from = "String")]
    status: ItemStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            item_code: row.item_code,
            name: row.name,
            unit_type: row.unit_type,
            unit_cost: row.unit_cost,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row for recipe line queries, joined with the ingredient's name
#[derive(Debug, FromRow)]
struct IngredientRow {
    ingredient_item_id: ItemId,
    ingredient_item_name: String,
    quantity: Decimal,
    #[sqlx(try_from = "String")]
    unit_type: UnitType,
    description: Option<String>,
    is_active: bool,
}

/// One reachable item joined with at most one of its active recipe lines
#[derive(Debug, FromRow)]
struct RecipeGraphRow {
    id: ItemId,
    name: String,
    #[sqlx(try_from = "String")]
    unit_type: UnitType,
    unit_cost: Option<Decimal>,
    #[sqlx(try_from = "String")]
    status: ItemStatus,
    ingredient_item_id: Option<ItemId>,
    line_quantity: Option<Decimal>,
    line_unit_type: Option<String>,
}

/// Load every item reachable from `root_ids` through active recipe lines.
///
/// `UNION` (not `UNION ALL`) makes the recursion stop at items already seen,
/// so a cyclic recipe still terminates here and is reported by decomposition.
pub async fn load_recipe_book<'e, E>(executor: E, root_ids: &[ItemId]) -> AppResult<RecipeBook>
where
    E: Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query_as::<_, RecipeGraphRow>(
        r#"
        WITH RECURSIVE reachable(id) AS (
            SELECT id FROM items WHERE id = ANY($1)
            UNION
            SELECT ii.ingredient_item_id
            FROM item_ingredients ii
            JOIN reachable r ON ii.item_id = r.id
            WHERE ii.is_active
        )
        SELECT i.id, i.name, i.unit_type, i.unit_cost, i.status,
               ii.ingredient_item_id,
               ii.quantity AS line_quantity,
               ii.unit_type AS line_unit_type
        FROM reachable r
        JOIN items i ON i.id = r.id
        LEFT JOIN item_ingredients ii ON ii.item_id = i.id AND ii.is_active
        ORDER BY i.id, ii.ingredient_item_id
        "#,
    )
    .bind(root_ids)
    .fetch_all(executor)
    .await?;

    recipe_book_from_rows(rows)
}

fn recipe_book_from_rows(rows: Vec<RecipeGraphRow>) -> AppResult<RecipeBook> {
    let mut items: Vec<RecipeItem> = Vec::new();

    for row in rows {
        if items.last().map(|item| item.id) != Some(row.id) {
            items.push(RecipeItem {
                id: row.id,
                name: row.name,
                unit_type: row.unit_type,
                unit_cost: row.unit_cost,
                status: row.status,
                ingredients: Vec::new(),
            });
        }

        let (Some(ingredient_item_id), Some(quantity), Some(unit_type)) =
            (row.ingredient_item_id, row.line_quantity, row.line_unit_type)
        else {
            continue;
        };
        let unit_type =
            UnitType::try_from(unit_type).map_err(|e| AppError::Internal(e.to_string()))?;

        if let Some(item) = items.last_mut() {
            item.ingredients.push(RecipeLine {
                ingredient_item_id,
                quantity,
                unit_type,
                is_active: true,
            });
        }
    }

    Ok(items.into())
}

impl ItemService {
    /// Create a new ItemService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get an item with its recipe lines. Deleted items are not found.
    pub async fn get_item_with_ingredients(&self, item_id: ItemId) -> AppResult<ItemWithIngredients> {
        let item: Item = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, item_code, name, unit_type, unit_cost, status, created_at, updated_at
            FROM items
            WHERE id = $1 AND status <> 'deleted'
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {}", item_id)))?
        .into();

        let ingredients = sqlx::query_as::<_, IngredientRow>(
            r#"
            SELECT ii.ingredient_item_id, i.name AS ingredient_item_name,
                   ii.quantity, ii.unit_type, ii.description, ii.is_active
            FROM item_ingredients ii
            JOIN items i ON i.id = ii.ingredient_item_id
            WHERE ii.item_id = $1
            ORDER BY ii.id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;

        let ingredients: Vec<ItemIngredient> = ingredients
            .into_iter()
            .map(|row| ItemIngredient {
                ingredient_item_id: row.ingredient_item_id,
                ingredient_item_name: row.ingredient_item_name,
                quantity: row.quantity,
                unit_type: row.unit_type,
                description: row.description,
                is_active: row.is_active,
            })
            .collect();

        Ok(ItemWithIngredients {
            item,
            has_ingredient: ingredients.iter().any(|line| line.is_active),
            ingredients,
        })
    }

    /// Preview the raw materials consumed by producing `quantity` of an item
    pub async fn calculate_requirements(
        &self,
        item_id: ItemId,
        quantity: Decimal,
        scale: u32,
    ) -> AppResult<Vec<RawMaterialRequirement>> {
        validate_refill_quantity(quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;

        let book = load_recipe_book(&self.db, &[item_id]).await?;
        let requirements = decompose(&book, item_id, quantity, scale)?;

        tracing::debug!(
            item_id,
            %quantity,
            raw_materials = requirements.len(),
            "Calculated raw material requirements"
        );

        Ok(requirements)
    }
}
