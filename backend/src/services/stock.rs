//! Stock ledger service: stock levels and the append-only movement log

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    movement_total_cost, validate_movement_quantity, validate_reference_type, validate_unit_cost,
    ItemId, LocationId, OperatorId, StockChange, StockEffect, StockLevel, StockMovement,
    StockMovementType,
};
use sqlx::{Executor, FromRow, PgConnection, PgPool, Postgres};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Stock service for stock levels and movements
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Row for stock level queries
#[derive(Debug, FromRow)]
struct StockLevelRow {
    id: i64,
    item_id: ItemId,
    location_id: LocationId,
    current_stock: Decimal,
    reserved_stock: Decimal,
    available_stock: Decimal,
    par_level_min: Decimal,
    par_level_max: Decimal,
    updated_at: Option<DateTime<Utc>>,
}

impl From<StockLevelRow> for StockLevel {
    fn from(row: StockLevelRow) -> Self {
        StockLevel {
            id: row.id,
            item_id: row.item_id,
            location_id: row.location_id,
            current_stock: row.current_stock,
            reserved_stock: row.reserved_stock,
            available_stock: row.available_stock,
            par_level_min: row.par_level_min,
            par_level_max: row.par_level_max,
            updated_at: row.updated_at,
        }
    }
}

/// Row for stock movement queries
#[derive(Debug, FromRow)]
struct StockMovementRow {
    id: i64,
    item_id: ItemId,
    location_id: LocationId,
    #[sqlx(try_from = "String")]
    movement_type: StockMovementType,
    quantity: Decimal,
    unit_cost: Option<Decimal>,
    total_cost: Option<Decimal>,
    reference_type: Option<String>,
    reference_id: Option<i64>,
    correlation_id: Option<Uuid>,
    batch_number: Option<String>,
    expiry_date: Option<NaiveDate>,
    remarks: Option<String>,
    performed_by: Option<OperatorId>,
    movement_date: DateTime<Utc>,
}

impl From<StockMovementRow> for StockMovement {
    fn from(row: StockMovementRow) -> Self {
        StockMovement {
            id: row.id,
            item_id: row.item_id,
            location_id: row.location_id,
            movement_type: row.movement_type,
            quantity: row.quantity,
            unit_cost: row.unit_cost,
            total_cost: row.total_cost,
            reference_type: row.reference_type,
            reference_id: row.reference_id,
            correlation_id: row.correlation_id,
            batch_number: row.batch_number,
            expiry_date: row.expiry_date,
            remarks: row.remarks,
            performed_by: row.performed_by,
            movement_date: row.movement_date,
        }
    }
}

const MOVEMENT_COLUMNS: &str = "id, item_id, location_id, movement_type, quantity, unit_cost, \
     total_cost, reference_type, reference_id, correlation_id, batch_number, expiry_date, \
     remarks, performed_by, movement_date";

const STOCK_LEVEL_COLUMNS: &str = "id, item_id, location_id, current_stock, reserved_stock, \
     available_stock, par_level_min, par_level_max, updated_at";

/// Movement to be written to the ledger
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub item_id: ItemId,
    pub location_id: LocationId,
    pub movement_type: StockMovementType,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub correlation_id: Option<Uuid>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub remarks: Option<String>,
    pub performed_by: Option<OperatorId>,
}

impl NewMovement {
    /// Movement with only the required fields set
    pub fn new(
        item_id: ItemId,
        location_id: LocationId,
        movement_type: StockMovementType,
        quantity: Decimal,
    ) -> Self {
        Self {
            item_id,
            location_id,
            movement_type,
            quantity,
            unit_cost: None,
            reference_type: None,
            reference_id: None,
            correlation_id: None,
            batch_number: None,
            expiry_date: None,
            remarks: None,
            performed_by: None,
        }
    }
}

/// Input for recording a standalone stock movement
#[derive(Debug, Deserialize, Validate)]
pub struct RecordMovementInput {
    pub item_id: ItemId,
    pub location_id: LocationId,
    pub movement_type: StockMovementType,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    #[validate(length(max = 100))]
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    #[validate(length(max = 1000))]
    pub remarks: Option<String>,
}

impl RecordMovementInput {
    fn check(&self) -> AppResult<()> {
        self.validate()?;
        validate_movement_quantity(self.movement_type, self.quantity)
            .map_err(|msg| validation("quantity", msg))?;
        validate_unit_cost(self.unit_cost).map_err(|msg| validation("unit_cost", msg))?;
        if let Some(reference_type) = &self.reference_type {
            validate_reference_type(reference_type)
                .map_err(|msg| validation("reference_type", msg))?;
        }
        Ok(())
    }

    fn into_movement(self, performed_by: Option<OperatorId>) -> NewMovement {
        NewMovement {
            unit_cost: self.unit_cost,
            reference_type: self.reference_type,
            reference_id: self.reference_id,
            batch_number: self.batch_number,
            expiry_date: self.expiry_date,
            remarks: self.remarks,
            performed_by,
            ..NewMovement::new(self.item_id, self.location_id, self.movement_type, self.quantity)
        }
    }
}

fn validation(field: &str, message: &str) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Fail with `NotFound` unless the location exists
pub async fn ensure_location_exists<'e, E>(executor: E, location_id: LocationId) -> AppResult<()>
where
    E: Executor<'e, Database = Postgres>,
{
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM locations WHERE id = $1)")
            .bind(location_id)
            .fetch_one(executor)
            .await?;

    if !exists {
        return Err(AppError::NotFound(format!("Location {}", location_id)));
    }
    Ok(())
}

/// Fail with `NotFound` unless the item exists and is not deleted
pub async fn ensure_item_exists<'e, E>(executor: E, item_id: ItemId) -> AppResult<()>
where
    E: Executor<'e, Database = Postgres>,
{
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM items WHERE id = $1 AND status <> 'deleted')",
    )
    .bind(item_id)
    .fetch_one(executor)
    .await?;

    if !exists {
        return Err(AppError::NotFound(format!("Item {}", item_id)));
    }
    Ok(())
}

/// Available stock per item at a location. Items without a stock row are absent.
pub async fn available_for<'e, E>(
    executor: E,
    location_id: LocationId,
    item_ids: &[ItemId],
) -> AppResult<HashMap<ItemId, Decimal>>
where
    E: Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query_as::<_, (ItemId, Decimal)>(
        r#"
        SELECT item_id, available_stock
        FROM stock_levels
        WHERE location_id = $1 AND item_id = ANY($2)
        "#,
    )
    .bind(location_id)
    .bind(item_ids)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Lock the stock rows of `item_ids` at a location for the rest of the
/// transaction, creating empty rows for items that have none yet.
///
/// Rows are locked in ascending item id order.
pub async fn lock_stock_levels(
    conn: &mut PgConnection,
    location_id: LocationId,
    item_ids: &[ItemId],
) -> AppResult<Vec<StockLevel>> {
    let mut ids = item_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    sqlx::query(
        r#"
        INSERT INTO stock_levels (item_id, location_id)
        SELECT item_id, $1 FROM UNNEST($2::BIGINT[]) AS t(item_id)
        ORDER BY item_id
        ON CONFLICT (item_id, location_id) DO NOTHING
        "#,
    )
    .bind(location_id)
    .bind(&ids)
    .execute(&mut *conn)
    .await?;

    let levels = sqlx::query_as::<_, StockLevelRow>(&format!(
        "SELECT {} FROM stock_levels WHERE location_id = $1 AND item_id = ANY($2) \
         ORDER BY item_id FOR UPDATE",
        STOCK_LEVEL_COLUMNS
    ))
    .bind(location_id)
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(levels.into_iter().map(StockLevel::from).collect())
}

/// Write a movement to the ledger and apply its effect to the stock level.
///
/// Decrements never take stock below zero; a clamped decrement is logged.
pub async fn apply_movement(
    conn: &mut PgConnection,
    movement: NewMovement,
) -> AppResult<(StockMovement, Option<StockChange>)> {
    let total_cost = movement_total_cost(movement.unit_cost, movement.quantity);

    let recorded = sqlx::query_as::<_, StockMovementRow>(&format!(
        r#"
        INSERT INTO stock_movements (
            item_id, location_id, movement_type, quantity, unit_cost, total_cost,
            reference_type, reference_id, correlation_id, batch_number, expiry_date,
            remarks, performed_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {}
        "#,
        MOVEMENT_COLUMNS
    ))
    .bind(movement.item_id)
    .bind(movement.location_id)
    .bind(movement.movement_type.as_str())
    .bind(movement.quantity)
    .bind(movement.unit_cost)
    .bind(total_cost)
    .bind(&movement.reference_type)
    .bind(movement.reference_id)
    .bind(movement.correlation_id)
    .bind(&movement.batch_number)
    .bind(movement.expiry_date)
    .bind(&movement.remarks)
    .bind(movement.performed_by)
    .fetch_one(&mut *conn)
    .await?;

    if movement.movement_type.effect() == StockEffect::None {
        return Ok((recorded.into(), None));
    }

    let mut level = lock_stock_levels(&mut *conn, movement.location_id, &[movement.item_id])
        .await?
        .pop()
        .ok_or_else(|| {
            AppError::Internal(format!(
                "Stock level for item {} at location {} could not be created",
                movement.item_id, movement.location_id
            ))
        })?;

    let change = level.apply_delta(movement.movement_type.stock_delta(movement.quantity));
    if change.clamped {
        tracing::warn!(
            item_id = movement.item_id,
            location_id = movement.location_id,
            movement_type = %movement.movement_type,
            quantity = %movement.quantity,
            previous_stock = %change.previous,
            "Stock decrement exceeded stock on hand; clamped at zero"
        );
    }

    sqlx::query("UPDATE stock_levels SET current_stock = $1, updated_at = NOW() WHERE id = $2")
        .bind(level.current_stock)
        .bind(level.id)
        .execute(&mut *conn)
        .await?;

    Ok((recorded.into(), Some(change)))
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get the stock level of an item at a location
    pub async fn get_stock_level(
        &self,
        item_id: ItemId,
        location_id: LocationId,
    ) -> AppResult<StockLevel> {
        let level = sqlx::query_as::<_, StockLevelRow>(&format!(
            "SELECT {} FROM stock_levels WHERE item_id = $1 AND location_id = $2",
            STOCK_LEVEL_COLUMNS
        ))
        .bind(item_id)
        .bind(location_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Stock level for item {} at location {}",
                item_id, location_id
            ))
        })?;

        Ok(level.into())
    }

    /// Record a standalone movement and apply it to stock in one transaction
    pub async fn record_movement(
        &self,
        input: RecordMovementInput,
        performed_by: Option<OperatorId>,
    ) -> AppResult<StockMovement> {
        input.check()?;

        let mut tx = self.db.begin().await?;

        ensure_item_exists(&mut *tx, input.item_id).await?;
        ensure_location_exists(&mut *tx, input.location_id).await?;

        let (movement, change) = apply_movement(&mut *tx, input.into_movement(performed_by)).await?;

        tx.commit().await?;

        tracing::info!(
            movement_id = movement.id,
            item_id = movement.item_id,
            location_id = movement.location_id,
            movement_type = %movement.movement_type,
            current_stock = ?change.map(|c| c.current),
            "Stock movement recorded"
        );

        Ok(movement)
    }

    /// Movements of an item, newest first, optionally for one location
    pub async fn get_item_movement_history(
        &self,
        item_id: ItemId,
        location_id: Option<LocationId>,
    ) -> AppResult<Vec<StockMovement>> {
        ensure_item_exists(&self.db, item_id).await?;

        let movements = sqlx::query_as::<_, StockMovementRow>(&format!(
            r#"
            SELECT {}
            FROM stock_movements
            WHERE item_id = $1 AND ($2::BIGINT IS NULL OR location_id = $2)
            ORDER BY movement_date DESC, id DESC
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(item_id)
        .bind(location_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements.into_iter().map(StockMovement::from).collect())
    }

    /// Movements written for a business reference, newest first
    pub async fn get_movements_by_reference(
        &self,
        reference_type: &str,
        reference_id: i64,
    ) -> AppResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovementRow>(&format!(
            r#"
            SELECT {}
            FROM stock_movements
            WHERE reference_type = $1 AND reference_id = $2
            ORDER BY movement_date DESC, id DESC
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(reference_type)
        .bind(reference_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements.into_iter().map(StockMovement::from).collect())
    }
}
