//! Kitchen refill service
//!
//! A refill turns raw materials into prepared items at one location. Every
//! requested item is decomposed into raw materials, which are booked out with
//! OUTBOUND movements before the produced item is booked in with an INBOUND
//! movement. The whole batch is one transaction: either every movement is
//! written or none is.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use rust_decimal::Decimal;
use shared::{
    find_shortages, ItemId, LocationId, MovementId, OperatorId, PlannedRefill, RawMaterialUsage,
    RecipeBook, RefillItemResult, RefillPlan, RefillRequest, RefillResult, StockMovementType,
    StockShortage, REFILL_REFERENCE_TYPE,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use super::item::load_recipe_book;
use super::stock::{
    apply_movement, available_for, ensure_location_exists, lock_stock_levels, NewMovement,
};
use crate::config::RefillConfig;
use crate::error::{AppError, AppResult};

/// Refill service for producing prepared items from raw materials
#[derive(Clone)]
pub struct RefillKitchenService {
    db: PgPool,
    settings: RefillConfig,
}

fn requested_ids(request: &RefillRequest) -> Vec<ItemId> {
    request.items.iter().map(|item| item.item_id).collect()
}

impl RefillKitchenService {
    /// Create a new RefillKitchenService instance
    pub fn new(db: PgPool, settings: RefillConfig) -> Self {
        Self { db, settings }
    }

    /// Check a refill against current stock without changing anything.
    ///
    /// Returns the raw materials that are short, keyed by item id. An empty
    /// map means the refill can go ahead.
    pub async fn validate_sufficient_stock(
        &self,
        request: &RefillRequest,
    ) -> AppResult<BTreeMap<ItemId, StockShortage>> {
        request.validate()?;
        ensure_location_exists(&self.db, request.location_id).await?;

        let book = load_recipe_book(&self.db, &requested_ids(request)).await?;
        let plan = RefillPlan::build(&book, request, self.settings.quantity_scale)?;

        let requirements = plan.total_requirements()?;
        let raw_ids: Vec<ItemId> = requirements.iter().map(|req| req.item_id).collect();
        let available = available_for(&self.db, request.location_id, &raw_ids).await?;

        Ok(find_shortages(&requirements, &available))
    }

    /// Produce the requested items, consuming their raw materials
    pub async fn refill_kitchen_items(
        &self,
        request: RefillRequest,
        performed_by: Option<OperatorId>,
    ) -> AppResult<RefillResult> {
        request.validate()?;

        let refill_id = Uuid::new_v4();
        let location_id = request.location_id;

        let mut tx = self.db.begin().await?;

        ensure_location_exists(&mut *tx, location_id).await?;
        let book = load_recipe_book(&mut *tx, &requested_ids(&request)).await?;
        let plan = RefillPlan::build(&book, &request, self.settings.quantity_scale)?;

        // Locks are held until commit, so the check below cannot go stale
        let levels = lock_stock_levels(&mut *tx, location_id, &plan.touched_item_ids()).await?;

        if self.settings.enforce_stock_check {
            let available: HashMap<ItemId, Decimal> = levels
                .iter()
                .map(|level| (level.item_id, level.available_stock))
                .collect();
            let shortages = find_shortages(&plan.total_requirements()?, &available);
            if !shortages.is_empty() {
                tracing::warn!(
                    %refill_id,
                    location_id,
                    short_items = ?shortages.keys().collect::<Vec<_>>(),
                    "Refill rejected: insufficient stock"
                );
                return Err(AppError::InsufficientStock { shortages });
            }
        }

        let context = RefillContext {
            refill_id,
            location_id,
            performed_by,
            remarks: request.remarks.as_deref(),
        };
        let mut refill_results = Vec::with_capacity(plan.items.len());
        for item in &plan.items {
            refill_results.push(refill_item(&mut *tx, &book, item, &context).await?);
        }

        tx.commit().await?;

        tracing::info!(
            %refill_id,
            location_id,
            items = refill_results.len(),
            performed_by = ?performed_by,
            "Kitchen refill committed"
        );

        Ok(RefillResult {
            refill_id,
            location_id,
            total_items_refilled: refill_results.len(),
            refill_results,
            message: "Kitchen refill completed successfully".to_string(),
            refilled_at: Utc::now(),
        })
    }
}

/// Values shared by every movement of one refill batch
struct RefillContext<'a> {
    refill_id: Uuid,
    location_id: LocationId,
    performed_by: Option<OperatorId>,
    remarks: Option<&'a str>,
}

impl RefillContext<'_> {
    fn movement(
        &self,
        item_id: ItemId,
        movement_type: StockMovementType,
        quantity: Decimal,
        produced_item: ItemId,
        remarks: String,
    ) -> NewMovement {
        NewMovement {
            reference_type: Some(REFILL_REFERENCE_TYPE.to_string()),
            reference_id: Some(produced_item),
            correlation_id: Some(self.refill_id),
            remarks: Some(remarks),
            performed_by: self.performed_by,
            ..NewMovement::new(item_id, self.location_id, movement_type, quantity)
        }
    }
}

/// Book out the raw materials of one planned item, then book the item in
async fn refill_item(
    conn: &mut PgConnection,
    book: &RecipeBook,
    item: &PlannedRefill,
    context: &RefillContext<'_>,
) -> AppResult<RefillItemResult> {
    let mut movement_ids: HashMap<ItemId, MovementId> = HashMap::new();

    for booking in item.bookings(book) {
        let remarks = match booking.movement_type {
            StockMovementType::Inbound => context
                .remarks
                .map(str::to_string)
                .unwrap_or_else(|| format!("Kitchen refill: {}", item.item_name)),
            _ => format!("Used for refilling {} (Qty: {})", item.item_name, item.quantity),
        };
        let movement = NewMovement {
            unit_cost: booking.unit_cost,
            ..context.movement(
                booking.item_id,
                booking.movement_type,
                booking.quantity,
                item.item_id,
                remarks,
            )
        };
        let (recorded, _) = apply_movement(&mut *conn, movement).await?;
        movement_ids.insert(booking.item_id, recorded.id);
    }

    let inbound_movement_id = movement_ids.get(&item.item_id).copied().ok_or_else(|| {
        AppError::Internal(format!("No inbound movement booked for item {}", item.item_id))
    })?;

    // Raw amounts that round to zero were not booked and carry no movement id
    let raw_materials_used: Vec<RawMaterialUsage> = item
        .raw_materials
        .iter()
        .map(|raw| RawMaterialUsage {
            ingredient_item_id: raw.item_id,
            ingredient_item_name: raw.name.clone(),
            total_quantity: raw.quantity,
            unit_type: raw.unit_type,
            stock_movement_id: movement_ids.get(&raw.item_id).copied(),
        })
        .collect();

    tracing::debug!(
        refill_id = %context.refill_id,
        item_id = item.item_id,
        quantity = %item.quantity,
        raw_materials = raw_materials_used.len(),
        "Refilled item"
    );

    Ok(RefillItemResult {
        item_id: item.item_id,
        item_name: item.item_name.clone(),
        refill_quantity: item.quantity,
        raw_materials_used,
        inbound_movement_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::*;
    use shared::RefillItemRequest;

    fn request(items: &[(ItemId, &str)]) -> RefillRequest {
        RefillRequest {
            location_id: KITCHEN,
            items: items
                .iter()
                .map(|(item_id, qty)| RefillItemRequest {
                    item_id: *item_id,
                    quantity: dec(qty),
                })
                .collect(),
            remarks: None,
        }
    }

    fn service(pool: &PgPool) -> RefillKitchenService {
        RefillKitchenService::new(pool.clone(), RefillConfig::default())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_refill_books_batch_under_one_correlation_id(pool: PgPool) {
        seed_kitchen(&pool, &[(SUGAR, "1000"), (CACAO, "100"), (LID, "10")]).await;

        let result = service(&pool)
            .refill_kitchen_items(request(&[(BROWNIE, "2"), (ICED_TEA, "3")]), Some(7))
            .await
            .unwrap();

        assert_eq!(result.total_items_refilled, 2);
        assert_eq!(stock_of(&pool, SUGAR).await, dec("840"));
        assert_eq!(stock_of(&pool, CACAO).await, dec("60"));
        assert_eq!(stock_of(&pool, LID).await, dec("7"));
        assert_eq!(stock_of(&pool, BROWNIE).await, dec("2"));
        assert_eq!(stock_of(&pool, ICED_TEA).await, dec("3"));

        let correlated = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_movements \
             WHERE correlation_id = $1 AND reference_type = $2 AND performed_by = 7",
        )
        .bind(result.refill_id)
        .bind(REFILL_REFERENCE_TYPE)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(correlated, 6);
        assert_eq!(movement_count(&pool).await, 6);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_failure_mid_batch_persists_nothing(pool: PgPool) {
        seed_kitchen(
            &pool,
            &[(SUGAR, "1000"), (CACAO, "100"), (BOX, "50"), (LID, "10")],
        )
        .await;

        // The first item books fine; the second fails on its inbound movement
        let result = service(&pool)
            .refill_kitchen_items(
                request(&[(BROWNIE, "1"), (GOLD_BROWNIE, "20"), (ICED_TEA, "1")]),
                None,
            )
            .await;

        assert!(matches!(result, Err(AppError::DatabaseError(_))));
        assert_eq!(movement_count(&pool).await, 0);
        assert_eq!(stock_of(&pool, SUGAR).await, dec("1000"));
        assert_eq!(stock_of(&pool, CACAO).await, dec("100"));
        assert_eq!(stock_of(&pool, BOX).await, dec("50"));
        assert_eq!(stock_of(&pool, BROWNIE).await, Decimal::ZERO);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_insufficient_stock_rejects_whole_batch(pool: PgPool) {
        seed_kitchen(&pool, &[(SUGAR, "1000"), (CACAO, "100"), (LID, "2")]).await;

        let result = service(&pool)
            .refill_kitchen_items(request(&[(BROWNIE, "1"), (ICED_TEA, "3")]), None)
            .await;

        match result {
            Err(AppError::InsufficientStock { shortages }) => {
                assert_eq!(shortages.keys().copied().collect::<Vec<_>>(), vec![LID]);
                assert_eq!(shortages[&LID].shortage, dec("1"));
            }
            other => panic!("expected insufficient stock, got {:?}", other),
        }
        assert_eq!(movement_count(&pool).await, 0);
        assert_eq!(stock_of(&pool, SUGAR).await, dec("1000"));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_concurrent_refills_cannot_both_spend_the_same_stock(pool: PgPool) {
        seed_kitchen(&pool, &[(SUGAR, "1000"), (LID, "7")]).await;
        let service = service(&pool);

        let (first, second) = tokio::join!(
            service.refill_kitchen_items(request(&[(ICED_TEA, "5")]), None),
            service.refill_kitchen_items(request(&[(ICED_TEA, "5")]), None),
        );

        let (committed, rejected) = match (first, second) {
            (Ok(result), Err(err)) | (Err(err), Ok(result)) => (result, err),
            (first, second) => panic!("expected one refill to fail, got {:?} and {:?}", first, second),
        };
        assert_eq!(committed.total_items_refilled, 1);
        match rejected {
            AppError::InsufficientStock { shortages } => {
                assert_eq!(shortages[&LID].available, dec("2"));
            }
            other => panic!("expected insufficient stock, got {:?}", other),
        }
        assert_eq!(stock_of(&pool, LID).await, dec("2"));
        assert_eq!(stock_of(&pool, ICED_TEA).await, dec("5"));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_unchecked_refill_clamps_raw_stock_at_zero(pool: PgPool) {
        seed_kitchen(&pool, &[(SUGAR, "1000"), (CACAO, "5")]).await;
        let service = RefillKitchenService::new(
            pool.clone(),
            RefillConfig {
                enforce_stock_check: false,
                ..RefillConfig::default()
            },
        );

        let result = service
            .refill_kitchen_items(request(&[(BROWNIE, "1")]), None)
            .await
            .unwrap();

        let cacao = result.refill_results[0]
            .raw_materials_used
            .iter()
            .find(|used| used.ingredient_item_id == CACAO)
            .unwrap();
        assert_eq!(cacao.total_quantity, dec("20"));
        assert!(cacao.stock_movement_id.is_some());
        assert_eq!(stock_of(&pool, CACAO).await, Decimal::ZERO);
        assert_eq!(stock_of(&pool, BROWNIE).await, dec("1"));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_raw_amount_rounded_to_zero_is_not_booked(pool: PgPool) {
        seed_kitchen(&pool, &[(WATER, "10")]).await;

        let result = service(&pool)
            .refill_kitchen_items(request(&[(PICKLE, "1")]), None)
            .await
            .unwrap();

        let used = &result.refill_results[0].raw_materials_used;
        assert_eq!(used[0].ingredient_item_id, SALT);
        assert_eq!(used[0].total_quantity, Decimal::ZERO);
        assert_eq!(used[0].stock_movement_id, None);
        assert_eq!(used[1].ingredient_item_id, WATER);
        assert!(used[1].stock_movement_id.is_some());
        assert_eq!(movement_count(&pool).await, 2);
        assert_eq!(stock_of(&pool, WATER).await, dec("9"));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_validate_reports_shortages_without_writing(pool: PgPool) {
        seed_kitchen(&pool, &[(SUGAR, "80"), (CACAO, "100")]).await;

        let shortages = service(&pool)
            .validate_sufficient_stock(&request(&[(BROWNIE, "2")]))
            .await
            .unwrap();

        assert_eq!(shortages[&SUGAR].required, dec("100"));
        assert_eq!(shortages[&SUGAR].shortage, dec("20"));
        assert!(!shortages.contains_key(&CACAO));
        assert_eq!(movement_count(&pool).await, 0);
        assert_eq!(stock_of(&pool, SUGAR).await, dec("80"));
    }
}
