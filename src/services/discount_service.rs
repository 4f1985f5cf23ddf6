use std::collections::HashMap;

use crate::entities::{
    TargetList, discount_entity as discounts, discount_usage_entity as usages,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    ApplyDiscountResponse, DiscountCreate, DiscountResponse, DiscountTerms, DiscountUpdate,
    PaginatedResponse, PaginationParams, UsageRecordResponse, validate_discount_terms,
};
use crate::rules::{Customer, check_discount, is_discount_available};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

#[derive(Debug, FromQueryResult)]
struct UsageCountRow {
    discount_id: String,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    count: i64,
}

#[derive(Clone)]
pub struct DiscountService {
    pool: DatabaseConnection,
}

impl DiscountService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        actor_id: &str,
        request: DiscountCreate,
        now: DateTime<Utc>,
    ) -> AppResult<DiscountResponse> {
        request.validate()?;

        let discount = discounts::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            discount_type: Set(request.discount_type),
            value: Set(request.value),
            target_tiers: Set(TargetList::from_values(request.target_tiers)),
            target_users: Set(TargetList::from_values(request.target_users)),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            usage_limit: Set(request.usage_limit),
            per_user_limit: Set(request.per_user_limit),
            minimum_purchase: Set(request.minimum_purchase),
            is_active: Set(request.is_active),
            total_uses: Set(0),
            total_revenue_impact: Set(0.0),
            created_by: Set(actor_id.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Discount {} ({} {}) created by {}",
            discount.id,
            discount.discount_type,
            discount.value,
            actor_id
        );
        Ok(DiscountResponse::from_model(discount, now))
    }

    /// Newest first.
    pub async fn list(
        &self,
        active_only: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<DiscountResponse>> {
        let mut query = discounts::Entity::find();
        if active_only {
            query = query.filter(discounts::Column::IsActive.eq(true));
        }
        let list = query
            .order_by_desc(discounts::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        Ok(list
            .into_iter()
            .map(|d| DiscountResponse::from_model(d, now))
            .collect())
    }

    pub async fn get(&self, discount_id: &str, now: DateTime<Utc>) -> AppResult<DiscountResponse> {
        let discount = find_discount(&self.pool, discount_id).await?;
        Ok(DiscountResponse::from_model(discount, now))
    }

    pub async fn update(
        &self,
        discount_id: &str,
        request: DiscountUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<DiscountResponse> {
        request.validate()?;
        let existing = find_discount(&self.pool, discount_id).await?;

        let mut terms = DiscountTerms::from(&existing);
        if let Some(discount_type) = request.discount_type {
            terms.discount_type = discount_type;
        }
        if let Some(value) = request.value {
            terms.value = value;
        }
        if let Some(usage_limit) = request.usage_limit {
            terms.usage_limit = usage_limit;
        }
        if let Some(per_user_limit) = request.per_user_limit {
            terms.per_user_limit = per_user_limit;
        }
        if let Some(minimum_purchase) = request.minimum_purchase {
            terms.minimum_purchase = minimum_purchase;
        }
        if let Some(start_date) = request.start_date {
            terms.window.start = start_date;
        }
        if let Some(end_date) = request.end_date {
            terms.window.end = end_date;
        }
        validate_discount_terms(&terms)?;

        let mut model = existing.into_active_model();
        if let Some(name) = request.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(description) = request.description {
            model.description = Set(description);
        }
        if let Some(target_tiers) = request.target_tiers {
            model.target_tiers = Set(TargetList::from_values(target_tiers));
        }
        if let Some(target_users) = request.target_users {
            model.target_users = Set(TargetList::from_values(target_users));
        }
        if let Some(is_active) = request.is_active {
            model.is_active = Set(is_active);
        }
        model.discount_type = Set(terms.discount_type);
        model.value = Set(terms.value);
        model.usage_limit = Set(terms.usage_limit);
        model.per_user_limit = Set(terms.per_user_limit);
        model.minimum_purchase = Set(terms.minimum_purchase);
        model.start_date = Set(terms.window.start);
        model.end_date = Set(terms.window.end);
        model.updated_at = Set(now);

        let updated = model.update(&self.pool).await?;
        Ok(DiscountResponse::from_model(updated, now))
    }

    /// Deletes the discount together with its usage history.
    pub async fn delete(&self, discount_id: &str) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        usages::Entity::delete_many()
            .filter(usages::Column::DiscountId.eq(discount_id))
            .exec(&txn)
            .await?;
        let res = discounts::Entity::delete_by_id(discount_id.to_string())
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Discount not found".to_string()));
        }

        txn.commit().await?;
        log::info!("Discount {} deleted", discount_id);
        Ok(())
    }

    /// Discounts the user can apply right now, oldest first.
    ///
    /// `requested_tier` replaces the user's own tier for tier targeting.
    pub async fn available_for_user(
        &self,
        user: &users::Model,
        requested_tier: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<DiscountResponse>> {
        let candidates = discounts::Entity::find()
            .filter(discounts::Column::IsActive.eq(true))
            .order_by_asc(discounts::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        let usage_counts: HashMap<String, i64> = usages::Entity::find()
            .filter(usages::Column::UserId.eq(user.id.as_str()))
            .select_only()
            .column(usages::Column::DiscountId)
            .column_as(Expr::col(usages::Column::Id).count(), "count")
            .group_by(usages::Column::DiscountId)
            .into_model::<UsageCountRow>()
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|row| (row.discount_id, row.count))
            .collect();

        let customer = customer_of(user);
        Ok(candidates
            .into_iter()
            .filter(|d| {
                let used = usage_counts.get(&d.id).copied().unwrap_or(0);
                is_discount_available(d, &customer, requested_tier, used, now)
            })
            .map(|d| DiscountResponse::from_model(d, now))
            .collect())
    }

    /// Records one application of a discount to a user.
    ///
    /// Unless `force` is set the eligibility rules must pass. Every call
    /// writes a new usage row and bumps `total_uses` by one, all in a single
    /// transaction.
    pub async fn apply(
        &self,
        discount_id: &str,
        user_id: &str,
        actor_id: &str,
        force: bool,
        now: DateTime<Utc>,
    ) -> AppResult<ApplyDiscountResponse> {
        let txn = self.pool.begin().await?;

        let discount = find_discount(&txn, discount_id).await?;
        let user = users::Entity::find_by_id(user_id.to_string())
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let used = count_user_usages(&txn, discount_id, user_id).await?;

        if force {
            log::warn!(
                "Force-applying discount {} to user {} by {} (prior uses: {})",
                discount_id,
                user_id,
                actor_id,
                used
            );
        } else {
            check_discount(&discount, &customer_of(&user), None, used, now)
                .map_err(|reason| AppError::Conflict(reason.to_string()))?;
        }

        reserve_use(&txn, &discount, !force, now).await?;

        let usage = usages::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            discount_id: Set(discount.id.clone()),
            user_id: Set(user.id.clone()),
            sequence_number: Set(used + 1),
            applied_by: Set(actor_id.to_string()),
            applied_at: Set(now),
            discount_amount: Set(discount.value),
            discount_type: Set(discount.discount_type),
            forced: Set(force),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(
                "Discount was applied concurrently for this user, retry".to_string(),
            ),
            _ => AppError::DatabaseError(e),
        })?;

        txn.commit().await?;

        log::info!(
            "Discount {} applied to user {} (use #{})",
            discount_id,
            user_id,
            usage.sequence_number
        );
        Ok(ApplyDiscountResponse {
            message: if force {
                "Discount force-applied successfully".to_string()
            } else {
                "Discount applied successfully".to_string()
            },
            usage_record: usage.into(),
        })
    }

    /// Usage records for one discount, newest first.
    pub async fn usage_history(
        &self,
        discount_id: &str,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<UsageRecordResponse>> {
        find_discount(&self.pool, discount_id).await?;

        let total = usages::Entity::find()
            .filter(usages::Column::DiscountId.eq(discount_id))
            .select_only()
            .column_as(Expr::val(1).count(), "count")
            .into_model::<CountRow>()
            .one(&self.pool)
            .await?
            .map(|r| r.count)
            .unwrap_or(0);

        let rows = usages::Entity::find()
            .filter(usages::Column::DiscountId.eq(discount_id))
            .order_by_desc(usages::Column::AppliedAt)
            .order_by_desc(usages::Column::SequenceNumber)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(Into::into).collect(),
            params.get_page(),
            params.get_limit(),
            total,
        ))
    }
}

fn customer_of(user: &users::Model) -> Customer<'_> {
    Customer {
        email: &user.email,
        tier: &user.subscription_tier,
    }
}

/// Bumps `total_uses` and the revenue impact in one statement. With
/// `enforce_cap` the row only changes while `total_uses < usage_limit`, so a
/// cap reached after the eligibility check still yields a conflict.
async fn reserve_use<C: ConnectionTrait>(
    conn: &C,
    discount: &discounts::Model,
    enforce_cap: bool,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let mut increment = discounts::Entity::update_many()
        .col_expr(
            discounts::Column::TotalUses,
            Expr::col(discounts::Column::TotalUses).add(1),
        )
        .col_expr(
            discounts::Column::TotalRevenueImpact,
            Expr::col(discounts::Column::TotalRevenueImpact).add(discount.value),
        )
        .col_expr(discounts::Column::UpdatedAt, Expr::value(now))
        .filter(discounts::Column::Id.eq(discount.id.as_str()));
    if enforce_cap {
        increment = increment.filter(
            Condition::any()
                .add(discounts::Column::UsageLimit.is_null())
                .add(
                    Expr::col(discounts::Column::TotalUses)
                        .lt(Expr::col(discounts::Column::UsageLimit)),
                ),
        );
    }
    if increment.exec(conn).await?.rows_affected == 0 {
        return Err(AppError::Conflict("Usage limit reached".to_string()));
    }
    Ok(())
}

async fn find_discount<C: ConnectionTrait>(
    conn: &C,
    discount_id: &str,
) -> AppResult<discounts::Model> {
    discounts::Entity::find_by_id(discount_id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Discount not found".to_string()))
}

async fn count_user_usages<C: ConnectionTrait>(
    conn: &C,
    discount_id: &str,
    user_id: &str,
) -> AppResult<i64> {
    Ok(usages::Entity::find()
        .filter(usages::Column::DiscountId.eq(discount_id))
        .filter(usages::Column::UserId.eq(user_id))
        .select_only()
        .column_as(Expr::val(1).count(), "count")
        .into_model::<CountRow>()
        .one(conn)
        .await?
        .map(|r| r.count)
        .unwrap_or(0))
}
