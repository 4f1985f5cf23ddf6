use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::TargetList;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `value` is 0-100
    #[sea_orm(string_value = "percentage")]
    Percentage,
    /// `value` is a currency amount, same unit as `minimum_purchase`
    #[sea_orm(string_value = "fixed_amount")]
    FixedAmount,
    /// `value` is a number of billing periods
    #[sea_orm(string_value = "free_months")]
    FreeMonths,
    #[sea_orm(string_value = "upgrade_discount")]
    UpgradeDiscount,
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::FixedAmount => write!(f, "fixed_amount"),
            DiscountType::FreeMonths => write!(f, "free_months"),
            DiscountType::UpgradeDiscount => write!(f, "upgrade_discount"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "discounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub value: f64,
    #[sea_orm(column_type = "Json")]
    pub target_tiers: TargetList,
    #[sea_orm(column_type = "Json")]
    pub target_users: TargetList,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Global cap across all users (NULL = unlimited)
    pub usage_limit: Option<i64>,
    pub per_user_limit: i64,
    pub minimum_purchase: Option<f64>,
    pub is_active: bool,
    pub total_uses: i64,
    pub total_revenue_impact: f64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::discount_usages::Entity")]
    Usages,
}

impl Related<super::discount_usages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
