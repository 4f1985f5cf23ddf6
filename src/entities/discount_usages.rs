use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use super::DiscountType;

/// Discount usage record (append-only)
/// - `sequence_number`: 1-based count of applications for (discount_id, user_id),
///   unique together with both ids
/// - `discount_amount` / `discount_type`: snapshot of the discount at apply time
/// - `forced`: applied through the admin override, eligibility was not checked
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "discount_usages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub discount_id: String,
    pub user_id: String,
    pub sequence_number: i64,
    pub applied_by: String,
    pub applied_at: DateTime<Utc>,
    pub discount_amount: f64,
    pub discount_type: DiscountType,
    pub forced: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::discounts::Entity",
        from = "Column::DiscountId",
        to = "super::discounts::Column::Id"
    )]
    Discount,
}

impl Related<super::discounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Discount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
