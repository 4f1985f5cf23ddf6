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
pub enum BannerStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "paused")]
    Paused,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum BannerType {
    #[sea_orm(string_value = "info")]
    Info,
    #[sea_orm(string_value = "warning")]
    Warning,
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "error")]
    Error,
    #[sea_orm(string_value = "promotion")]
    Promotion,
    #[sea_orm(string_value = "maintenance")]
    Maintenance,
}

/// Admin-authored announcement banner.
/// - `target_users` / `target_tiers`: empty list = shown to everyone
/// - `priority`: 0..=10, higher shows first
/// - `views` / `clicks` / `dismissals`: only ever changed by atomic increments
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "banners")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub message: String,
    pub banner_type: BannerType,
    pub status: BannerStatus,
    #[sea_orm(column_type = "Json")]
    pub target_users: TargetList,
    #[sea_orm(column_type = "Json")]
    pub target_tiers: TargetList,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_dismissible: bool,
    pub priority: i32,
    pub action_text: Option<String>,
    pub action_url: Option<String>,
    pub views: i64,
    pub clicks: i64,
    pub dismissals: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
