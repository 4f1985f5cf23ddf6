use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::banner::{validate_target_users, validate_window};
use super::common::double_option;
use crate::entities::{DiscountType, discount_entity as discounts, discount_usage_entity as usages};
use crate::error::{AppError, AppResult};
use crate::rules::DateWindow;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiscountCreate {
    #[schema(example = "Black Friday 30%")]
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// percentage: 0-100, fixed_amount: currency, free_months: billing periods
    #[schema(example = 30.0)]
    pub value: f64,
    #[serde(default)]
    pub target_tiers: Vec<String>,
    #[serde(default)]
    pub target_users: Vec<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Global cap, unlimited when absent
    pub usage_limit: Option<i64>,
    #[serde(default = "default_per_user_limit")]
    pub per_user_limit: i64,
    pub minimum_purchase: Option<f64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_per_user_limit() -> i64 {
    1
}

fn default_true() -> bool {
    true
}

impl DiscountCreate {
    pub fn validate(&self) -> AppResult<()> {
        validate_discount_name(&self.name)?;
        validate_discount_terms(&DiscountTerms {
            discount_type: self.discount_type,
            value: self.value,
            usage_limit: self.usage_limit,
            per_user_limit: self.per_user_limit,
            minimum_purchase: self.minimum_purchase,
            window: DateWindow::new(self.start_date, self.end_date),
        })?;
        validate_target_users(&self.target_users)
    }
}

/// Partial update: absent fields are left untouched, `null` clears optional ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DiscountUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub discount_type: Option<DiscountType>,
    pub value: Option<f64>,
    pub target_tiers: Option<Vec<String>>,
    pub target_users: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub usage_limit: Option<Option<i64>>,
    pub per_user_limit: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub minimum_purchase: Option<Option<f64>>,
    pub is_active: Option<bool>,
}

impl DiscountUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            validate_discount_name(name)?;
        }
        if let Some(users) = &self.target_users {
            validate_target_users(users)?;
        }
        Ok(())
    }
}

/// The numeric and temporal fields that must stay consistent together.
#[derive(Debug, Clone)]
pub struct DiscountTerms {
    pub discount_type: DiscountType,
    pub value: f64,
    pub usage_limit: Option<i64>,
    pub per_user_limit: i64,
    pub minimum_purchase: Option<f64>,
    pub window: DateWindow,
}

impl From<&discounts::Model> for DiscountTerms {
    fn from(d: &discounts::Model) -> Self {
        Self {
            discount_type: d.discount_type,
            value: d.value,
            usage_limit: d.usage_limit,
            per_user_limit: d.per_user_limit,
            minimum_purchase: d.minimum_purchase,
            window: d.window(),
        }
    }
}

fn validate_discount_name(name: &str) -> AppResult<()> {
    let len = name.trim().chars().count();
    if len == 0 || len > 255 {
        return Err(AppError::ValidationError(
            "Name must be between 1 and 255 characters".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_discount_terms(terms: &DiscountTerms) -> AppResult<()> {
    if !terms.value.is_finite() || terms.value <= 0.0 {
        return Err(AppError::ValidationError("Value must be greater than 0".to_string()));
    }
    if terms.discount_type == DiscountType::Percentage && terms.value > 100.0 {
        return Err(AppError::ValidationError(
            "Percentage discounts must be between 0 and 100".to_string(),
        ));
    }
    if terms.per_user_limit < 1 {
        return Err(AppError::ValidationError(
            "per_user_limit must be at least 1".to_string(),
        ));
    }
    if let Some(limit) = terms.usage_limit
        && limit < 1
    {
        return Err(AppError::ValidationError("usage_limit must be at least 1".to_string()));
    }
    if let Some(min) = terms.minimum_purchase
        && (!min.is_finite() || min < 0.0)
    {
        return Err(AppError::ValidationError(
            "minimum_purchase must not be negative".to_string(),
        ));
    }
    validate_window(&terms.window)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiscountResponse {
    pub discount_id: String,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub value: f64,
    pub target_tiers: Vec<String>,
    pub target_users: Vec<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub usage_limit: Option<i64>,
    pub per_user_limit: i64,
    pub minimum_purchase: Option<f64>,
    pub is_active: bool,
    /// Computed from `end_date` at response time
    pub is_expired: bool,
    pub total_uses: i64,
    pub total_revenue_impact: f64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiscountResponse {
    pub fn from_model(discount: discounts::Model, now: DateTime<Utc>) -> Self {
        Self {
            is_expired: discount.is_expired(now),
            discount_id: discount.id,
            name: discount.name,
            description: discount.description,
            discount_type: discount.discount_type,
            value: discount.value,
            target_tiers: discount.target_tiers.into_inner(),
            target_users: discount.target_users.into_inner(),
            start_date: discount.start_date,
            end_date: discount.end_date,
            usage_limit: discount.usage_limit,
            per_user_limit: discount.per_user_limit,
            minimum_purchase: discount.minimum_purchase,
            is_active: discount.is_active,
            total_uses: discount.total_uses,
            total_revenue_impact: discount.total_revenue_impact,
            created_by: discount.created_by,
            created_at: discount.created_at,
            updated_at: discount.updated_at,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DiscountListQuery {
    pub active_only: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AvailableDiscountQuery {
    /// Evaluate tier targeting for this tier instead of the caller's own
    pub tier: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ApplyDiscountQuery {
    /// Skip the eligibility rules (admin override)
    pub force: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DiscountUsageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageRecordResponse {
    pub usage_id: String,
    pub discount_id: String,
    pub user_id: String,
    pub applied_by: String,
    pub applied_at: DateTime<Utc>,
    pub discount_amount: f64,
    pub discount_type: DiscountType,
    pub sequence_number: i64,
    pub forced: bool,
}

impl From<usages::Model> for UsageRecordResponse {
    fn from(usage: usages::Model) -> Self {
        Self {
            usage_id: usage.id,
            discount_id: usage.discount_id,
            user_id: usage.user_id,
            applied_by: usage.applied_by,
            applied_at: usage.applied_at,
            discount_amount: usage.discount_amount,
            discount_type: usage.discount_type,
            sequence_number: usage.sequence_number,
            forced: usage.forced,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApplyDiscountResponse {
    pub message: String,
    pub usage_record: UsageRecordResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(discount_type: &str, value: f64) -> DiscountCreate {
        serde_json::from_value(serde_json::json!({
            "name": "Launch promo",
            "discount_type": discount_type,
            "value": value
        }))
        .unwrap()
    }

    #[test]
    fn test_create_defaults() {
        let c = create("free_months", 2.0);
        assert_eq!(c.discount_type, DiscountType::FreeMonths);
        assert_eq!(c.per_user_limit, 1);
        assert!(c.is_active);
        assert!(c.usage_limit.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_value_must_be_positive() {
        assert!(create("fixed_amount", 0.0).validate().is_err());
        assert!(create("fixed_amount", -5.0).validate().is_err());
        assert!(create("fixed_amount", 250.0).validate().is_ok());
    }

    #[test]
    fn test_percentage_is_zero_to_hundred() {
        assert!(create("percentage", 100.0).validate().is_ok());
        assert!(create("percentage", 100.5).validate().is_err());
        // 0-1 fractions are accepted as tiny percentages, not rescaled
        assert!(create("percentage", 0.5).validate().is_ok());
    }

    #[test]
    fn test_limits() {
        let mut c = create("upgrade_discount", 10.0);
        c.per_user_limit = 0;
        assert!(c.validate().is_err());

        c.per_user_limit = 1;
        c.usage_limit = Some(0);
        assert!(c.validate().is_err());

        c.usage_limit = Some(100);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_negative_minimum_purchase() {
        let mut c = create("fixed_amount", 10.0);
        c.minimum_purchase = Some(-1.0);
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_unknown_type_rejected_by_serde() {
        let parsed: Result<DiscountCreate, _> = serde_json::from_value(serde_json::json!({
            "name": "x",
            "discount_type": "bogus",
            "value": 1.0
        }));
        assert!(parsed.is_err());
    }
}
