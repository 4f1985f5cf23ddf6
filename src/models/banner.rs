use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common::double_option;
use crate::entities::{BannerStatus, BannerType, InteractionAction, banner_entity as banners};
use crate::error::{AppError, AppResult};
use crate::rules::DateWindow;
use crate::utils::validate_email;

pub const MAX_BANNER_PRIORITY: i32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BannerCreate {
    #[schema(example = "Scheduled maintenance")]
    pub title: String,
    #[schema(example = "The dashboard will be read-only on Sunday 02:00-03:00 UTC.")]
    pub message: String,
    #[serde(default = "default_banner_type")]
    pub banner_type: BannerType,
    /// Only `draft` and `paused` are honored; otherwise derived from the dates
    pub status: Option<BannerStatus>,
    /// Empty = every user
    #[serde(default)]
    pub target_users: Vec<String>,
    /// Empty = every tier
    #[serde(default)]
    pub target_tiers: Vec<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_dismissible: bool,
    /// 0..=10, higher shows first
    #[serde(default)]
    pub priority: i32,
    pub action_text: Option<String>,
    pub action_url: Option<String>,
}

fn default_banner_type() -> BannerType {
    BannerType::Info
}

fn default_true() -> bool {
    true
}

impl BannerCreate {
    pub fn validate(&self) -> AppResult<()> {
        validate_banner_text(&self.title, &self.message)?;
        validate_priority(self.priority)?;
        validate_target_users(&self.target_users)?;
        validate_window(&DateWindow::new(self.start_date, self.end_date))
    }
}

/// Partial update: absent fields are left untouched, `null` clears optional ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BannerUpdate {
    pub title: Option<String>,
    pub message: Option<String>,
    pub banner_type: Option<BannerType>,
    pub status: Option<BannerStatus>,
    pub target_users: Option<Vec<String>>,
    pub target_tiers: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub is_dismissible: Option<bool>,
    pub priority: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub action_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub action_url: Option<Option<String>>,
}

impl BannerUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(title) = &self.title {
            validate_banner_text(title, "-")?;
        }
        if let Some(message) = &self.message {
            validate_banner_text("-", message)?;
        }
        if let Some(priority) = self.priority {
            validate_priority(priority)?;
        }
        if let Some(users) = &self.target_users {
            validate_target_users(users)?;
        }
        Ok(())
    }
}

fn validate_banner_text(title: &str, message: &str) -> AppResult<()> {
    let title_len = title.trim().chars().count();
    if title_len == 0 || title_len > 255 {
        return Err(AppError::ValidationError(
            "Title must be between 1 and 255 characters".to_string(),
        ));
    }
    if message.trim().is_empty() {
        return Err(AppError::ValidationError("Message must not be empty".to_string()));
    }
    Ok(())
}

fn validate_priority(priority: i32) -> AppResult<()> {
    if !(0..=MAX_BANNER_PRIORITY).contains(&priority) {
        return Err(AppError::ValidationError(format!(
            "Priority must be between 0 and {MAX_BANNER_PRIORITY}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_target_users(emails: &[String]) -> AppResult<()> {
    emails.iter().try_for_each(|email| validate_email(email))
}

pub(crate) fn validate_window(window: &DateWindow) -> AppResult<()> {
    if !window.is_well_formed() {
        return Err(AppError::ValidationError(
            "end_date must not be before start_date".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BannerResponse {
    pub banner_id: String,
    pub title: String,
    pub message: String,
    pub banner_type: BannerType,
    pub status: BannerStatus,
    pub target_users: Vec<String>,
    pub target_tiers: Vec<String>,
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

impl From<banners::Model> for BannerResponse {
    fn from(banner: banners::Model) -> Self {
        Self {
            banner_id: banner.id,
            title: banner.title,
            message: banner.message,
            banner_type: banner.banner_type,
            status: banner.status,
            target_users: banner.target_users.into_inner(),
            target_tiers: banner.target_tiers.into_inner(),
            start_date: banner.start_date,
            end_date: banner.end_date,
            is_dismissible: banner.is_dismissible,
            priority: banner.priority,
            action_text: banner.action_text,
            action_url: banner.action_url,
            views: banner.views,
            clicks: banner.clicks,
            dismissals: banner.dismissals,
            created_by: banner.created_by,
            created_at: banner.created_at,
            updated_at: banner.updated_at,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct BannerListQuery {
    pub status: Option<BannerStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrackInteractionRequest {
    pub action: InteractionAction,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrackInteractionResponse {
    pub banner_id: String,
    pub action: InteractionAction,
    /// false when the banner id did not match any banner
    pub tracked: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BannerAnalytics {
    pub banner_id: String,
    pub title: String,
    pub status: BannerStatus,
    pub views: i64,
    pub clicks: i64,
    pub dismissals: i64,
    /// clicks / views, in percent
    pub click_through_rate: f64,
    /// dismissals / views, in percent
    pub dismissal_rate: f64,
}

fn percent(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 10_000.0).round() / 100.0
}

impl From<banners::Model> for BannerAnalytics {
    fn from(banner: banners::Model) -> Self {
        Self {
            click_through_rate: percent(banner.clicks, banner.views),
            dismissal_rate: percent(banner.dismissals, banner.views),
            banner_id: banner.id,
            title: banner.title,
            status: banner.status,
            views: banner.views,
            clicks: banner.clicks,
            dismissals: banner.dismissals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create() -> BannerCreate {
        serde_json::from_value(serde_json::json!({
            "title": "New feature",
            "message": "Journey maps are live"
        }))
        .unwrap()
    }

    #[test]
    fn test_create_defaults() {
        let c = create();
        assert_eq!(c.banner_type, BannerType::Info);
        assert!(c.is_dismissible);
        assert_eq!(c.priority, 0);
        assert!(c.target_users.is_empty());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_priority_range() {
        let mut c = create();
        c.priority = 10;
        assert!(c.validate().is_ok());
        c.priority = 11;
        assert!(matches!(c.validate(), Err(AppError::ValidationError(_))));
        c.priority = -1;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_rejects_reversed_window() {
        let mut c = create();
        c.start_date = Some(Utc::now());
        c.end_date = Some(Utc::now() - chrono::Duration::days(1));
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_target_email() {
        let mut c = create();
        c.target_users = vec!["not-an-email".to_string()];
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_update_validation() {
        let update = BannerUpdate { priority: Some(12), ..Default::default() };
        assert!(update.validate().is_err());

        let update = BannerUpdate { title: Some("  ".to_string()), ..Default::default() };
        assert!(update.validate().is_err());

        assert!(BannerUpdate::default().validate().is_ok());
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 3), 33.33);
        assert_eq!(percent(5, 10), 50.0);
    }
}
