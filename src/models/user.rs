use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{UserRole, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::utils::{validate_email, validate_password};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "jordan@acme.io")]
    pub email: String,
    #[schema(example = "Password123")]
    pub password: String,
    #[schema(example = "Jordan Lee")]
    pub full_name: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_email(&self.email)?;
        validate_password(&self.password, &self.email)?;
        let name_len = self.full_name.trim().chars().count();
        if name_len == 0 || name_len > 255 {
            return Err(AppError::ValidationError(
                "Full name must be between 1 and 255 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Admin-only tier change. Self-registered accounts always start on `free`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateTierRequest {
    #[schema(example = "enterprise")]
    pub subscription_tier: String,
}

impl UpdateTierRequest {
    pub fn validate(&self) -> AppResult<()> {
        let len = self.subscription_tier.trim().chars().count();
        if len == 0 || len > 64 {
            return Err(AppError::ValidationError(
                "Subscription tier must be between 1 and 64 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "jordan@acme.io")]
    pub email: String,
    #[schema(example = "Password123")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub subscription_tier: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub expires_in: i64,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            subscription_tier: user.subscription_tier,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}
