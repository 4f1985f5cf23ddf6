use crate::entities::{UserRole, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::rules::normalize_key;
use crate::utils::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use uuid::Uuid;

pub const DEFAULT_SUBSCRIPTION_TIER: &str = "free";

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let email = normalize_email(&request.email);
        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user = self
            .insert_user(
                &email,
                &request.password,
                request.full_name.trim(),
                UserRole::User,
                DEFAULT_SUBSCRIPTION_TIER,
            )
            .await?;
        log::info!("User registered: {}", user.id);

        self.issue(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);
        let invalid = || AppError::AuthError("Invalid email or password".to_string());

        let user = self.find_by_email(&email).await?.ok_or_else(invalid)?;
        if !user.is_active || !verify_password(&request.password, &user.password_hash)? {
            return Err(invalid());
        }

        self.issue(user)
    }

    pub async fn get_user(&self, user_id: &str) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Moves a user to another subscription tier. Only reachable through the
    /// admin routes.
    pub async fn set_subscription_tier(
        &self,
        user_id: &str,
        request: UpdateTierRequest,
    ) -> AppResult<users::Model> {
        request.validate()?;
        let tier = normalize_key(&request.subscription_tier);

        let mut model = self.get_user(user_id).await?.into_active_model();
        model.subscription_tier = Set(tier);
        model.updated_at = Set(Utc::now());
        let user = model.update(&self.pool).await?;
        log::info!("User {} moved to tier {}", user.id, user.subscription_tier);
        Ok(user)
    }

    /// Creates the configured admin account, or promotes it if the email
    /// already belongs to a regular user. The password of an existing
    /// account is left alone.
    pub async fn ensure_admin(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> AppResult<users::Model> {
        validate_email(email)?;
        let email = normalize_email(email);

        if let Some(existing) = self.find_by_email(&email).await? {
            if existing.role == UserRole::Admin {
                return Ok(existing);
            }
            let mut model = existing.into_active_model();
            model.role = Set(UserRole::Admin);
            model.updated_at = Set(Utc::now());
            let promoted = model.update(&self.pool).await?;
            log::info!("Promoted {} to admin", promoted.id);
            return Ok(promoted);
        }

        validate_password(password, &email)?;
        let admin = self
            .insert_user(&email, password, full_name, UserRole::Admin, "enterprise")
            .await?;
        log::info!("Bootstrap admin created: {}", admin.id);
        Ok(admin)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<users::Model>> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.pool)
            .await?)
    }

    async fn insert_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: UserRole,
        tier: &str,
    ) -> AppResult<users::Model> {
        let now = Utc::now();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            email: Set(email.to_string()),
            password_hash: Set(hash_password(password)?),
            full_name: Set(full_name.to_string()),
            role: Set(role),
            subscription_tier: Set(tier.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await?;
        Ok(user)
    }

    fn issue(&self, user: users::Model) -> AppResult<AuthResponse> {
        let access_token = self.jwt_service.generate_access_token(&user.id, user.role)?;
        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }
}
