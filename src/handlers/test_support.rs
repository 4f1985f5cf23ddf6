//! Shared state for handler tests: migrated in-memory database, services and tokens.

use crate::database::test_pool;
use crate::entities::UserRole;
use crate::models::{RegisterRequest, UpdateTierRequest};
use crate::services::{AuthService, BannerService, DiscountService};
use crate::utils::JwtService;

pub(crate) struct TestState {
    pub jwt: JwtService,
    pub auth: AuthService,
    pub banners: BannerService,
    pub discounts: DiscountService,
}

impl TestState {
    pub async fn new() -> Self {
        let pool = test_pool().await;
        let jwt = JwtService::new("handler-test-secret", 3600);
        Self {
            auth: AuthService::new(pool.clone(), jwt.clone()),
            banners: BannerService::new(pool.clone()),
            discounts: DiscountService::new(pool),
            jwt,
        }
    }

    pub async fn admin_token(&self) -> String {
        let admin = self
            .auth
            .ensure_admin("admin@example.com", "Sup3rSecret", "Admin")
            .await
            .unwrap();
        self.jwt
            .generate_access_token(&admin.id, UserRole::Admin)
            .unwrap()
    }

    /// Registers a user, moves them to `tier` and returns `(access_token, user_id)`.
    pub async fn user_token(&self, email: &str, tier: &str) -> (String, String) {
        let res = self
            .auth
            .register(RegisterRequest {
                email: email.to_string(),
                password: "Password123".to_string(),
                full_name: "Test User".to_string(),
            })
            .await
            .unwrap();
        self.auth
            .set_subscription_tier(
                &res.user.user_id,
                UpdateTierRequest {
                    subscription_tier: tier.to_string(),
                },
            )
            .await
            .unwrap();
        (res.access_token, res.user.user_id)
    }
}

pub(crate) fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap($crate::middlewares::AuthMiddleware::new($state.jwt.clone()))
                .app_data(actix_web::web::Data::new($state.auth.clone()))
                .app_data(actix_web::web::Data::new($state.banners.clone()))
                .app_data(actix_web::web::Data::new($state.discounts.clone()))
                .configure($crate::handlers::health_config)
                .configure($crate::handlers::api_config),
        )
        .await
    };
}

pub(crate) use test_app;
