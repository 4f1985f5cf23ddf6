use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{BannerStatus, BannerType, DiscountType, InteractionAction, UserRole};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::register,
        handlers::auth::login,
        handlers::user::get_me,
        handlers::user::update_user_tier,
        handlers::banner::get_active_banners,
        handlers::banner::track_interaction,
        handlers::banner::create_banner,
        handlers::banner::list_banners,
        handlers::banner::update_banner,
        handlers::banner::delete_banner,
        handlers::banner::get_banner_analytics,
        handlers::discount::get_available_discounts,
        handlers::discount::create_discount,
        handlers::discount::list_discounts,
        handlers::discount::get_discount,
        handlers::discount::update_discount,
        handlers::discount::delete_discount,
        handlers::discount::apply_discount,
        handlers::discount::get_discount_usage,
    ),
    components(
        schemas(
            UserRole,
            RegisterRequest,
            LoginRequest,
            UpdateTierRequest,
            UserResponse,
            AuthResponse,
            BannerStatus,
            BannerType,
            InteractionAction,
            BannerCreate,
            BannerUpdate,
            BannerResponse,
            TrackInteractionRequest,
            TrackInteractionResponse,
            BannerAnalytics,
            DiscountType,
            DiscountCreate,
            DiscountUpdate,
            DiscountResponse,
            UsageRecordResponse,
            ApplyDiscountResponse,
            ErrorResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Registration and login"),
        (name = "user", description = "Caller profile"),
        (name = "banner", description = "Announcement banners for signed-in users"),
        (name = "discount", description = "Discounts available to signed-in users"),
        (name = "admin", description = "Banner and discount administration"),
    ),
    info(
        title = "CustomerMind IQ API",
        version = "1.0.0",
        description = "Banner targeting and discount management REST API"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
