pub mod admin;
pub mod auth;
pub mod banner;
pub mod discount;
pub mod health;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support;

pub use admin::admin_config;
pub use auth::auth_config;
pub use banner::banner_config;
pub use discount::discount_config;
pub use health::health_config;
pub use user::user_config;

use actix_web::web;

/// Every JSON route under `/api`.
pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(auth_config)
            .configure(user_config)
            .configure(banner_config)
            .configure(discount_config)
            .configure(admin_config),
    );
}
