use actix_web::web;

use super::banner::admin_banner_config;
use super::discount::admin_discount_config;
use super::user::admin_user_config;

/// Admin routes. Role checks happen in `AuthMiddleware` for the whole prefix.
pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .configure(admin_banner_config)
            .configure(admin_discount_config)
            .configure(admin_user_config),
    );
}
