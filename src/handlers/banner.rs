use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{AuthService, BannerService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/banners/active",
    tag = "banner",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Banners visible to the caller, highest priority first", body = [BannerResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_active_banners(
    auth_service: web::Data<AuthService>,
    banner_service: web::Data<BannerService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    let user = match auth_service.get_user(&caller.id).await {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match banner_service.active_for_user(&user, Utc::now()).await {
        Ok(banners) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": banners
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/banners/{banner_id}/track",
    tag = "banner",
    params(
        ("banner_id" = String, Path, description = "Banner id")
    ),
    request_body = TrackInteractionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Interaction recorded; `tracked` is false for an unknown banner", body = TrackInteractionResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn track_interaction(
    banner_service: web::Data<BannerService>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<TrackInteractionRequest>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    let banner_id = path.into_inner();
    let action = request.action;

    match banner_service
        .track(&banner_id, &caller.id, action, Utc::now())
        .await
    {
        Ok(tracked) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": TrackInteractionResponse {
                banner_id,
                action,
                tracked,
            }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/banners",
    tag = "admin",
    request_body = BannerCreate,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Banner created", body = BannerResponse),
        (status = 403, description = "Admin role required"),
        (status = 422, description = "Invalid banner")
    )
)]
pub async fn create_banner(
    banner_service: web::Data<BannerService>,
    req: HttpRequest,
    request: web::Json<BannerCreate>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match banner_service
        .create(&caller.id, request.into_inner(), Utc::now())
        .await
    {
        Ok(banner) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": banner,
            "message": "Banner created"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/banners",
    tag = "admin",
    params(
        ("status" = Option<crate::entities::BannerStatus>, Query, description = "Only banners with this status")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All banners", body = [BannerResponse]),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_banners(
    banner_service: web::Data<BannerService>,
    query: web::Query<BannerListQuery>,
) -> Result<HttpResponse> {
    match banner_service.list(query.status).await {
        Ok(banners) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": banners
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/admin/banners/{banner_id}",
    tag = "admin",
    params(
        ("banner_id" = String, Path, description = "Banner id")
    ),
    request_body = BannerUpdate,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Banner updated", body = BannerResponse),
        (status = 404, description = "Banner not found"),
        (status = 422, description = "Invalid update")
    )
)]
pub async fn update_banner(
    banner_service: web::Data<BannerService>,
    path: web::Path<String>,
    request: web::Json<BannerUpdate>,
) -> Result<HttpResponse> {
    match banner_service
        .update(&path.into_inner(), request.into_inner(), Utc::now())
        .await
    {
        Ok(banner) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": banner,
            "message": "Banner updated"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/admin/banners/{banner_id}",
    tag = "admin",
    params(
        ("banner_id" = String, Path, description = "Banner id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Banner deleted"),
        (status = 404, description = "Banner not found")
    )
)]
pub async fn delete_banner(
    banner_service: web::Data<BannerService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match banner_service.delete(&path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Banner deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/banners/{banner_id}/analytics",
    tag = "admin",
    params(
        ("banner_id" = String, Path, description = "Banner id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Interaction counters and rates", body = BannerAnalytics),
        (status = 404, description = "Banner not found")
    )
)]
pub async fn get_banner_analytics(
    banner_service: web::Data<BannerService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match banner_service.analytics(&path.into_inner()).await {
        Ok(analytics) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": analytics
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn banner_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/banners")
            .route("/active", web::get().to(get_active_banners))
            .route("/{banner_id}/track", web::post().to(track_interaction)),
    );
}

/// Mounted inside the `/admin` scope.
pub fn admin_banner_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/banners")
            .route("", web::post().to(create_banner))
            .route("", web::get().to(list_banners))
            .route("/{banner_id}", web::put().to(update_banner))
            .route("/{banner_id}", web::delete().to(delete_banner))
            .route("/{banner_id}/analytics", web::get().to(get_banner_analytics)),
    );
}
