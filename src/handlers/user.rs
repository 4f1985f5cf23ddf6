use crate::middlewares::current_user;
use crate::models::*;
use crate::services::AuthService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "user",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Caller profile", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_me(auth_service: web::Data<AuthService>, req: HttpRequest) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match auth_service.get_user(&caller.id).await {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": UserResponse::from(user)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{user_id}/tier",
    tag = "admin",
    params(
        ("user_id" = String, Path, description = "User id")
    ),
    request_body = UpdateTierRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Tier updated", body = UserResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Invalid tier")
    )
)]
pub async fn update_user_tier(
    auth_service: web::Data<AuthService>,
    path: web::Path<String>,
    request: web::Json<UpdateTierRequest>,
) -> Result<HttpResponse> {
    match auth_service
        .set_subscription_tier(&path.into_inner(), request.into_inner())
        .await
    {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": UserResponse::from(user)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/users").route("/me", web::get().to(get_me)));
}

pub fn admin_user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users").route("/{user_id}/tier", web::put().to(update_user_tier)),
    );
}
