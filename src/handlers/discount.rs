use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{AuthService, DiscountService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/discounts/available",
    tag = "discount",
    params(
        ("tier" = Option<String>, Query, description = "Check tier targeting against this tier instead of the caller's")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Discounts the caller can use now", body = [DiscountResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_available_discounts(
    auth_service: web::Data<AuthService>,
    discount_service: web::Data<DiscountService>,
    req: HttpRequest,
    query: web::Query<AvailableDiscountQuery>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    let user = match auth_service.get_user(&caller.id).await {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match discount_service
        .available_for_user(&user, query.tier.as_deref(), Utc::now())
        .await
    {
        Ok(discounts) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": discounts
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/discounts",
    tag = "admin",
    request_body = DiscountCreate,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Discount created", body = DiscountResponse),
        (status = 403, description = "Admin role required"),
        (status = 422, description = "Invalid discount")
    )
)]
pub async fn create_discount(
    discount_service: web::Data<DiscountService>,
    req: HttpRequest,
    request: web::Json<DiscountCreate>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match discount_service
        .create(&caller.id, request.into_inner(), Utc::now())
        .await
    {
        Ok(discount) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": discount,
            "message": "Discount created"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/discounts",
    tag = "admin",
    params(
        ("active_only" = Option<bool>, Query, description = "Hide inactive discounts")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All discounts, newest first", body = [DiscountResponse]),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_discounts(
    discount_service: web::Data<DiscountService>,
    query: web::Query<DiscountListQuery>,
) -> Result<HttpResponse> {
    match discount_service
        .list(query.active_only.unwrap_or(false), Utc::now())
        .await
    {
        Ok(discounts) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": discounts
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/discounts/{discount_id}",
    tag = "admin",
    params(
        ("discount_id" = String, Path, description = "Discount id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Discount", body = DiscountResponse),
        (status = 404, description = "Discount not found")
    )
)]
pub async fn get_discount(
    discount_service: web::Data<DiscountService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match discount_service.get(&path.into_inner(), Utc::now()).await {
        Ok(discount) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": discount
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/admin/discounts/{discount_id}",
    tag = "admin",
    params(
        ("discount_id" = String, Path, description = "Discount id")
    ),
    request_body = DiscountUpdate,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Discount updated", body = DiscountResponse),
        (status = 404, description = "Discount not found"),
        (status = 422, description = "Invalid update")
    )
)]
pub async fn update_discount(
    discount_service: web::Data<DiscountService>,
    path: web::Path<String>,
    request: web::Json<DiscountUpdate>,
) -> Result<HttpResponse> {
    match discount_service
        .update(&path.into_inner(), request.into_inner(), Utc::now())
        .await
    {
        Ok(discount) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": discount,
            "message": "Discount updated"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/admin/discounts/{discount_id}",
    tag = "admin",
    params(
        ("discount_id" = String, Path, description = "Discount id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Discount and its usage history deleted"),
        (status = 404, description = "Discount not found")
    )
)]
pub async fn delete_discount(
    discount_service: web::Data<DiscountService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match discount_service.delete(&path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Discount deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/discounts/{discount_id}/apply/{user_id}",
    tag = "admin",
    params(
        ("discount_id" = String, Path, description = "Discount id"),
        ("user_id" = String, Path, description = "User receiving the discount"),
        ("force" = Option<bool>, Query, description = "Skip eligibility checks")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Usage recorded", body = ApplyDiscountResponse),
        (status = 404, description = "Discount or user not found"),
        (status = 409, description = "User not eligible or limit reached")
    )
)]
pub async fn apply_discount(
    discount_service: web::Data<DiscountService>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    query: web::Query<ApplyDiscountQuery>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    let (discount_id, user_id) = path.into_inner();

    match discount_service
        .apply(
            &discount_id,
            &user_id,
            &caller.id,
            query.force.unwrap_or(false),
            Utc::now(),
        )
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/discounts/{discount_id}/usage",
    tag = "admin",
    params(
        ("discount_id" = String, Path, description = "Discount id"),
        ("page" = Option<u32>, Query, description = "Page number, from 1"),
        ("per_page" = Option<u32>, Query, description = "Page size, 1-100")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Usage records, newest first", body = [UsageRecordResponse]),
        (status = 404, description = "Discount not found")
    )
)]
pub async fn get_discount_usage(
    discount_service: web::Data<DiscountService>,
    path: web::Path<String>,
    query: web::Query<DiscountUsageQuery>,
) -> Result<HttpResponse> {
    let params = PaginationParams::new(query.page, query.per_page);
    match discount_service
        .usage_history(&path.into_inner(), &params)
        .await
    {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn discount_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/discounts").route("/available", web::get().to(get_available_discounts)),
    );
}

/// Mounted inside the `/admin` scope.
pub fn admin_discount_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/discounts")
            .route("", web::post().to(create_discount))
            .route("", web::get().to(list_discounts))
            .route("/{discount_id}", web::get().to(get_discount))
            .route("/{discount_id}", web::put().to(update_discount))
            .route("/{discount_id}", web::delete().to(delete_discount))
            .route(
                "/{discount_id}/apply/{user_id}",
                web::post().to(apply_discount),
            )
            .route("/{discount_id}/usage", web::get().to(get_discount_usage)),
    );
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn test_apply_flow_with_force() {
        let state = TestState::new().await;
        let app = test_app!(state);
        let admin = state.admin_token().await;
        let (user, user_id) = state.user_token("pat@example.com", "growth").await;

        let req = test::TestRequest::post()
            .uri("/api/admin/discounts")
            .insert_header(bearer(&admin))
            .set_json(json!({
                "name": "Growth 20",
                "discount_type": "percentage",
                "value": 20.0,
                "target_tiers": ["growth"]
            }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["data"]["discount_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/discounts/available")
            .insert_header(bearer(&user))
            .to_request();
        let available: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(available["data"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/discounts/{id}/apply/{user_id}"))
            .insert_header(bearer(&admin))
            .to_request();
        let applied: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(applied["data"]["usage_record"]["user_id"], user_id.as_str());
        assert_eq!(applied["data"]["usage_record"]["discount_amount"], 20.0);

        let req = test::TestRequest::get()
            .uri("/api/discounts/available")
            .insert_header(bearer(&user))
            .to_request();
        let available: Value = test::call_and_read_body_json(&app, req).await;
        assert!(available["data"].as_array().unwrap().is_empty());

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/discounts/{id}/apply/{user_id}"))
            .insert_header(bearer(&admin))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/discounts/{id}/apply/{user_id}?force=true"))
            .insert_header(bearer(&admin))
            .to_request();
        let forced: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(forced["data"]["usage_record"]["forced"], true);

        let req = test::TestRequest::get()
            .uri(&format!("/api/admin/discounts/{id}/usage?page=1&per_page=10"))
            .insert_header(bearer(&admin))
            .to_request();
        let usage: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(usage["data"]["total"], 2);

        let req = test::TestRequest::get()
            .uri(&format!("/api/admin/discounts/{id}"))
            .insert_header(bearer(&admin))
            .to_request();
        let stored: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stored["data"]["total_uses"], 2);
    }

    #[actix_web::test]
    async fn test_available_with_tier_override() {
        let state = TestState::new().await;
        let app = test_app!(state);
        let admin = state.admin_token().await;
        let (user, _) = state.user_token("pat@example.com", "growth").await;

        let req = test::TestRequest::post()
            .uri("/api/admin/discounts")
            .insert_header(bearer(&admin))
            .set_json(json!({
                "name": "Enterprise months",
                "discount_type": "free_months",
                "value": 2.0,
                "target_tiers": ["enterprise"]
            }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/api/discounts/available")
            .insert_header(bearer(&user))
            .to_request();
        let own_tier: Value = test::call_and_read_body_json(&app, req).await;
        assert!(own_tier["data"].as_array().unwrap().is_empty());

        let req = test::TestRequest::get()
            .uri("/api/discounts/available?tier=enterprise")
            .insert_header(bearer(&user))
            .to_request();
        let overridden: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(overridden["data"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_apply_unknown_discount_is_not_found() {
        let state = TestState::new().await;
        let app = test_app!(state);
        let admin = state.admin_token().await;
        let (_, user_id) = state.user_token("pat@example.com", "growth").await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/discounts/missing/apply/{user_id}"))
            .insert_header(bearer(&admin))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["detail"], "Discount not found");
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[actix_web::test]
    async fn test_percentage_over_hundred_rejected() {
        let state = TestState::new().await;
        let app = test_app!(state);
        let admin = state.admin_token().await;

        let req = test::TestRequest::post()
            .uri("/api/admin/discounts")
            .insert_header(bearer(&admin))
            .set_json(json!({"name": "Too much", "discount_type": "percentage", "value": 150.0}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
