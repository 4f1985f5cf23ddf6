use crate::entities::UserRole;
use crate::error::{AppError, AppResult};
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

const ADMIN_PREFIX: &str = "/api/admin";

struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![
                "/health",
                "/swagger-ui",
                "/swagger-ui/",
                "/api-docs/openapi.json",
            ],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/api/auth/"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }
        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

/// Caller identity taken from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Identity stored by [`AuthMiddleware`] for the current request.
pub fn current_user(req: &HttpRequest) -> AppResult<AuthUser> {
    req.extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S> AuthMiddlewareService<S> {
    fn authenticate(&self, req: &ServiceRequest) -> AppResult<AuthUser> {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))?;

        let claims = self
            .jwt_service
            .verify_access_token(token)
            .map_err(|_| AppError::AuthError("Invalid access token".to_string()))?;

        let user = AuthUser {
            id: claims.sub,
            role: claims.role,
        };
        if req.path().starts_with(ADMIN_PREFIX) && !user.is_admin() {
            log::warn!("User {} denied access to {}", user.id, req.path());
            return Err(AppError::Forbidden);
        }
        Ok(user)
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight
        if req.method() == Method::OPTIONS || self.public_paths.is_public_path(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        match self.authenticate(&req) {
            Ok(user) => {
                req.extensions_mut().insert(user);
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(error) => Box::pin(async move { Err(error.into()) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match current_user(&req) {
            Ok(user) => HttpResponse::Ok().body(user.id),
            Err(_) => HttpResponse::Ok().body("anonymous"),
        }
    }

    fn jwt() -> JwtService {
        JwtService::new("middleware-secret", 3600)
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .wrap(AuthMiddleware::new(jwt()))
                    .route("/health", web::get().to(whoami))
                    .route("/api/banners/active", web::get().to(whoami))
                    .route("/api/admin/banners", web::get().to(whoami)),
            )
            .await
        };
    }

    fn bearer(user_id: &str, role: UserRole) -> (&'static str, String) {
        let token = jwt().generate_access_token(user_id, role).unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    fn status_of(err: Error) -> StatusCode {
        err.as_response_error().status_code()
    }

    #[::core::prelude::v1::test]
    fn test_public_paths() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path("/health"));
        assert!(paths.is_public_path("/api/auth/login"));
        assert!(paths.is_public_path("/swagger-ui/index.html"));
        assert!(!paths.is_public_path("/api/banners/active"));
        assert!(!paths.is_public_path("/api/admin/discounts"));
    }

    #[actix_web::test]
    async fn test_public_path_needs_no_token() {
        let app = app!();
        let req = test::TestRequest::get().uri("/health").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "anonymous");
    }

    #[actix_web::test]
    async fn test_missing_and_invalid_token() {
        let app = app!();

        let req = test::TestRequest::get().uri("/api/banners/active").to_request();
        let err = app.call(req).await.err().unwrap();
        assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/banners/active")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let err = app.call(req).await.err().unwrap();
        assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_user_token_sets_identity() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/banners/active")
            .insert_header(bearer("user-1", UserRole::User))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "user-1");
    }

    #[actix_web::test]
    async fn test_admin_prefix_requires_admin_role() {
        let app = app!();

        let req = test::TestRequest::get()
            .uri("/api/admin/banners")
            .insert_header(bearer("user-1", UserRole::User))
            .to_request();
        let err = app.call(req).await.err().unwrap();
        assert_eq!(status_of(err), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/admin/banners")
            .insert_header(bearer("admin-1", UserRole::Admin))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "admin-1");
    }
}
