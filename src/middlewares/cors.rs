use actix_cors::Cors;

/// CORS for the dashboard frontends. An empty `allowed_origins` accepts any
/// origin, which is what local development runs with.
pub fn create_cors(allowed_origins: &[String]) -> Cors {
    let allowed: Vec<String> = allowed_origins
        .iter()
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect();

    Cors::default()
        .allowed_origin_fn(move |origin, _req_head| {
            allowed.is_empty()
                || origin
                    .to_str()
                    .map(|o| allowed.iter().any(|a| a == o))
                    .unwrap_or(false)
        })
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header;
    use actix_web::{App, HttpResponse, test, web};

    async fn allow_origin_for(allowed: &[String], origin: &str) -> Option<String> {
        let app = test::init_service(
            App::new()
                .wrap(create_cors(allowed))
                .route("/health", web::get().to(HttpResponse::Ok)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/health")
            .insert_header((header::ORIGIN, origin))
            .to_request();
        let res = test::call_service(&app, req).await;
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    #[actix_web::test]
    async fn test_configured_origins_only() {
        let allowed = vec!["https://app.customermind.io/".to_string()];

        assert_eq!(
            allow_origin_for(&allowed, "https://app.customermind.io").await.as_deref(),
            Some("https://app.customermind.io")
        );
        assert_eq!(allow_origin_for(&allowed, "https://evil.example").await, None);
    }

    #[actix_web::test]
    async fn test_no_origins_configured_allows_any() {
        assert_eq!(
            allow_origin_for(&[], "http://localhost:5173").await.as_deref(),
            Some("http://localhost:5173")
        );
    }
}
