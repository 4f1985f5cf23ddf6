use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write;

use customermind_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());
    let banner_service = BannerService::new(pool.clone());
    let discount_service = DiscountService::new(pool.clone());

    if let (Some(email), Some(password)) = (&config.admin.email, &config.admin.password) {
        let full_name = config.admin.full_name.as_deref().unwrap_or("Administrator");
        if let Err(e) = auth_service.ensure_admin(email, password, full_name).await {
            log::error!("Failed to bootstrap admin account: {e}");
        }
    } else {
        log::warn!("No bootstrap admin configured (ADMIN_EMAIL / ADMIN_PASSWORD)");
    }

    tasks::spawn_all(&config.tasks, banner_service.clone());

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let allowed_origins = config.server.allowed_origins.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors(&allowed_origins))
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(banner_service.clone()))
            .app_data(web::Data::new(discount_service.clone()))
            .configure(swagger_config)
            .configure(handlers::health_config)
            .configure(handlers::api_config)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
