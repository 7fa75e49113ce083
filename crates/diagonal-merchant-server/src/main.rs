use std::time::Duration;

use actix_web::{web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use diagonal_server::bootstrap::build_state;
use diagonal_server::config::ServerConfig;
use diagonal_server::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            std::process::exit(1);
        }
    };
    tracing::debug!(?config, "loaded configuration");

    let state = match build_state(&config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(kind = ?e.kind(), "failed to start: {e}");
            std::process::exit(1);
        }
    };
    state.authorizer.start_lock_cleanup(Duration::from_secs(60));

    let state = web::Data::new(state);
    let port = config.port;

    tracing::info!("Diagonal merchant server listening on port {port}");
    tracing::info!("  POST http://localhost:{port}/webhook");
    tracing::info!("  GET  http://localhost:{port}/health");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::default().limit(262_144))
            .service(routes::webhook)
            .service(routes::health)
            .service(routes::metrics_endpoint)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
