mod backend;
mod config;
mod error;
mod locale;
mod routes;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = match config::ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    let backend = match backend::HttpBackend::new(&config) {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!(error = %e, "backend client init failed");
            std::process::exit(1);
        }
    };

    let port = config.port;
    tracing::info!(backend_url = %config.backend_url, default_locale = %config.default_locale, "backend relay configured");

    let state = state::AppState::new(config, Arc::new(backend));
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "storefront listening");
    axum::serve(listener, app).await.expect("server failed");
}
