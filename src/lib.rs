pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod providers;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

/// Name under which the proxy was deployed as a hosted function
pub const FUNCTION_PATH: &str = "/lingua_franca_openai_proxy";

/// CORS headers attached to every response, preflight and errors included
pub const CORS_HEADERS: [(HeaderName, &str); 4] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    (header::ACCESS_CONTROL_MAX_AGE, "3600"),
];

/// Load configuration from environment variables
pub fn load_config() -> Result<Config> {
    Ok(Config::load()?)
}

/// Build the application router with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let proxy_routes = post(handlers::proxy).options(handlers::preflight);

    let cors = CORS_HEADERS.map(|(name, value)| {
        SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
    });
    let [origin, methods, headers, max_age] = cors;

    Router::new()
        .route("/", proxy_routes.clone())
        .route(FUNCTION_PATH, proxy_routes)
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(origin)
                .layer(methods)
                .layer(headers)
                .layer(max_age),
        )
}

/// Start the HTTP server and serve until Ctrl+C.
pub async fn run_server(config: Config) -> Result<()> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind {}: {}", address, e)))?;
    tracing::info!(address = %address, "Lingua Franca proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
