//! olab-daemon entry point.
//!
//! Intentionally thin: load config, set up tracing, build the shared state,
//! wire middleware, serve. All route handlers live in `routes.rs`; shared
//! state types live in `state.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use olab_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Dev convenience; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let config_path = olab_config::path_from_env();
    let loaded = olab_config::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    info!(
        config = %config_path.display(),
        fingerprint = %loaded.fingerprint,
        catalog_entries = loaded.config.catalog.len(),
        "config loaded"
    );

    let addr = bind_addr(&loaded.config)?;
    let shared = Arc::new(state::AppState::new(loaded.config));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    info!("olab-daemon listening on http://{}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// Bind address: env override, then config, then the default port.
fn bind_addr(config: &olab_config::ServiceConfig) -> anyhow::Result<SocketAddr> {
    let raw = std::env::var(olab_config::ENV_BIND_ADDR)
        .ok()
        .or_else(|| config.bind_addr.clone())
        .unwrap_or_else(|| "127.0.0.1:8870".to_string());
    raw.parse()
        .with_context(|| format!("invalid bind address '{raw}'"))
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers(tower_http::cors::Any)
}
