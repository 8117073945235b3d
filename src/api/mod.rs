//! Edge KV API served over HTTP.

pub mod error;
pub mod routes;

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage::StorageProvider;

use self::error::ApiError;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::kv_routes())
        .fallback(route_not_found)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn route_not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Route not found")
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: &AppConfig) -> AppResult<()> {
    if config.storage.provider == StorageProvider::RemoteKv {
        return Err(AppError::config(
            "the server cannot use the kv provider as its own backend; choose local or db",
        ));
    }

    let state = AppState::from_config(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    info!(
        target: "app::api",
        addr = %config.server.bind_addr,
        provider = %config.storage.provider,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(target: "app::api", "shutdown requested");
    }
}
