//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression,
//! and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use sage_core::config::SageConfig;
use sage_core::error::SageError;

use crate::handlers;
use crate::state::AppState;

/// Origins allowed to call the API from a browser.
fn local_origins(port: u16) -> Vec<HeaderValue> {
    ["127.0.0.1", "localhost"]
        .iter()
        .filter_map(|host| format!("http://{}:{}", host, port).parse().ok())
        .collect()
}

/// Create the axum Router with all routes and middleware.
///
/// # Arguments
/// * `state` - The shared application state.
///
/// # Returns
/// A fully configured axum Router ready to serve requests.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(local_origins(state.config.general.port)))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let page_routes = Router::new()
        .route("/", get(handlers::ui))
        .route("/health", get(handlers::health));

    let chat_routes = Router::new()
        .route("/classify", post(handlers::classify))
        .route("/sessions", post(handlers::open_session))
        .route("/sessions/{id}", delete(handlers::close_session))
        .route(
            "/sessions/{id}/messages",
            get(handlers::get_messages).post(handlers::ask),
        )
        .layer(DefaultBodyLimit::max(64 * 1024));

    page_routes
        .merge(chat_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
///
/// Binds to 127.0.0.1 (localhost only) on the port from config.
pub async fn start_server(config: &SageConfig, state: AppState) -> Result<(), SageError> {
    let addr = format!("127.0.0.1:{}", config.general.port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SageError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| SageError::Api(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_origins() {
        let origins = local_origins(3030);
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "http://127.0.0.1:3030");
        assert_eq!(origins[1], "http://localhost:3030");
    }
}
