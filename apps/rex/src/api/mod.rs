//! # Rex HTTP API Module
//!
//! REST surface for UI components, served with axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Session counters and selected server
//! - `GET /generations` - All generations, oldest first
//! - `GET /history` - Compiled history
//! - `GET /focus` - Current focus with full detail
//! - `POST /focus/clear` - Deselect the focus
//! - `POST /focus/entity`, `POST /focus/relationship` - Toggle or reload focus
//! - `POST /entity`, `POST /relationship` - Retrieve from the selected server
//! - `POST /explore` - One-hop traversal around the focus entity
//! - `POST /traversal` - Commit a search result selection
//! - `POST /undo` - Remove the newest generation
//! - `POST /clear` - Reset the session
//! - `PUT /server` - Select the repository server

mod handlers;
mod middleware;
mod types;

pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    ActionResponse, FocusResponse, GenerationsResponse, GuidRequest, HealthResponse,
    HistoryResponse, ServerRequest, StatusResponse, UndoResponse,
};

use crate::config::ServerSettings;
use crate::explorer::Explorer;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use rex_core::RexError;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum accepted request body.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub explorer: Arc<Explorer>,
}

impl AppState {
    #[must_use]
    pub fn new(explorer: Explorer) -> Self {
        Self {
            explorer: Arc::new(explorer),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `cors_origins`.
///
/// - `"*"`: any origin
/// - unset: localhost only
/// - otherwise: the comma-separated list, or localhost if none parse
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                restricted_cors(allowed)
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();
    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware.
///
/// Outer to inner: tracing, CORS, body limit, rate limiting.
pub fn create_router(state: AppState, settings: &ServerSettings) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/generations", get(handlers::generations_handler))
        .route("/history", get(handlers::history_handler))
        .route("/focus", get(handlers::focus_handler))
        .route("/focus/clear", post(handlers::clear_focus_handler))
        .route("/focus/entity", post(handlers::focus_entity_handler))
        .route("/focus/relationship", post(handlers::focus_relationship_handler))
        .route("/entity", post(handlers::entity_handler))
        .route("/relationship", post(handlers::relationship_handler))
        .route("/explore", post(handlers::explore_handler))
        .route("/traversal", post(handlers::traversal_handler))
        .route("/undo", post(handlers::undo_handler))
        .route("/clear", post(handlers::clear_handler))
        .route("/server", put(handlers::server_handler));

    if settings.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", settings.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(settings.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(settings.cors_origins.as_deref()))
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve until Ctrl-C.
pub async fn run_server(settings: &ServerSettings, explorer: Explorer) -> Result<(), RexError> {
    let addr = settings.addr();
    let router = create_router(AppState::new(explorer), settings);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RexError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Rex HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Cannot listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down");
        })
        .await
        .map_err(|e| RexError::IoError(format!("Server error: {}", e)))
}
