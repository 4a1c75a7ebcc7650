//! HTTP surface shared by the standalone server and the Lambda adapter.

pub mod error;
pub mod extractors;
pub mod handlers;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::JwksAuthenticator;
use crate::config::Config;
use crate::store::{HistoryRepository, InMemoryHistoryRepository};
use error::ApiError;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub history: Arc<dyn HistoryRepository>,
    /// `None` leaves the signature routes open
    pub auth: Option<Arc<JwksAuthenticator>>,
}

impl AppState {
    pub fn new(history: Arc<dyn HistoryRepository>, auth: Option<JwksAuthenticator>) -> Self {
        Self {
            history,
            auth: auth.map(Arc::new),
        }
    }

    /// In-memory history, plus the bearer guard when a JWKS URL is configured
    pub fn from_config(config: &Config) -> Self {
        let auth = config.auth.clone().map(JwksAuthenticator::new);
        Self::new(Arc::new(InMemoryHistoryRepository::new()), auth)
    }
}

/// Create CORS layer for the configured origins
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    if allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(AnyOrigin);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim_end_matches('/').parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

fn handle_panic(_: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::Internal("handler panicked".to_string()).into_response()
}

/// Create the router with every route under both `/` and `/api`
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/health", get(handlers::health))
        .route("/verify-signature", post(handlers::verify_signature))
        .route("/api/verify-signature", post(handlers::verify_signature))
        .route("/history", get(handlers::history))
        .route("/api/history", get(handlers::history))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}
