//! HTTP API: routing and shared handler state

mod auth;
mod error;
mod handlers;

pub use auth::{LEARNER_HEADER, Learner};
pub use error::ApiError;

use axum::{
    Router,
    routing::{get, post},
};
use dwell_core::SessionTracker;
use dwell_util::Clock;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub tracker: Arc<SessionTracker>,
    pub clock: Arc<dyn Clock>,
}

/// Build the router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/subsections/progress/summary", get(handlers::summary))
        .route("/subsections/progress/:id/start", post(handlers::start))
        .route("/subsections/progress/:id/heartbeat", post(handlers::heartbeat))
        .route("/subsections/progress/:id/complete", post(handlers::complete))
        .route("/subsections/progress/:id/status", get(handlers::status))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
