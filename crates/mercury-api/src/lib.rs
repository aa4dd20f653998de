//! The HTTP surface: axum router, request handlers, and the admission
//! pipeline they sit on top of.

pub mod handlers;
pub mod metrics;
pub mod pipeline;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use redis::aio::ConnectionManager;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use metrics::Metrics;
pub use pipeline::AdmissionPipeline;

pub struct AppState {
    pub pipeline: AdmissionPipeline,
    pub metrics: Metrics,
    pub mercury_redis: ConnectionManager,
    pub pipeline_redis: ConnectionManager,
}

/// Build the full router. `request_timeout` bounds every handler.
pub fn router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/keys/bind", post(handlers::bind))
        .route("/api/keys/retrieve", post(handlers::retrieve))
        .route("/api/requests/:id", get(handlers::get_request))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::metrics))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
