//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use std::time::Duration;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use routes::{create_router, AppState};

/// Build the application router with its middleware stack
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    // ServiceBuilder applies layers top to bottom: the request id is set
    // before anything logs, and the timeout wraps only the handler.
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.logger.clone(),
            middleware::logging_middleware,
        ))
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .route("/health", get(health_check))
        .merge(create_router())
        .layer(middleware)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
