//! API Middleware
//!
//! Request logging through the application logger.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::logging::AsyncLogger;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id assigned by the request-id layer, or `-` when absent
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Logs request start and completion with the request id
pub async fn logging_middleware(
    State(logger): State<AsyncLogger>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = request_id(request.headers());

    let start = std::time::Instant::now();

    logger
        .info(
            format!("Request started: {} {}", method, path),
            vec![("request_id", request_id.clone())],
        )
        .await;

    let response = next.run(request).await;

    let duration = start.elapsed();
    logger
        .info(
            format!("Request completed: {} {}", method, path),
            vec![
                ("request_id", request_id),
                ("status", response.status().as_u16().to_string()),
                ("duration_ms", duration.as_millis().to_string()),
            ],
        )
        .await;

    response
}
