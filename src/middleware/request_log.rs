// ============================================================================
// REQUEST LOGGING MIDDLEWARE
// ============================================================================

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs one line per request and echoes its id in `x-request-id`.
pub async fn request_log_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let method = req.method().to_string();
    let route = normalize_path(req.uri().path());

    let mut response = next.run(req).await;

    let status = response.status().as_u16();
    info!(
        request_id = %request_id,
        method = %method,
        route = %route,
        status,
        latency_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

/// Replaces numeric ids so log lines group by route.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|seg| if seg.parse::<i64>().is_ok() { ":id" } else { seg })
        .collect::<Vec<_>>()
        .join("/")
}
