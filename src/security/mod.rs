// Security middleware and utilities for hardening

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use shared::AppError;
use std::time::Duration;
use tower_http::cors::CorsLayer;

/// Security headers middleware
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );

    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );

    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // Session tokens travel in these bodies
    if path.starts_with("/api/users/") {
        headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
    }

    response
}

/// Input validation utilities
pub mod validation {
    pub fn is_safe_filename(filename: &str) -> bool {
        !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains('/')
            && !filename.contains('\\')
            && !filename.contains('\0')
            && filename.len() <= 255
    }

    /// Reduces a client supplied file name to its final path component.
    ///
    /// Both separators are honoured because browsers on Windows may send the
    /// full client path.
    pub fn upload_file_name(raw: &str) -> Option<String> {
        let name = raw.rsplit(['/', '\\']).next()?.trim();
        is_safe_filename(name).then(|| name.to_string())
    }
}

/// CORS restricted to the configured client origin
pub fn get_cors_layer(client_url: &str) -> Result<CorsLayer, AppError> {
    let origin: HeaderValue = client_url
        .parse()
        .map_err(|_| AppError::configuration(format!("Invalid CLIENT_URL: {}", client_url)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600)))
}
