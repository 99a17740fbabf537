// ============================================================================
// ROUTING MIDDLEWARE
// ============================================================================

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::debug;

use crate::api::common::route_not_found;

/// Serves files from the upload directory ahead of the API routes.
///
/// Only GET and HEAD are looked up; anything the directory does not have
/// continues to the router untouched.
pub async fn serve_uploads_first(
    State(files): State<ServeDir>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return next.run(request).await;
    }

    let mut lookup = Request::new(Body::empty());
    *lookup.method_mut() = request.method().clone();
    *lookup.uri_mut() = request.uri().clone();
    *lookup.headers_mut() = request.headers().clone();

    match files.oneshot(lookup).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => {
            debug!(path = %request.uri().path(), "Served from upload directory");
            response.into_response()
        }
        _ => next.run(request).await,
    }
}

/// A path that exists under another method answers with the JSON 404.
pub async fn method_not_allowed_as_not_found(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return route_not_found().await.into_response();
    }
    response
}
