use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};
use shared::AppError;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod middleware;
pub mod models;
pub mod processing;
pub mod repository;
pub mod security;
pub mod services;
pub mod state;


use api::{common::route_not_found, create_api_router};
use middleware::{method_not_allowed_as_not_found, request_log_middleware, serve_uploads_first};
use security::{get_cors_layer, security_headers_middleware};
use state::AppState;

/// Builds the full application: files from the upload directory first, then
/// the API routes, then the JSON 404.
pub fn create_app_router(app_state: AppState) -> Result<Router, AppError> {
    let server = &app_state.config.server;

    let uploaded_files = ServeDir::new(&server.uploads_dir);

    let cors = get_cors_layer(&server.client_url)?;
    let body_limit = DefaultBodyLimit::max(server.max_upload_bytes);

    Ok(Router::new()
        .merge(create_api_router(app_state.clone()))
        .fallback(route_not_found)
        .with_state(app_state)
        .layer(axum_middleware::from_fn(method_not_allowed_as_not_found))
        .layer(axum_middleware::from_fn_with_state(uploaded_files, serve_uploads_first))
        .layer(body_limit)
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(request_log_middleware))
        .layer(cors))
}
