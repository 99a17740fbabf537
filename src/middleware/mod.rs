pub mod auth;
pub mod request_log;
pub mod routing;

pub use auth::{require_auth, CurrentUser};
pub use request_log::request_log_middleware;
pub use routing::{method_not_allowed_as_not_found, serve_uploads_first};
