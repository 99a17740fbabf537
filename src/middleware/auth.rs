use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use shared::AppError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Current user data extracted from JWT
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i64,
    pub email: String,
}

/// Pulls the bearer token out of the `Authorization` header.
fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header");
            AppError::unauthorized("Authentication required")
        })?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format");
        AppError::unauthorized("Authorization header must use the Bearer scheme")
    })?;

    let token = token.trim();
    if token.is_empty() {
        warn!("Empty JWT token");
        return Err(AppError::unauthorized("Authentication required"));
    }
    Ok(token)
}

/// Rejects the request with 401 unless it carries a valid session token.
///
/// On success the [`CurrentUser`] is available to handlers as an
/// `Extension`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = state.auth.verify_token(bearer_token(&request)?)?;
    let current_user = CurrentUser {
        user_id: claims.user_id()?,
        email: claims.email,
    };

    debug!(user_id = current_user.user_id, "Authenticated request");
    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}

impl CurrentUser {
    /// 403 unless `owner_id` is this user.
    pub fn ensure_owns(&self, owner_id: i64) -> Result<(), AppError> {
        if self.user_id == owner_id {
            Ok(())
        } else {
            warn!(user_id = self.user_id, owner_id, "Access to foreign resource denied");
            Err(AppError::forbidden("Access denied"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(header: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/api/inventories");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&request_with(Some("Bearer abc.def"))).unwrap(), "abc.def");
    }

    #[test]
    fn rejects_missing_wrong_scheme_and_empty_tokens() {
        for header in [None, Some("Basic dXNlcg=="), Some("Bearer   ")] {
            let err = bearer_token(&request_with(header)).unwrap_err();
            assert!(matches!(err, AppError::Unauthorized { .. }), "{:?}", header);
        }
    }

    #[test]
    fn ownership_check() {
        let user = CurrentUser {
            user_id: 7,
            email: "a@b.c".to_string(),
        };
        assert!(user.ensure_owns(7).is_ok());
        assert!(matches!(user.ensure_owns(8), Err(AppError::Forbidden { .. })));
    }
}
