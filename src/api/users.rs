use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Router,
};
use shared::AppError;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    api::common::{created, done, ok, ApiResult, CreatedResult, JsonBody, PathParams},
    middleware::{require_auth, CurrentUser},
    models::{
        LoginRequest, LoginResponse, NewUser, RegisterRequest, UpdateUserRequest, UserChanges,
        UserResponse,
    },
    state::AppState,
};

pub fn create_users_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(get_me).put(update_me).delete(delete_me))
        .route("/:id", get(get_user))
        .route_layer(from_fn_with_state(state, require_auth));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// POST /api/users/register
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> CreatedResult<UserResponse> {
    request.validate()?;

    let password_hash = state.auth.hash_password(&request.password).await?;
    let user = state
        .store
        .create_user(NewUser {
            username: request.username.trim().to_string(),
            email: normalize_email(&request.email),
            password_hash,
        })
        .await?;

    info!(user_id = user.id, "User registered");
    created("User registered successfully", UserResponse::from(&user))
}

/// POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<LoginResponse> {
    request.validate()?;

    let invalid = || AppError::unauthorized("Invalid credentials");

    let Some(user) = state.store.find_user_by_email(&normalize_email(&request.email)).await? else {
        warn!("Login attempt for unknown email");
        return Err(invalid());
    };

    if !state.auth.verify_password(&request.password, &user.password_hash).await? {
        warn!(user_id = user.id, "Login attempt with wrong password");
        return Err(invalid());
    }

    let token = state.auth.issue_token(&user)?;
    info!(user_id = user.id, "User logged in");
    ok(
        "Login successful",
        LoginResponse {
            token,
            user: UserResponse::from(&user),
        },
    )
}

/// GET /api/users/me
pub async fn get_me(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> ApiResult<UserResponse> {
    let user = state
        .store
        .find_user_by_id(current_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    ok("User retrieved successfully", UserResponse::from(&user))
}

/// PUT /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> ApiResult<UserResponse> {
    request.validate()?;

    let password_hash = match &request.password {
        Some(password) => Some(state.auth.hash_password(password).await?),
        None => None,
    };
    let changes = UserChanges {
        username: request.username.map(|u| u.trim().to_string()),
        email: request.email.as_deref().map(normalize_email),
        password_hash,
    };

    let user = state
        .store
        .update_user(current_user.user_id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    info!(user_id = user.id, "User updated");
    ok("User updated successfully", UserResponse::from(&user))
}

/// DELETE /api/users/me
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> ApiResult<()> {
    if !state.store.delete_user(current_user.user_id).await? {
        return Err(AppError::not_found("User"));
    }

    info!(user_id = current_user.user_id, "User deleted");
    done("User deleted successfully")
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<UserResponse> {
    let user = state
        .store
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    ok("User retrieved successfully", UserResponse::from(&user))
}
