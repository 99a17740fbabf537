use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Extension, Router,
};
use rust_decimal::Decimal;
use shared::AppError;
use tracing::info;
use validator::Validate;

use crate::{
    api::common::{created, done, ok, ApiResult, CreatedResult, JsonBody, PathParams},
    middleware::{require_auth, CurrentUser},
    models::{CreateProductRequest, NewProduct, Product, ProductChanges, UpdateProductRequest},
    state::AppState,
};

/// Reads are public; writes require a session.
pub fn create_products_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_product))
        .route("/:id", put(update_product).delete(delete_product))
        .route_layer(from_fn_with_state(state, require_auth));

    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
        .merge(protected)
}

fn check_price(price: Decimal) -> Result<(), AppError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::bad_request("Price must not be negative"));
    }
    Ok(())
}

/// GET /api/products
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    let products = state.store.list_products().await?;
    ok("Products retrieved successfully", products)
}

/// GET /api/products/:id
pub async fn get_product(
    State(state): State<AppState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Product> {
    let product = state
        .store
        .find_product(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    ok("Product retrieved successfully", product)
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    JsonBody(request): JsonBody<CreateProductRequest>,
) -> CreatedResult<Product> {
    request.validate()?;
    check_price(request.price)?;

    let product = state
        .store
        .create_product(NewProduct {
            name: request.name.trim().to_string(),
            description: request.description,
            price: request.price,
        })
        .await?;

    info!(user_id = current_user.user_id, product_id = product.id, "Product created");
    created("Product created successfully", product)
}

/// PUT /api/products/:id
pub async fn update_product(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    PathParams(id): PathParams<i64>,
    JsonBody(request): JsonBody<UpdateProductRequest>,
) -> ApiResult<Product> {
    request.validate()?;
    if let Some(price) = request.price {
        check_price(price)?;
    }

    let changes = ProductChanges {
        name: request.name.map(|n| n.trim().to_string()),
        description: request.description,
        price: request.price,
    };
    let product = state
        .store
        .update_product(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    info!(user_id = current_user.user_id, product_id = id, "Product updated");
    ok("Product updated successfully", product)
}

/// DELETE /api/products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<()> {
    if !state.store.delete_product(id).await? {
        return Err(AppError::not_found("Product"));
    }

    info!(user_id = current_user.user_id, product_id = id, "Product deleted");
    done("Product deleted successfully")
}
