use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, put},
    Extension, Router,
};
use shared::AppError;
use tracing::info;
use validator::Validate;

use crate::{
    api::common::{created, done, ok, ApiResult, CreatedResult, JsonBody, PathParams},
    middleware::{require_auth, CurrentUser},
    models::{
        CreateInventoryRequest, Inventory, InventoryChanges, NewInventory, SetStockRequest,
        StockLevel, UpdateInventoryRequest,
    },
    state::AppState,
};

pub fn create_inventories_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventories).post(create_inventory))
        .route(
            "/:id",
            get(get_inventory).put(update_inventory).delete(delete_inventory),
        )
        .route("/:id/products", get(list_stock))
        .route("/:id/products/:product_id", put(set_stock).delete(remove_stock))
        .route_layer(from_fn_with_state(state, require_auth))
}

/// Loads an inventory the caller owns: 404 when absent, 403 when foreign.
async fn owned_inventory(
    state: &AppState,
    current_user: &CurrentUser,
    id: i64,
) -> Result<Inventory, AppError> {
    let inventory = state
        .store
        .find_inventory(id)
        .await?
        .ok_or_else(|| AppError::not_found("Inventory"))?;
    current_user.ensure_owns(inventory.user_id)?;
    Ok(inventory)
}

/// GET /api/inventories
pub async fn list_inventories(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> ApiResult<Vec<Inventory>> {
    let inventories = state.store.list_inventories(current_user.user_id).await?;
    ok("Inventories retrieved successfully", inventories)
}

/// POST /api/inventories
pub async fn create_inventory(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    JsonBody(request): JsonBody<CreateInventoryRequest>,
) -> CreatedResult<Inventory> {
    request.validate()?;

    let inventory = state
        .store
        .create_inventory(NewInventory {
            user_id: current_user.user_id,
            name: request.name.trim().to_string(),
            location: request.location,
        })
        .await?;

    info!(user_id = current_user.user_id, inventory_id = inventory.id, "Inventory created");
    created("Inventory created successfully", inventory)
}

/// GET /api/inventories/:id
pub async fn get_inventory(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Inventory> {
    let inventory = owned_inventory(&state, &current_user, id).await?;
    ok("Inventory retrieved successfully", inventory)
}

/// PUT /api/inventories/:id
pub async fn update_inventory(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    PathParams(id): PathParams<i64>,
    JsonBody(request): JsonBody<UpdateInventoryRequest>,
) -> ApiResult<Inventory> {
    request.validate()?;
    owned_inventory(&state, &current_user, id).await?;

    let changes = InventoryChanges {
        name: request.name.map(|n| n.trim().to_string()),
        location: request.location,
    };
    let inventory = state
        .store
        .update_inventory(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Inventory"))?;

    info!(user_id = current_user.user_id, inventory_id = id, "Inventory updated");
    ok("Inventory updated successfully", inventory)
}

/// DELETE /api/inventories/:id
pub async fn delete_inventory(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<()> {
    owned_inventory(&state, &current_user, id).await?;

    if !state.store.delete_inventory(id).await? {
        return Err(AppError::not_found("Inventory"));
    }

    info!(user_id = current_user.user_id, inventory_id = id, "Inventory deleted");
    done("Inventory deleted successfully")
}

/// GET /api/inventories/:id/products
pub async fn list_stock(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Vec<StockLevel>> {
    owned_inventory(&state, &current_user, id).await?;
    let stock = state.store.list_stock(id).await?;
    ok("Stock retrieved successfully", stock)
}

/// PUT /api/inventories/:id/products/:product_id
pub async fn set_stock(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    PathParams((id, product_id)): PathParams<(i64, i64)>,
    JsonBody(request): JsonBody<SetStockRequest>,
) -> ApiResult<StockLevel> {
    owned_inventory(&state, &current_user, id).await?;
    if state.store.find_product(product_id).await?.is_none() {
        return Err(AppError::not_found("Product"));
    }

    let level = state.store.set_stock(id, product_id, request.quantity).await?;

    info!(
        user_id = current_user.user_id,
        inventory_id = id,
        product_id,
        quantity = request.quantity,
        "Stock updated"
    );
    ok("Stock updated successfully", level)
}

/// DELETE /api/inventories/:id/products/:product_id
pub async fn remove_stock(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    PathParams((id, product_id)): PathParams<(i64, i64)>,
) -> ApiResult<()> {
    owned_inventory(&state, &current_user, id).await?;

    if !state.store.remove_stock(id, product_id).await? {
        return Err(AppError::not_found("Stock entry"));
    }

    info!(user_id = current_user.user_id, inventory_id = id, product_id, "Stock removed");
    done("Stock removed successfully")
}
