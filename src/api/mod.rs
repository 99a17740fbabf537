pub mod common;
pub mod inventories;
pub mod invoices;
pub mod products;
pub mod upload_invoice;
pub mod users;

use axum::Router;

use crate::state::AppState;

pub fn create_api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/api/users", users::create_users_router(state.clone()))
        .nest("/api/invoices", invoices::create_invoices_router(state.clone()))
        .nest("/api/inventories", inventories::create_inventories_router(state.clone()))
        .nest("/api/products", products::create_products_router(state))
}
