use axum::{
    extract::{DefaultBodyLimit, State},
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Router,
};
use shared::AppError;
use tracing::info;
use validator::Validate;

use crate::{
    api::{
        common::{created, done, ok, ApiResult, CreatedResult, JsonBody, PathParams},
        upload_invoice::upload_invoice,
    },
    middleware::{require_auth, CurrentUser},
    models::{CreateInvoiceRequest, Invoice, InvoiceWithLines, NewInvoice},
    state::AppState,
};

pub fn create_invoices_router(state: AppState) -> Router<AppState> {
    let max_upload_bytes = state.config.server.max_upload_bytes;

    Router::new()
        .route(
            "/upload",
            post(upload_invoice).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/", get(list_invoices).post(create_invoice))
        .route("/:id", get(get_invoice).delete(delete_invoice))
        .route_layer(from_fn_with_state(state, require_auth))
}

async fn owned_invoice(
    state: &AppState,
    current_user: &CurrentUser,
    id: i64,
) -> Result<InvoiceWithLines, AppError> {
    let invoice = state
        .store
        .find_invoice(id)
        .await?
        .ok_or_else(|| AppError::not_found("Invoice"))?;
    current_user.ensure_owns(invoice.invoice.user_id)?;
    Ok(invoice)
}

/// GET /api/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> ApiResult<Vec<Invoice>> {
    let invoices = state.store.list_invoices(current_user.user_id).await?;
    ok("Invoices retrieved successfully", invoices)
}

/// POST /api/invoices
///
/// Saves line items the client reviewed after an upload.
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    JsonBody(request): JsonBody<CreateInvoiceRequest>,
) -> CreatedResult<InvoiceWithLines> {
    request.validate()?;

    if request.items.is_empty() {
        return Err(AppError::bad_request("An invoice needs at least one line item"));
    }
    if request.items.iter().any(|item| item.product_name.trim().is_empty()) {
        return Err(AppError::bad_request("Every line item needs a product name"));
    }

    let invoice = state
        .store
        .create_invoice(NewInvoice {
            user_id: current_user.user_id,
            supplier: request.supplier,
            invoice_date: request.invoice_date,
            items: request.items,
        })
        .await?;

    info!(
        user_id = current_user.user_id,
        invoice_id = invoice.invoice.id,
        lines = invoice.lines.len(),
        "Invoice saved"
    );
    created("Invoice created successfully", invoice)
}

/// GET /api/invoices/:id
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<InvoiceWithLines> {
    let invoice = owned_invoice(&state, &current_user, id).await?;
    ok("Invoice retrieved successfully", invoice)
}

/// DELETE /api/invoices/:id
pub async fn delete_invoice(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<()> {
    owned_invoice(&state, &current_user, id).await?;

    if !state.store.delete_invoice(id).await? {
        return Err(AppError::not_found("Invoice"));
    }

    info!(user_id = current_user.user_id, invoice_id = id, "Invoice deleted");
    done("Invoice deleted successfully")
}
