use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Extension,
};
use shared::AppError;
use tracing::{info, warn};

use crate::{
    api::common::{ok, ApiResult},
    middleware::CurrentUser,
    models::LineItem,
    services::process_upload,
    state::AppState,
};

/// Multipart field that carries the invoice image.
pub const INVOICE_FIELD: &str = "invoice";

/// Upload invoice endpoint handler
/// POST /api/invoices/upload
pub async fn upload_invoice(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Vec<LineItem>> {
    let Ok(mut multipart) = multipart else {
        warn!(user_id = current_user.user_id, "Upload without a multipart body");
        return Err(AppError::bad_request("No file uploaded"));
    };

    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::payload_too_large("Uploaded file too large")
        } else {
            warn!("Error reading multipart field: {}", e);
            AppError::bad_request("Error reading uploaded file")
        }
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != INVOICE_FIELD {
            warn!("Unexpected field in multipart: {}", field_name);
            continue;
        }
        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            warn!("Field '{}' is not a file", INVOICE_FIELD);
            continue;
        };

        let bytes = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::payload_too_large("Uploaded file too large")
            } else {
                warn!("Error reading uploaded file: {}", e);
                AppError::bad_request("Error reading uploaded file")
            }
        })?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let Some((file_name, bytes)) = upload else {
        return Err(AppError::bad_request("No file uploaded"));
    };

    info!(
        user_id = current_user.user_id,
        file = %file_name,
        bytes = bytes.len(),
        "Invoice upload received"
    );

    let items = process_upload(
        &state.config.server.uploads_dir,
        state.ocr.as_ref(),
        &file_name,
        &bytes,
    )
    .await?;

    ok("Invoice processed successfully", items)
}
