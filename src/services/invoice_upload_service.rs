// ============================================================================
// INVOICE UPLOAD SERVICE
// ============================================================================
// Persists an uploaded invoice image, runs OCR over it and parses the text
// into line items. The file never outlives the request.
// ============================================================================

use shared::AppError;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::LineItem;
use crate::processing::parse_line_items;
use crate::security::validation::upload_file_name;
use crate::services::ocr_service::OcrEngine;

/// Upload written to disk for the duration of one request.
///
/// Dropping it removes the file, so every early return and cancellation
/// cleans up; [`TempUpload::remove`] is the async path used on success.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
    removed: bool,
}

impl TempUpload {
    pub async fn write(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<Self, AppError> {
        let path = dir.join(file_name);
        // Created before the write so a partial file is still cleaned up.
        let upload = Self {
            path,
            removed: false,
        };
        tokio::fs::write(&upload.path, bytes).await?;
        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn remove(mut self) -> Result<(), AppError> {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(file = %self.path.display(), "Failed to remove upload: {}", e);
            }
        }
    }
}

/// Runs the whole pipeline for one uploaded file.
///
/// Fails with 400 for an unusable file name, 422 when no line matched, and
/// 500 for filesystem or OCR failures.
pub async fn process_upload(
    uploads_dir: &Path,
    ocr: &dyn OcrEngine,
    original_name: &str,
    bytes: &[u8],
) -> Result<Vec<LineItem>, AppError> {
    let file_name = upload_file_name(original_name)
        .ok_or_else(|| AppError::bad_request("Invalid file name"))?;

    let upload = TempUpload::write(uploads_dir, &file_name, bytes).await?;
    info!(file = %file_name, bytes = bytes.len(), "Invoice upload stored");

    let text = ocr.recognize(upload.path()).await?;
    upload.remove().await?;

    let items = parse_line_items(&text);
    if items.is_empty() {
        return Err(AppError::unprocessable("No valid product lines found"));
    }

    info!(file = %file_name, items = items.len(), "Invoice processed");
    Ok(items)
}
