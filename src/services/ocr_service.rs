//! Text recognition for uploaded invoice images.
//!
//! The HTTP layer only knows [`OcrEngine`]; production wires in
//! [`TesseractCli`], which shells out to the `tesseract` binary so the service
//! carries no native OCR linkage.

use async_trait::async_trait;
use shared::config::OcrConfig;
use shared::AppError;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, error, info};

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Returns the raw text recognised in the image at `path`.
    async fn recognize(&self, path: &Path) -> Result<String, AppError>;
}

/// Runs `<command> <image> stdout -l <language>` and reads the text from stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: String,
    language: String,
    timeout: Duration,
}

impl TesseractCli {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            command: config.command.clone(),
            language: config.language.clone(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn recognize(&self, path: &Path) -> Result<String, AppError> {
        let started = Instant::now();
        debug!(command = %self.command, file = %path.display(), "Starting OCR");

        let child = Command::new(&self.command)
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!(command = %self.command, "Failed to start OCR engine: {}", e);
                AppError::ocr(format!("failed to start '{}': {}", self.command, e))
            })?;

        // Dropping the future on timeout kills the child.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AppError::timeout("OCR recognition"))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(status = %output.status, "OCR engine failed: {}", stderr.trim());
            return Err(AppError::ocr(format!(
                "'{}' exited with {}",
                self.command, output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        info!(
            chars = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "OCR completed"
        );
        Ok(text)
    }
}
