pub mod auth_service;
pub mod invoice_upload_service;
pub mod ocr_service;

pub use auth_service::{AuthService, Claims};
pub use invoice_upload_service::{process_upload, TempUpload};
pub use ocr_service::{OcrEngine, TesseractCli};
