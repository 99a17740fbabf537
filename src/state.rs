use shared::Config;
use std::sync::Arc;

use crate::db::{create_pool, MySqlStore};
use crate::repository::Store;
use crate::services::{AuthService, OcrEngine, TesseractCli};

/// Shared application state.
/// Owns the store, the OCR engine and the token service; cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub ocr: Arc<dyn OcrEngine>,
    pub auth: AuthService,
}

impl AppState {
    /// Connects to MySQL and wires the production adapters.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = create_pool(&config.database).await?;
        let store = MySqlStore::new(pool, config.database.statement_timeout);
        let ocr = TesseractCli::new(&config.ocr);

        Ok(Self::from_parts(config, Arc::new(store), Arc::new(ocr)))
    }

    pub fn from_parts(config: Config, store: Arc<dyn Store>, ocr: Arc<dyn OcrEngine>) -> Self {
        let auth = AuthService::new(&config.auth);
        Self {
            config: Arc::new(config),
            store,
            ocr,
            auth,
        }
    }
}
