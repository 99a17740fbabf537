use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInventory {
    pub user_id: i64,
    pub name: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryChanges {
    pub name: Option<String>,
    pub location: Option<Option<String>>,
}

/// Quantity of one product held in one inventory.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub inventory_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInventoryRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 200))]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInventoryRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 200))]
    #[serde(default, deserialize_with = "super::nullable")]
    pub location: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub quantity: u32,
}
