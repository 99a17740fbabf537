use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// One product line read off an invoice.
///
/// Produced by the OCR upload (where `description` is always `None`) and
/// accepted back when the client saves a reviewed invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_name: String,
    pub description: Option<String>,
    pub quantity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i64,
    pub user_id: i64,
    pub supplier: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub id: i64,
    pub invoice_id: i64,
    pub product_name: String,
    pub description: Option<String>,
    pub quantity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceWithLines {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub lines: Vec<InvoiceLine>,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub user_id: i64,
    pub supplier: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[validate(length(max = 200))]
    pub supplier: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}
