//! Persistence ports.
//!
//! Handlers only see these traits through [`Store`]; the MySQL adapter lives
//! in [`crate::db`]. All methods fail with [`AppError`] so `?` carries storage
//! failures straight to the response.

use async_trait::async_trait;
use shared::AppError;

use crate::models::{
    Inventory, InventoryChanges, Invoice, InvoiceWithLines, NewInventory, NewInvoice, NewProduct,
    NewUser, Product, ProductChanges, StockLevel, User, UserChanges,
};

#[cfg(test)]
pub mod memory;

pub type RepoResult<T> = Result<T, AppError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `AppError::Conflict` when the email is already taken.
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn find_user_by_id(&self, id: i64) -> RepoResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn update_user(&self, id: i64, changes: UserChanges) -> RepoResult<Option<User>>;
    async fn delete_user(&self, id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list_products(&self) -> RepoResult<Vec<Product>>;
    async fn find_product(&self, id: i64) -> RepoResult<Option<Product>>;
    async fn create_product(&self, product: NewProduct) -> RepoResult<Product>;
    async fn update_product(&self, id: i64, changes: ProductChanges) -> RepoResult<Option<Product>>;
    async fn delete_product(&self, id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn list_inventories(&self, user_id: i64) -> RepoResult<Vec<Inventory>>;
    async fn find_inventory(&self, id: i64) -> RepoResult<Option<Inventory>>;
    async fn create_inventory(&self, inventory: NewInventory) -> RepoResult<Inventory>;
    async fn update_inventory(&self, id: i64, changes: InventoryChanges) -> RepoResult<Option<Inventory>>;
    async fn delete_inventory(&self, id: i64) -> RepoResult<bool>;

    async fn list_stock(&self, inventory_id: i64) -> RepoResult<Vec<StockLevel>>;
    /// Inserts or overwrites the quantity of `product_id` in the inventory.
    async fn set_stock(&self, inventory_id: i64, product_id: i64, quantity: u32) -> RepoResult<StockLevel>;
    async fn remove_stock(&self, inventory_id: i64, product_id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn list_invoices(&self, user_id: i64) -> RepoResult<Vec<Invoice>>;
    async fn find_invoice(&self, id: i64) -> RepoResult<Option<InvoiceWithLines>>;
    /// Header and lines are written atomically.
    async fn create_invoice(&self, invoice: NewInvoice) -> RepoResult<InvoiceWithLines>;
    async fn delete_invoice(&self, id: i64) -> RepoResult<bool>;
}

/// Everything the HTTP layer needs from storage.
pub trait Store: UserRepository + ProductRepository + InventoryRepository + InvoiceRepository {}

impl<T> Store for T where T: UserRepository + ProductRepository + InventoryRepository + InvoiceRepository {}
