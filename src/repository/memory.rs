//! In-memory store used by the router tests.

use async_trait::async_trait;
use chrono::Utc;
use shared::AppError;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{InventoryRepository, InvoiceRepository, ProductRepository, RepoResult, UserRepository};
use crate::models::{
    Inventory, InventoryChanges, Invoice, InvoiceLine, InvoiceWithLines, NewInventory, NewInvoice,
    NewProduct, NewUser, Product, ProductChanges, StockLevel, User, UserChanges,
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    products: BTreeMap<i64, Product>,
    inventories: BTreeMap<i64, Inventory>,
    stock: BTreeMap<(i64, i64), u32>,
    invoices: BTreeMap<i64, Invoice>,
    invoice_lines: Vec<InvoiceLine>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn stock_level(&self, inventory_id: i64, product_id: i64) -> Option<StockLevel> {
        let quantity = *self.stock.get(&(inventory_id, product_id))?;
        let product = self.products.get(&product_id)?;
        Some(StockLevel {
            inventory_id,
            product_id,
            product_name: product.name.clone(),
            quantity,
        })
    }

    fn invoice_with_lines(&self, id: i64) -> Option<InvoiceWithLines> {
        let invoice = self.invoices.get(&id)?.clone();
        let lines = self
            .invoice_lines
            .iter()
            .filter(|line| line.invoice_id == id)
            .cloned()
            .collect();
        Some(InvoiceWithLines { invoice, lines })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    /// Total rows across every table, used to assert that a rejected request
    /// wrote nothing.
    pub fn row_count(&self) -> usize {
        let t = self.tables();
        t.users.len()
            + t.products.len()
            + t.inventories.len()
            + t.stock.len()
            + t.invoices.len()
            + t.invoice_lines.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut t = self.tables();
        if t.users.values().any(|u| u.email == user.email) {
            return Err(AppError::conflict("Email already registered"));
        }
        let id = t.next_id();
        let row = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        t.users.insert(id, row.clone());
        Ok(row)
    }

    async fn find_user_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self.tables().users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> RepoResult<Option<User>> {
        let mut t = self.tables();
        if let Some(email) = &changes.email {
            if t.users.values().any(|u| &u.email == email && u.id != id) {
                return Err(AppError::conflict("Email already registered"));
            }
        }
        let Some(user) = t.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i64) -> RepoResult<bool> {
        let mut t = self.tables();
        let removed = t.users.remove(&id).is_some();
        if removed {
            let owned: Vec<i64> = t
                .inventories
                .values()
                .filter(|inv| inv.user_id == id)
                .map(|inv| inv.id)
                .collect();
            for inventory_id in owned {
                t.inventories.remove(&inventory_id);
                t.stock.retain(|(inv, _), _| *inv != inventory_id);
            }
            let invoices: Vec<i64> = t
                .invoices
                .values()
                .filter(|inv| inv.user_id == id)
                .map(|inv| inv.id)
                .collect();
            for invoice_id in invoices {
                t.invoices.remove(&invoice_id);
                t.invoice_lines.retain(|line| line.invoice_id != invoice_id);
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn list_products(&self) -> RepoResult<Vec<Product>> {
        Ok(self.tables().products.values().cloned().collect())
    }

    async fn find_product(&self, id: i64) -> RepoResult<Option<Product>> {
        Ok(self.tables().products.get(&id).cloned())
    }

    async fn create_product(&self, product: NewProduct) -> RepoResult<Product> {
        let mut t = self.tables();
        let id = t.next_id();
        let row = Product {
            id,
            name: product.name,
            description: product.description,
            price: product.price,
            created_at: Utc::now(),
        };
        t.products.insert(id, row.clone());
        Ok(row)
    }

    async fn update_product(&self, id: i64, changes: ProductChanges) -> RepoResult<Option<Product>> {
        let mut t = self.tables();
        let Some(product) = t.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(description) = changes.description {
            product.description = description;
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: i64) -> RepoResult<bool> {
        let mut t = self.tables();
        let removed = t.products.remove(&id).is_some();
        t.stock.retain(|(_, product), _| *product != id);
        Ok(removed)
    }
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn list_inventories(&self, user_id: i64) -> RepoResult<Vec<Inventory>> {
        Ok(self
            .tables()
            .inventories
            .values()
            .filter(|inv| inv.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_inventory(&self, id: i64) -> RepoResult<Option<Inventory>> {
        Ok(self.tables().inventories.get(&id).cloned())
    }

    async fn create_inventory(&self, inventory: NewInventory) -> RepoResult<Inventory> {
        let mut t = self.tables();
        let id = t.next_id();
        let row = Inventory {
            id,
            user_id: inventory.user_id,
            name: inventory.name,
            location: inventory.location,
            created_at: Utc::now(),
        };
        t.inventories.insert(id, row.clone());
        Ok(row)
    }

    async fn update_inventory(&self, id: i64, changes: InventoryChanges) -> RepoResult<Option<Inventory>> {
        let mut t = self.tables();
        let Some(inventory) = t.inventories.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            inventory.name = name;
        }
        if let Some(location) = changes.location {
            inventory.location = location;
        }
        Ok(Some(inventory.clone()))
    }

    async fn delete_inventory(&self, id: i64) -> RepoResult<bool> {
        let mut t = self.tables();
        let removed = t.inventories.remove(&id).is_some();
        t.stock.retain(|(inv, _), _| *inv != id);
        Ok(removed)
    }

    async fn list_stock(&self, inventory_id: i64) -> RepoResult<Vec<StockLevel>> {
        let t = self.tables();
        let mut levels: Vec<StockLevel> = t
            .stock
            .keys()
            .filter(|(inv, _)| *inv == inventory_id)
            .filter_map(|(inv, product)| t.stock_level(*inv, *product))
            .collect();
        levels.sort_by(|a, b| a.product_name.cmp(&b.product_name));
        Ok(levels)
    }

    async fn set_stock(&self, inventory_id: i64, product_id: i64, quantity: u32) -> RepoResult<StockLevel> {
        let mut t = self.tables();
        t.stock.insert((inventory_id, product_id), quantity);
        t.stock_level(inventory_id, product_id)
            .ok_or_else(|| AppError::internal("Stock row references a missing product"))
    }

    async fn remove_stock(&self, inventory_id: i64, product_id: i64) -> RepoResult<bool> {
        Ok(self.tables().stock.remove(&(inventory_id, product_id)).is_some())
    }
}

#[async_trait]
impl InvoiceRepository for MemoryStore {
    async fn list_invoices(&self, user_id: i64) -> RepoResult<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self
            .tables()
            .invoices
            .values()
            .filter(|inv| inv.user_id == user_id)
            .cloned()
            .collect();
        invoices.reverse();
        Ok(invoices)
    }

    async fn find_invoice(&self, id: i64) -> RepoResult<Option<InvoiceWithLines>> {
        Ok(self.tables().invoice_with_lines(id))
    }

    async fn create_invoice(&self, invoice: NewInvoice) -> RepoResult<InvoiceWithLines> {
        let mut t = self.tables();
        let invoice_id = t.next_id();
        t.invoices.insert(
            invoice_id,
            Invoice {
                id: invoice_id,
                user_id: invoice.user_id,
                supplier: invoice.supplier,
                invoice_date: invoice.invoice_date,
                created_at: Utc::now(),
            },
        );
        for item in invoice.items {
            let id = t.next_id();
            t.invoice_lines.push(InvoiceLine {
                id,
                invoice_id,
                product_name: item.product_name,
                description: item.description,
                quantity: item.quantity,
            });
        }
        t.invoice_with_lines(invoice_id)
            .ok_or_else(|| AppError::internal("Invoice vanished after insert"))
    }

    async fn delete_invoice(&self, id: i64) -> RepoResult<bool> {
        let mut t = self.tables();
        let removed = t.invoices.remove(&id).is_some();
        t.invoice_lines.retain(|line| line.invoice_id != id);
        Ok(removed)
    }
}
