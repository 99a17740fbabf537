use async_trait::async_trait;
use shared::AppError;
use sqlx::mysql::{MySqlPool, MySqlQueryResult};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

use crate::models::{
    Inventory, InventoryChanges, Invoice, InvoiceLine, InvoiceWithLines, NewInventory, NewInvoice,
    NewProduct, NewUser, Product, ProductChanges, StockLevel, User, UserChanges,
};
use crate::repository::{
    InventoryRepository, InvoiceRepository, ProductRepository, RepoResult, UserRepository,
};

// ============================================================================
// SQL
// ============================================================================

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";
const PRODUCT_COLUMNS: &str = "id, name, description, price, created_at";
const INVENTORY_COLUMNS: &str = "id, user_id, name, location, created_at";
const INVOICE_COLUMNS: &str = "id, user_id, supplier, invoice_date, created_at";

const STOCK_SELECT: &str = r#"
    SELECT ip.inventory_id, ip.product_id, p.name AS product_name, ip.quantity
    FROM inventory_products ip
    JOIN products p ON p.id = ip.product_id
"#;

/// MySQL-backed implementation of every repository port.
///
/// Each operation is bounded by `statement_timeout`; a slow statement fails
/// the request with `AppError::Timeout` instead of holding it open.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    statement_timeout: Duration,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool, statement_timeout: Duration) -> Self {
        Self { pool, statement_timeout }
    }

    async fn timed<T, F>(&self, operation: &str, fut: F) -> RepoResult<T>
    where
        F: Future<Output = RepoResult<T>> + Send,
    {
        match tokio::time::timeout(self.statement_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    operation,
                    timeout_ms = self.statement_timeout.as_millis() as u64,
                    "Database operation timed out"
                );
                Err(AppError::timeout(operation))
            }
        }
    }

    async fn fetch_user(&self, id: i64) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn fetch_product(&self, id: i64) -> RepoResult<Option<Product>> {
        let product =
            sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(product)
    }

    async fn fetch_inventory(&self, id: i64) -> RepoResult<Option<Inventory>> {
        let inventory = sqlx::query_as::<_, Inventory>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(inventory)
    }

    async fn fetch_invoice(&self, id: i64) -> RepoResult<Option<InvoiceWithLines>> {
        let invoice =
            sqlx::query_as::<_, Invoice>(&format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(invoice) = invoice else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, InvoiceLine>(
            "SELECT id, invoice_id, product_name, description, quantity FROM invoice_lines WHERE invoice_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(InvoiceWithLines { invoice, lines }))
    }
}

fn inserted_id(result: &MySqlQueryResult) -> RepoResult<i64> {
    i64::try_from(result.last_insert_id()).map_err(|_| AppError::internal("Inserted id out of range"))
}

/// Maps a unique-key violation to a 409 with `message`, anything else to a
/// database error.
fn unique_violation(message: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::conflict(message),
        _ => AppError::from(e),
    }
}

// ============================================================================
// USERS
// ============================================================================

#[async_trait]
impl UserRepository for MySqlStore {
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        self.timed("creating user", async {
            let result = sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)")
                .bind(&user.username)
                .bind(&user.email)
                .bind(&user.password_hash)
                .execute(&self.pool)
                .await
                .map_err(unique_violation("Email already registered"))?;

            let id = inserted_id(&result)?;
            info!(user_id = id, "User row inserted");
            self.fetch_user(id)
                .await?
                .ok_or_else(|| AppError::internal("User vanished after insert"))
        })
        .await
    }

    async fn find_user_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        self.timed("fetching user", self.fetch_user(id)).await
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.timed("fetching user by email", async {
            let user =
                sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
                    .bind(email)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(user)
        })
        .await
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> RepoResult<Option<User>> {
        self.timed("updating user", async {
            sqlx::query(
                r#"
                UPDATE users
                SET username = COALESCE(?, username),
                    email = COALESCE(?, email),
                    password_hash = COALESCE(?, password_hash)
                WHERE id = ?
                "#,
            )
            .bind(changes.username)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unique_violation("Email already registered"))?;

            self.fetch_user(id).await
        })
        .await
    }

    async fn delete_user(&self, id: i64) -> RepoResult<bool> {
        self.timed("deleting user", async {
            let result = sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }
}

// ============================================================================
// PRODUCTS
// ============================================================================

#[async_trait]
impl ProductRepository for MySqlStore {
    async fn list_products(&self) -> RepoResult<Vec<Product>> {
        self.timed("listing products", async {
            let products =
                sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
                    .fetch_all(&self.pool)
                    .await?;
            Ok(products)
        })
        .await
    }

    async fn find_product(&self, id: i64) -> RepoResult<Option<Product>> {
        self.timed("fetching product", self.fetch_product(id)).await
    }

    async fn create_product(&self, product: NewProduct) -> RepoResult<Product> {
        self.timed("creating product", async {
            let result = sqlx::query("INSERT INTO products (name, description, price) VALUES (?, ?, ?)")
                .bind(&product.name)
                .bind(&product.description)
                .bind(product.price)
                .execute(&self.pool)
                .await?;

            let id = inserted_id(&result)?;
            self.fetch_product(id)
                .await?
                .ok_or_else(|| AppError::internal("Product vanished after insert"))
        })
        .await
    }

    async fn update_product(&self, id: i64, changes: ProductChanges) -> RepoResult<Option<Product>> {
        self.timed("updating product", async {
            sqlx::query(
                r#"
                UPDATE products
                SET name = COALESCE(?, name),
                    description = IF(?, ?, description),
                    price = COALESCE(?, price)
                WHERE id = ?
                "#,
            )
            .bind(changes.name)
            .bind(changes.description.is_some())
            .bind(changes.description.flatten())
            .bind(changes.price)
            .bind(id)
            .execute(&self.pool)
            .await?;

            self.fetch_product(id).await
        })
        .await
    }

    async fn delete_product(&self, id: i64) -> RepoResult<bool> {
        self.timed("deleting product", async {
            let result = sqlx::query("DELETE FROM products WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }
}

// ============================================================================
// INVENTORIES & STOCK
// ============================================================================

#[async_trait]
impl InventoryRepository for MySqlStore {
    async fn list_inventories(&self, user_id: i64) -> RepoResult<Vec<Inventory>> {
        self.timed("listing inventories", async {
            let inventories = sqlx::query_as::<_, Inventory>(&format!(
                "SELECT {INVENTORY_COLUMNS} FROM inventories WHERE user_id = ? ORDER BY id"
            ))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(inventories)
        })
        .await
    }

    async fn find_inventory(&self, id: i64) -> RepoResult<Option<Inventory>> {
        self.timed("fetching inventory", self.fetch_inventory(id)).await
    }

    async fn create_inventory(&self, inventory: NewInventory) -> RepoResult<Inventory> {
        self.timed("creating inventory", async {
            let result = sqlx::query("INSERT INTO inventories (user_id, name, location) VALUES (?, ?, ?)")
                .bind(inventory.user_id)
                .bind(&inventory.name)
                .bind(&inventory.location)
                .execute(&self.pool)
                .await?;

            let id = inserted_id(&result)?;
            self.fetch_inventory(id)
                .await?
                .ok_or_else(|| AppError::internal("Inventory vanished after insert"))
        })
        .await
    }

    async fn update_inventory(&self, id: i64, changes: InventoryChanges) -> RepoResult<Option<Inventory>> {
        self.timed("updating inventory", async {
            sqlx::query(
                r#"
                UPDATE inventories
                SET name = COALESCE(?, name),
                    location = IF(?, ?, location)
                WHERE id = ?
                "#,
            )
            .bind(changes.name)
            .bind(changes.location.is_some())
            .bind(changes.location.flatten())
            .bind(id)
            .execute(&self.pool)
            .await?;

            self.fetch_inventory(id).await
        })
        .await
    }

    async fn delete_inventory(&self, id: i64) -> RepoResult<bool> {
        self.timed("deleting inventory", async {
            let result = sqlx::query("DELETE FROM inventories WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn list_stock(&self, inventory_id: i64) -> RepoResult<Vec<StockLevel>> {
        self.timed("listing stock", async {
            let stock = sqlx::query_as::<_, StockLevel>(&format!(
                "{STOCK_SELECT} WHERE ip.inventory_id = ? ORDER BY p.name"
            ))
            .bind(inventory_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(stock)
        })
        .await
    }

    async fn set_stock(&self, inventory_id: i64, product_id: i64, quantity: u32) -> RepoResult<StockLevel> {
        self.timed("setting stock", async {
            sqlx::query(
                r#"
                INSERT INTO inventory_products (inventory_id, product_id, quantity)
                VALUES (?, ?, ?)
                ON DUPLICATE KEY UPDATE quantity = VALUES(quantity)
                "#,
            )
            .bind(inventory_id)
            .bind(product_id)
            .bind(quantity)
            .execute(&self.pool)
            .await?;

            let level = sqlx::query_as::<_, StockLevel>(&format!(
                "{STOCK_SELECT} WHERE ip.inventory_id = ? AND ip.product_id = ?"
            ))
            .bind(inventory_id)
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(level)
        })
        .await
    }

    async fn remove_stock(&self, inventory_id: i64, product_id: i64) -> RepoResult<bool> {
        self.timed("removing stock", async {
            let result = sqlx::query("DELETE FROM inventory_products WHERE inventory_id = ? AND product_id = ?")
                .bind(inventory_id)
                .bind(product_id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }
}

// ============================================================================
// INVOICES (header + lines in one transaction)
// ============================================================================

#[async_trait]
impl InvoiceRepository for MySqlStore {
    async fn list_invoices(&self, user_id: i64) -> RepoResult<Vec<Invoice>> {
        self.timed("listing invoices", async {
            let invoices = sqlx::query_as::<_, Invoice>(&format!(
                "SELECT {INVOICE_COLUMNS} FROM invoices WHERE user_id = ? ORDER BY created_at DESC, id DESC"
            ))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(invoices)
        })
        .await
    }

    async fn find_invoice(&self, id: i64) -> RepoResult<Option<InvoiceWithLines>> {
        self.timed("fetching invoice", self.fetch_invoice(id)).await
    }

    async fn create_invoice(&self, invoice: NewInvoice) -> RepoResult<InvoiceWithLines> {
        self.timed("creating invoice", async {
            let mut tx = self.pool.begin().await?;

            let result = sqlx::query("INSERT INTO invoices (user_id, supplier, invoice_date) VALUES (?, ?, ?)")
                .bind(invoice.user_id)
                .bind(&invoice.supplier)
                .bind(invoice.invoice_date)
                .execute(&mut *tx)
                .await?;
            let invoice_id = inserted_id(&result)?;

            for item in &invoice.items {
                sqlx::query(
                    "INSERT INTO invoice_lines (invoice_id, product_name, description, quantity) VALUES (?, ?, ?, ?)",
                )
                .bind(invoice_id)
                .bind(&item.product_name)
                .bind(&item.description)
                .bind(item.quantity)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            info!(invoice_id, lines = invoice.items.len(), "🗃️ Invoice saved");

            self.fetch_invoice(invoice_id)
                .await?
                .ok_or_else(|| AppError::internal("Invoice vanished after insert"))
        })
        .await
    }

    async fn delete_invoice(&self, id: i64) -> RepoResult<bool> {
        self.timed("deleting invoice", async {
            let result = sqlx::query("DELETE FROM invoices WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }
}
