pub mod mysql_store;
pub mod pool;

pub use mysql_store::MySqlStore;
pub use pool::create_pool;
