//! PostgreSQL adapters for the phone catalogue

mod catalog;
mod executor;
mod loader;
mod pool;

pub use catalog::{CatalogStats, PhoneCatalog};
pub use executor::{map_sqlx_error, DisconnectedExecutor, PostgresQueryExecutor};
pub use loader::{create_table_sql, PhoneLoader};
pub use pool::connect_pool;
