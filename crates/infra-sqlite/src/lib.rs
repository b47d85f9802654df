// TalentFlow Infrastructure - SQLite Adapter
// Implements: EntityStore

mod connection;
mod error;
mod migration;
mod store;

pub use connection::create_pool;
pub use error::map_sqlx_error;
pub use migration::run_migrations;
pub use store::SqliteEntityStore;

// Note: sqlx::Error conversion is handled by a helper function
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
