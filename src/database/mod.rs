/*!
 * Database module for persistent storage of cached translations.
 *
 * SQLite holds one key-value table behind the `KeyValueStore` trait, so the
 * result cache survives restarts.
 */

pub mod connection;
pub mod schema;
pub mod store;

// Re-export main types
pub use connection::{DatabaseConnection, DatabaseStats};
pub use store::SqliteStore;
