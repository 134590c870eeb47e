//! Durable storage for the directory entities.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryDirectoryStore;
pub use postgres::PostgresDirectoryStore;
pub use r#trait::{DirectoryStore, StoreError};
