pub mod database;
pub mod files;
pub mod models;

pub use database::Database;
pub use files::{FileStore, StoredFile};
