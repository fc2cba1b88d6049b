// ABOUTME: Data layer bootstrap for Inkline
// ABOUTME: SQLite pool creation, embedded migrations, and shared storage errors

pub mod db;
pub mod error;

pub use db::{connect, MIGRATOR};
pub use error::StorageError;
