//! SQLite storage implementation for Habitual.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `habitual-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The single-writer actor that serializes writes
//! - Repository implementations and database-specific model types
//!
//! ```text
//!      core (domain)
//!            │
//!            ▼
//!  storage-sqlite (this crate)
//!            │
//!            ▼
//!        SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod goals;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, prepare_db_file, run_migrations,
    spawn_writer, DbConnection, DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from habitual-core for convenience
pub use habitual_core::errors::{DatabaseError, Error, Result};
