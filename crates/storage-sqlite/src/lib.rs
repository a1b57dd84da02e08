//! SQLite storage implementation for Fundfolio.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `fundfolio-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for all domain entities
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies
//! exist. Everything above it is database-agnostic and works with the traits
//! from `fundfolio-core`.
//!
//! ```text
//!   core (domain services)
//!            │
//!            ▼
//!   storage-sqlite (this crate)
//!            │
//!            ▼
//!        SQLite DB
//! ```
//!
//! Repositories are synchronous and hold only the connection pool; retry on
//! lock contention is the caller's concern (`fundfolio_core::retry`), so
//! writes here open a connection and commit immediately. Compound writes
//! (position + trade row, holding update + profit snapshot) run inside a
//! single `conn.transaction` scope.

pub mod db;
pub mod errors;
pub mod schema;

mod utils;

// Repository implementations
pub mod funds;
pub mod holdings;
pub mod platforms;
pub mod profit_history;
pub mod transactions;
pub mod valuations;
pub mod watchlist;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, DbConnection, DbPool,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from fundfolio-core for convenience
pub use fundfolio_core::errors::{DatabaseError, Error, Result};
