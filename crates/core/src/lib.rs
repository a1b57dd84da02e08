//! Fundfolio Core - Domain entities, services, and traits.
//!
//! This crate contains the core business logic for Fundfolio.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod funds;
pub mod holdings;
pub mod jobs;
pub mod platforms;
pub mod retry;
pub mod utils;
pub mod valuations;
pub mod watchlist;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
