//! SQLite storage implementation for platforms.

mod model;
mod repository;

pub use model::{NewPlatformDB, PlatformDB};
pub use repository::PlatformRepository;
