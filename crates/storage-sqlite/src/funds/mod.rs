//! SQLite storage implementation for fund identity records.

mod model;
mod repository;

pub use model::{FundDB, NewFundDB};
pub use repository::FundRepository;
