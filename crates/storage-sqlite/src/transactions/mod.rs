//! SQLite storage implementation for the trade log.

mod model;
mod repository;

pub(crate) use repository::append_transaction;

pub use model::{NewTransactionDB, TransactionDB};
pub use repository::TransactionRepository;
