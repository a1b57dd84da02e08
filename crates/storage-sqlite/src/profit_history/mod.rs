//! SQLite storage implementation for profit history.

mod model;
mod repository;

pub(crate) use repository::append_profit_record;

pub use model::{HoldingProfitRecordDB, NewProfitRecordDB};
pub use repository::ProfitHistoryRepository;
