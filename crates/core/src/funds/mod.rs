// Module declarations
pub(crate) mod funds_model;
pub(crate) mod funds_service;
pub(crate) mod funds_traits;


// Re-export the public interface
pub use funds_model::{Fund, FundLookup, NewFund};
pub use funds_service::FundService;
pub use funds_traits::{FundRepositoryTrait, FundServiceTrait};
