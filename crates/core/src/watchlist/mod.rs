// Module declarations
pub(crate) mod watchlist_model;
pub(crate) mod watchlist_service;
pub(crate) mod watchlist_traits;


// Re-export the public interface
pub use watchlist_model::WatchlistEntry;
pub use watchlist_service::WatchlistService;
pub use watchlist_traits::{WatchlistRepositoryTrait, WatchlistServiceTrait};
