// Module declarations
pub(crate) mod valuations_model;
pub(crate) mod valuations_service;
pub(crate) mod valuations_traits;

#[cfg(test)]
mod valuations_service_tests;

// Re-export the public interface
pub use valuations_model::{
    is_trading_day, DetailOptions, NormalizedValuation, SnapshotStaleness, SnapshotUpdate,
    ValuationSnapshot,
};
pub use valuations_service::ValuationService;
pub use valuations_traits::{ValuationRepositoryTrait, ValuationServiceTrait};
