pub mod platforms_model;
pub(crate) mod platforms_service;
pub(crate) mod platforms_traits;

#[cfg(test)]
mod platforms_service_tests;

// Re-export the public interface
pub use platforms_model::{Platform, PlatformOrder};
pub use platforms_service::PlatformService;
pub use platforms_traits::{PlatformRepositoryTrait, PlatformServiceTrait};
