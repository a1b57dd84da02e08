use async_trait::async_trait;

use crate::errors::Result;
use crate::platforms::platforms_model::{Platform, PlatformOrder};

/// Trait for platform repository operations
pub trait PlatformRepositoryTrait: Send + Sync {
    fn find_by_id(&self, platform_id: &str) -> Result<Option<Platform>>;
    fn find_by_name(&self, name: &str) -> Result<Option<Platform>>;
    /// All platforms, by display order then id.
    fn list_ordered(&self) -> Result<Vec<Platform>>;
    fn insert(&self, name: &str, display_order: i32) -> Result<Platform>;
    /// Returns the number of platforms renamed (0 when the id is unknown).
    fn rename(&self, platform_id: &str, name: &str) -> Result<usize>;
    fn delete(&self, platform_id: &str) -> Result<usize>;
    /// The highest display order in use, 0 when the table is empty.
    fn max_display_order(&self) -> Result<i32>;
    fn set_display_order(&self, platform_id: &str, display_order: i32) -> Result<usize>;
}

/// Trait defining the platform registry's public interface
#[async_trait]
pub trait PlatformServiceTrait: Send + Sync {
    fn list(&self) -> Result<Vec<Platform>>;
    /// Adds a platform after everything already on the list. Rejects blank
    /// and duplicate names.
    async fn create(&self, name: &str) -> Result<Platform>;
    async fn rename(&self, platform_id: &str, name: &str) -> Result<()>;
    /// Refuses to delete a platform while holdings are filed under its name.
    async fn delete(&self, platform_id: &str) -> Result<()>;
    /// Applies the given display orders; unknown ids are skipped.
    async fn reorder(&self, orders: Vec<PlatformOrder>) -> Result<()>;
    /// Seeds the default platform when it does not exist yet.
    async fn ensure_default(&self) -> Result<()>;
}
