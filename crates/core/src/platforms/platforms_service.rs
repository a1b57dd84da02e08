use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use crate::constants::DEFAULT_PLATFORM_NAME;
use crate::errors::{Error, Result, ValidationError};
use crate::holdings::HoldingRepositoryTrait;
use crate::platforms::platforms_model::{Platform, PlatformOrder};
use crate::platforms::platforms_traits::{PlatformRepositoryTrait, PlatformServiceTrait};
use crate::retry::{is_lock_contention, with_retry, RetryPolicy};

/// Registry of the venues positions are filed under.
pub struct PlatformService {
    platform_repository: Arc<dyn PlatformRepositoryTrait>,
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    write_policy: RetryPolicy,
}

impl PlatformService {
    pub fn new(
        platform_repository: Arc<dyn PlatformRepositoryTrait>,
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
    ) -> Self {
        Self {
            platform_repository,
            holding_repository,
            write_policy: RetryPolicy::store_write(),
        }
    }

    fn require(&self, platform_id: &str) -> Result<Platform> {
        self.platform_repository
            .find_by_id(platform_id)?
            .ok_or_else(|| Error::NotFound(format!("Platform {}", platform_id)))
    }

    fn validate_name(name: &str) -> Result<&str> {
        let name = name.trim();
        if name.is_empty() {
            return Err(
                ValidationError::InvalidInput("Platform name must not be empty".to_string())
                    .into(),
            );
        }
        Ok(name)
    }
}

#[async_trait]
impl PlatformServiceTrait for PlatformService {
    fn list(&self) -> Result<Vec<Platform>> {
        self.platform_repository.list_ordered()
    }

    async fn create(&self, name: &str) -> Result<Platform> {
        let name = Self::validate_name(name)?;
        if self.platform_repository.find_by_name(name)?.is_some() {
            return Err(ValidationError::InvalidInput(format!(
                "Platform {} already exists",
                name
            ))
            .into());
        }

        // New platforms sort after everything already on the list.
        let display_order = self.platform_repository.max_display_order()? + 1;
        let platform = with_retry(&self.write_policy, is_lock_contention, || {
            self.platform_repository.insert(name, display_order)
        })
        .await?;
        info!(
            "Created platform {} at order {}",
            platform.name, display_order
        );
        Ok(platform)
    }

    async fn rename(&self, platform_id: &str, name: &str) -> Result<()> {
        let name = Self::validate_name(name)?;
        let platform = self.require(platform_id)?;
        if let Some(existing) = self.platform_repository.find_by_name(name)? {
            if existing.id != platform.id {
                return Err(ValidationError::InvalidInput(format!(
                    "Platform {} already exists",
                    name
                ))
                .into());
            }
        }

        with_retry(&self.write_policy, is_lock_contention, || {
            self.platform_repository.rename(&platform.id, name)
        })
        .await?;
        info!("Renamed platform {} to {}", platform.name, name);
        Ok(())
    }

    async fn delete(&self, platform_id: &str) -> Result<()> {
        let platform = self.require(platform_id)?;
        let in_use = self
            .holding_repository
            .count_for_platform_name(&platform.name)?;
        if in_use > 0 {
            return Err(ValidationError::InvalidInput(format!(
                "Platform {} still has {} holding(s)",
                platform.name, in_use
            ))
            .into());
        }

        with_retry(&self.write_policy, is_lock_contention, || {
            self.platform_repository.delete(&platform.id)
        })
        .await?;
        info!("Deleted platform {}", platform.name);
        Ok(())
    }

    async fn reorder(&self, orders: Vec<PlatformOrder>) -> Result<()> {
        if orders.is_empty() {
            return Err(
                ValidationError::InvalidInput("Order list must not be empty".to_string()).into(),
            );
        }
        for order in &orders {
            let updated = with_retry(&self.write_policy, is_lock_contention, || {
                self.platform_repository
                    .set_display_order(&order.id, order.display_order)
            })
            .await?;
            if updated == 0 {
                debug!("Skipped reorder of unknown platform {}", order.id);
            }
        }
        Ok(())
    }

    async fn ensure_default(&self) -> Result<()> {
        if self
            .platform_repository
            .find_by_name(DEFAULT_PLATFORM_NAME)?
            .is_some()
        {
            return Ok(());
        }
        with_retry(&self.write_policy, is_lock_contention, || {
            self.platform_repository.insert(DEFAULT_PLATFORM_NAME, 0)
        })
        .await?;
        info!("Seeded default platform {}", DEFAULT_PLATFORM_NAME);
        Ok(())
    }
}
