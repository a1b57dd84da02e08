use async_trait::async_trait;
use std::collections::HashSet;

use crate::errors::Result;
use crate::funds::Fund;
use crate::valuations::NormalizedValuation;
use crate::watchlist::watchlist_model::WatchlistEntry;

/// Trait for watchlist repository operations
pub trait WatchlistRepositoryTrait: Send + Sync {
    fn find_by_fund_id(&self, fund_id: &str) -> Result<Option<WatchlistEntry>>;
    /// Every entry joined with its fund, in insertion order.
    fn list_with_funds(&self) -> Result<Vec<(WatchlistEntry, Fund)>>;
    fn create(&self, fund_id: &str, tags: &str) -> Result<WatchlistEntry>;
    /// Returns the number of entries updated (0 when the fund has none).
    fn update_tags(&self, fund_id: &str, tags: &str) -> Result<usize>;
    /// Creates the entry or overwrites its tags when it already exists.
    fn upsert_tags(&self, fund_id: &str, tags: &str) -> Result<WatchlistEntry>;
    fn delete_by_fund_id(&self, fund_id: &str) -> Result<usize>;
}

/// Trait defining the watchlist's public interface
#[async_trait]
pub trait WatchlistServiceTrait: Send + Sync {
    /// Registers the fund if needed and adds it to the watchlist, returning
    /// its current quote. Rejects funds already on the list.
    async fn add(&self, fund_code: &str, tags: Option<String>) -> Result<NormalizedValuation>;
    /// Idempotent: removing an untracked or unknown fund succeeds.
    async fn remove(&self, fund_code: &str) -> Result<()>;
    async fn set_tags(&self, fund_code: &str, tags: &str) -> Result<()>;
    /// Watchlist quotes first, then held funds that are not on the list
    /// (those carry empty tags).
    async fn list(&self) -> Result<Vec<NormalizedValuation>>;
    /// Union of watchlist and holding fund codes, the set the refresh sweep
    /// keeps warm.
    fn tracked_codes(&self) -> Result<HashSet<String>>;
}
