use async_trait::async_trait;

use crate::errors::Result;
use crate::funds::Fund;
use crate::holdings::holdings_model::{
    BuyRequest, Holding, HoldingProfitRecord, HoldingProfitUpdate, HoldingUpdateRequest,
    HoldingView, HoldingWrite, NewProfitRecord, NewTransaction, SellRequest, SyncRequest,
    Transaction,
};

/// Trait for holding repository operations
pub trait HoldingRepositoryTrait: Send + Sync {
    fn find_for_platform(&self, fund_id: &str, platform: &str) -> Result<Option<Holding>>;
    fn find_first_for_fund(&self, fund_id: &str) -> Result<Option<Holding>>;
    fn list(&self) -> Result<Vec<Holding>>;
    /// Every holding joined with its fund, in insertion order.
    fn list_with_funds(&self) -> Result<Vec<(Holding, Fund)>>;
    /// How many holdings are filed under the given platform label.
    fn count_for_platform_name(&self, platform: &str) -> Result<i64>;
    /// Inserts or fully replaces a position. No transaction row is written.
    fn upsert_position(&self, write: HoldingWrite) -> Result<Holding>;
    /// Inserts or replaces a position and appends the transaction row in the
    /// same store transaction.
    fn upsert_with_transaction(
        &self,
        write: HoldingWrite,
        transaction: NewTransaction,
    ) -> Result<Holding>;
    /// Deletes a closed position and appends the closing transaction row in
    /// the same store transaction. Returns the number of holdings removed.
    fn close_with_transaction(&self, holding_id: &str, transaction: NewTransaction)
        -> Result<usize>;
    fn delete(&self, holding_id: &str) -> Result<usize>;
    fn delete_for_fund(&self, fund_id: &str) -> Result<usize>;
    /// Writes the sweep's valuation back onto the holding and appends the
    /// profit-history row in the same store transaction.
    fn apply_profit_update(
        &self,
        update: HoldingProfitUpdate,
        record: NewProfitRecord,
    ) -> Result<()>;
}

/// Trait for transaction repository operations
pub trait TransactionRepositoryTrait: Send + Sync {
    /// All transactions for a fund, newest effective date first.
    fn list_for_fund(&self, fund_id: &str) -> Result<Vec<Transaction>>;
}

/// Trait for profit-history repository operations
pub trait ProfitHistoryRepositoryTrait: Send + Sync {
    /// Most recent profit snapshots for a holding, newest first.
    fn list_for_holding(&self, holding_id: &str, limit: i64) -> Result<Vec<HoldingProfitRecord>>;
}

/// Trait defining the holding ledger's public interface
#[async_trait]
pub trait HoldingServiceTrait: Send + Sync {
    async fn buy(&self, request: BuyRequest) -> Result<Holding>;
    /// Returns the surviving position, or `None` when the sell closed it.
    async fn sell(&self, request: SellRequest) -> Result<Option<Holding>>;
    async fn sync(&self, request: SyncRequest) -> Result<Holding>;
    async fn update(&self, fund_code: &str, request: HoldingUpdateRequest) -> Result<Holding>;
    /// Deletes the holding on the given platform, or every holding of the
    /// fund when no platform is named. Returns the number removed.
    async fn delete(&self, fund_code: &str, platform: Option<&str>) -> Result<usize>;
    async fn list(&self) -> Result<Vec<HoldingView>>;
    fn transactions(&self, fund_code: &str) -> Result<Vec<Transaction>>;
    fn profit_history(
        &self,
        fund_code: &str,
        limit: Option<i64>,
    ) -> Result<Vec<HoldingProfitRecord>>;
}
