pub mod holdings_model;
pub(crate) mod holdings_service;
pub(crate) mod holdings_traits;


// Re-export the public interface
pub use holdings_model::{
    BuyRequest, Holding, HoldingProfitRecord, HoldingProfitUpdate, HoldingUpdateRequest,
    HoldingView, HoldingWrite, NewProfitRecord, NewTransaction, SellRequest, SyncRequest,
    Transaction, TransactionKind,
};
pub use holdings_service::HoldingService;
pub use holdings_traits::{
    HoldingRepositoryTrait, HoldingServiceTrait, ProfitHistoryRepositoryTrait,
    TransactionRepositoryTrait,
};
