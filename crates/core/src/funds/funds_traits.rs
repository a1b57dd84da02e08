use async_trait::async_trait;
use fundfolio_market_data::FundSearchHit;

use super::funds_model::{Fund, FundLookup, NewFund};
use crate::errors::Result;

/// Storage access for fund identity records.
pub trait FundRepositoryTrait: Send + Sync {
    fn find_by_code(&self, fund_code: &str) -> Result<Option<Fund>>;
    fn get_by_code(&self, fund_code: &str) -> Result<Fund>;
    fn list(&self) -> Result<Vec<Fund>>;
    fn create(&self, new_fund: NewFund) -> Result<Fund>;
    fn update_name(&self, fund_id: &str, fund_name: &str) -> Result<usize>;
}

#[async_trait]
pub trait FundServiceTrait: Send + Sync {
    async fn get_or_create(&self, fund_code: &str) -> Result<FundLookup>;
    fn get_by_code(&self, fund_code: &str) -> Result<Fund>;
    fn list(&self) -> Result<Vec<Fund>>;
    async fn search(&self, keyword: &str) -> Result<Vec<FundSearchHit>>;
}
