use std::sync::Arc;

use async_trait::async_trait;
use fundfolio_market_data::{FundDataProvider, FundSearchHit};
use log::warn;

use super::funds_model::{Fund, FundLookup, NewFund};
use super::funds_traits::{FundRepositoryTrait, FundServiceTrait};
use crate::constants::UNKNOWN_FUND_TYPE;
use crate::errors::{Error, Result};
use crate::retry::{is_lock_contention, with_retry, RetryPolicy};

/// Registers funds lazily on first reference and answers identity lookups.
pub struct FundService {
    fund_repository: Arc<dyn FundRepositoryTrait>,
    provider: Arc<dyn FundDataProvider>,
    write_policy: RetryPolicy,
}

impl FundService {
    pub fn new(
        fund_repository: Arc<dyn FundRepositoryTrait>,
        provider: Arc<dyn FundDataProvider>,
    ) -> Self {
        FundService {
            fund_repository,
            provider,
            write_policy: RetryPolicy::store_write(),
        }
    }

    /// Builds the registration payload for an unseen code: the valuation
    /// endpoint names the fund (type unknown), falling back to the first
    /// search hit, which also carries a category.
    async fn resolve_new_fund(&self, fund_code: &str) -> Result<NewFund> {
        match self.provider.fetch_valuation(fund_code).await {
            Ok(Some(quote)) => {
                return Ok(NewFund {
                    fund_code: quote.fund_code,
                    fund_name: quote.fund_name,
                    fund_type: UNKNOWN_FUND_TYPE.to_string(),
                });
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Valuation lookup for new fund {} failed: {}", fund_code, e);
            }
        }

        let hits = self.search(fund_code).await?;
        if let Some(hit) = hits.into_iter().next() {
            return Ok(NewFund {
                fund_code: hit.fund_code,
                fund_name: hit.fund_name,
                fund_type: hit.fund_type,
            });
        }

        Err(Error::NotFound(format!("Fund {}", fund_code)))
    }

    async fn backfill_name(&self, fund: &mut Fund) {
        let quote = match self.provider.fetch_valuation(&fund.fund_code).await {
            Ok(Some(quote)) if !quote.fund_name.is_empty() => quote,
            Ok(_) => return,
            Err(e) => {
                warn!("Name backfill fetch for fund {} failed: {}", fund.fund_code, e);
                return;
            }
        };

        let result = with_retry(&self.write_policy, is_lock_contention, || {
            self.fund_repository.update_name(&fund.id, &quote.fund_name)
        })
        .await;

        match result {
            Ok(_) => fund.fund_name = quote.fund_name,
            Err(e) => warn!("Name backfill for fund {} failed: {}", fund.fund_code, e),
        }
    }
}

#[async_trait]
impl FundServiceTrait for FundService {
    async fn get_or_create(&self, fund_code: &str) -> Result<FundLookup> {
        if let Some(mut fund) = self.fund_repository.find_by_code(fund_code)? {
            if fund.fund_name.is_empty() {
                self.backfill_name(&mut fund).await;
            }
            return Ok(FundLookup::Existing(fund));
        }

        let new_fund = self.resolve_new_fund(fund_code).await?;
        new_fund.validate()?;

        let fund = with_retry(&self.write_policy, is_lock_contention, || {
            self.fund_repository.create(new_fund.clone())
        })
        .await?;

        Ok(FundLookup::Created(fund))
    }

    fn get_by_code(&self, fund_code: &str) -> Result<Fund> {
        self.fund_repository.get_by_code(fund_code)
    }

    fn list(&self) -> Result<Vec<Fund>> {
        self.fund_repository.list()
    }

    async fn search(&self, keyword: &str) -> Result<Vec<FundSearchHit>> {
        match self.provider.search(keyword).await {
            Ok(hits) => Ok(hits),
            Err(e) => {
                warn!("Fund search for '{}' failed: {}", keyword, e);
                Ok(Vec::new())
            }
        }
    }
}
