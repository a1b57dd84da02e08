use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::{Error, Result, ValidationError};
use crate::funds::{FundRepositoryTrait, FundServiceTrait};
use crate::holdings::HoldingRepositoryTrait;
use crate::retry::{is_lock_contention, with_retry, RetryPolicy};
use crate::valuations::{NormalizedValuation, ValuationServiceTrait};
use crate::watchlist::watchlist_traits::{WatchlistRepositoryTrait, WatchlistServiceTrait};

/// Tracks funds for display independent of positions.
///
/// List reads are cache-tolerant: they accept snapshots up to the staleness
/// TTL rather than forcing a refresh per request, and degrade to an empty
/// quote shape per fund when neither cache nor upstream has data.
pub struct WatchlistService {
    watchlist_repository: Arc<dyn WatchlistRepositoryTrait>,
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    fund_repository: Arc<dyn FundRepositoryTrait>,
    fund_service: Arc<dyn FundServiceTrait>,
    valuation_service: Arc<dyn ValuationServiceTrait>,
    write_policy: RetryPolicy,
}

impl WatchlistService {
    pub fn new(
        watchlist_repository: Arc<dyn WatchlistRepositoryTrait>,
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
        fund_repository: Arc<dyn FundRepositoryTrait>,
        fund_service: Arc<dyn FundServiceTrait>,
        valuation_service: Arc<dyn ValuationServiceTrait>,
    ) -> Self {
        Self {
            watchlist_repository,
            holding_repository,
            fund_repository,
            fund_service,
            valuation_service,
            write_policy: RetryPolicy::store_write(),
        }
    }
}

#[async_trait]
impl WatchlistServiceTrait for WatchlistService {
    async fn add(&self, fund_code: &str, tags: Option<String>) -> Result<NormalizedValuation> {
        let fund = self.fund_service.get_or_create(fund_code).await?.into_fund();

        if self
            .watchlist_repository
            .find_by_fund_id(&fund.id)?
            .is_some()
        {
            return Err(ValidationError::InvalidInput(format!(
                "Fund {} is already on the watchlist",
                fund_code
            ))
            .into());
        }

        let tags = tags.unwrap_or_default();
        with_retry(&self.write_policy, is_lock_contention, || {
            self.watchlist_repository.create(&fund.id, &tags)
        })
        .await?;

        let quote = self.valuation_service.get_quote(fund_code, false).await?;
        Ok(quote.with_tags(Some(tags)))
    }

    async fn remove(&self, fund_code: &str) -> Result<()> {
        let fund = match self.fund_repository.find_by_code(fund_code)? {
            Some(fund) => fund,
            None => return Ok(()),
        };
        with_retry(&self.write_policy, is_lock_contention, || {
            self.watchlist_repository.delete_by_fund_id(&fund.id)
        })
        .await?;
        Ok(())
    }

    async fn set_tags(&self, fund_code: &str, tags: &str) -> Result<()> {
        let fund = self
            .fund_repository
            .find_by_code(fund_code)?
            .ok_or_else(|| Error::NotFound(format!("Fund {}", fund_code)))?;

        let updated = with_retry(&self.write_policy, is_lock_contention, || {
            self.watchlist_repository.update_tags(&fund.id, tags)
        })
        .await?;
        if updated == 0 {
            return Err(Error::NotFound(format!(
                "Fund {} is not on the watchlist",
                fund_code
            )));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<NormalizedValuation>> {
        let entries = self.watchlist_repository.list_with_funds()?;
        let watched_fund_ids: HashSet<String> =
            entries.iter().map(|(_, fund)| fund.id.clone()).collect();

        // Held funds missing from the watchlist are shown too, untagged.
        let mut extra_funds = Vec::new();
        let mut seen = watched_fund_ids.clone();
        for (_, fund) in self.holding_repository.list_with_funds()? {
            if seen.insert(fund.id.clone()) {
                extra_funds.push(fund);
            }
        }

        let codes: HashSet<String> = entries
            .iter()
            .map(|(_, fund)| fund.fund_code.clone())
            .chain(extra_funds.iter().map(|fund| fund.fund_code.clone()))
            .collect();
        let quotes = self.valuation_service.get_quotes(&codes, false).await?;

        let mut rows = Vec::with_capacity(entries.len() + extra_funds.len());
        for (entry, fund) in entries {
            let quote = quotes
                .get(&fund.fund_code)
                .cloned()
                .unwrap_or_else(|| NormalizedValuation::empty(&fund.fund_code, &fund.fund_name));
            rows.push(quote.with_tags(Some(entry.tags)));
        }
        for fund in extra_funds {
            let quote = quotes
                .get(&fund.fund_code)
                .cloned()
                .unwrap_or_else(|| NormalizedValuation::empty(&fund.fund_code, &fund.fund_name));
            rows.push(quote.with_tags(Some(String::new())));
        }
        Ok(rows)
    }

    fn tracked_codes(&self) -> Result<HashSet<String>> {
        let mut codes: HashSet<String> = self
            .watchlist_repository
            .list_with_funds()?
            .into_iter()
            .map(|(_, fund)| fund.fund_code)
            .collect();
        for (_, fund) in self.holding_repository.list_with_funds()? {
            codes.insert(fund.fund_code);
        }
        Ok(codes)
    }
}
