use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use fundfolio_market_data::{BatchFetcher, FundDataProvider, FundReturns, HistoryDepth};
use log::{debug, info, warn};
use rust_decimal::Decimal;

use super::valuations_model::{
    DetailOptions, NormalizedValuation, SnapshotStaleness, SnapshotUpdate, ValuationSnapshot,
};
use super::valuations_traits::{ValuationRepositoryTrait, ValuationServiceTrait};
use crate::constants::{FALLBACK_UNIT_VALUE, SNAPSHOT_TTL_MINUTES};
use crate::errors::{Error, Result};
use crate::funds::FundRepositoryTrait;
use crate::retry::{is_lock_contention, with_retry, RetryPolicy};
use crate::utils::clock::Clock;

/// Read-through cache over the upstream provider: serves fresh snapshots
/// from the store, refreshes stale ones, and degrades to stale or empty
/// data when upstream has nothing (availability over freshness).
pub struct ValuationService {
    fund_repository: Arc<dyn FundRepositoryTrait>,
    valuation_repository: Arc<dyn ValuationRepositoryTrait>,
    provider: Arc<dyn FundDataProvider>,
    batch_fetcher: BatchFetcher,
    clock: Arc<dyn Clock>,
    write_policy: RetryPolicy,
}

impl ValuationService {
    /// `provider` serves the per-fund detail paths; `batch_provider` (its
    /// coarser-bucketed sibling) feeds the bounded batch orchestrator.
    pub fn new(
        fund_repository: Arc<dyn FundRepositoryTrait>,
        valuation_repository: Arc<dyn ValuationRepositoryTrait>,
        provider: Arc<dyn FundDataProvider>,
        batch_provider: Arc<dyn FundDataProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        ValuationService {
            fund_repository,
            valuation_repository,
            provider,
            batch_fetcher: BatchFetcher::new(batch_provider),
            clock,
            write_policy: RetryPolicy::sensitive_store_write(),
        }
    }

    fn ttl(&self) -> Duration {
        Duration::minutes(SNAPSHOT_TTL_MINUTES)
    }

    async fn fetch_quote(&self, fund_code: &str) -> Option<fundfolio_market_data::ValuationQuote> {
        match self.provider.fetch_valuation(fund_code).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!("Valuation fetch for fund {} failed: {}", fund_code, e);
                None
            }
        }
    }

    async fn store_snapshot(
        &self,
        update: SnapshotUpdate,
        refreshed_at: NaiveDateTime,
    ) -> Result<ValuationSnapshot> {
        with_retry(&self.write_policy, is_lock_contention, || {
            self.valuation_repository.upsert(update.clone(), refreshed_at)
        })
        .await
    }
}

#[async_trait]
impl ValuationServiceTrait for ValuationService {
    async fn get_detail(
        &self,
        fund_code: &str,
        options: DetailOptions,
    ) -> Result<NormalizedValuation> {
        let fund = self
            .fund_repository
            .find_by_code(fund_code)?
            .ok_or_else(|| Error::NotFound(format!("Fund {}", fund_code)))?;

        let snapshot = self.valuation_repository.find_by_fund_id(&fund.id)?;
        let now = self.clock.now().naive_utc();
        let staleness = SnapshotStaleness::classify(snapshot.as_ref(), now, self.ttl());

        if !options.force_refresh && staleness == SnapshotStaleness::Fresh {
            return Ok(NormalizedValuation::from_parts(
                fund_code,
                &fund.fund_name,
                snapshot.as_ref(),
                options.need_history,
            ));
        }

        let quote = self.fetch_quote(fund_code).await;
        let depth = if options.need_history {
            HistoryDepth::Full
        } else {
            HistoryDepth::ReturnsOnly
        };
        let history = self.provider.fetch_history(fund_code, depth).await;

        if quote.is_none() && history.is_empty() {
            debug!(
                "Refresh for fund {} yielded no data, serving cached state",
                fund_code
            );
            return Ok(NormalizedValuation::from_parts(
                fund_code,
                &fund.fund_name,
                snapshot.as_ref(),
                options.need_history,
            ));
        }

        let update = SnapshotUpdate::from_quote_and_history(
            &fund.id,
            quote.as_ref(),
            &history,
            options.need_history,
        );
        let merged = if options.skip_store_write {
            update.apply_to(snapshot.as_ref(), now)
        } else {
            self.store_snapshot(update, now).await?
        };

        Ok(NormalizedValuation::from_parts(
            fund_code,
            &fund.fund_name,
            Some(&merged),
            options.need_history,
        ))
    }

    async fn get_quote(
        &self,
        fund_code: &str,
        force_refresh: bool,
    ) -> Result<NormalizedValuation> {
        let fund = self
            .fund_repository
            .find_by_code(fund_code)?
            .ok_or_else(|| Error::NotFound(format!("Fund {}", fund_code)))?;

        let snapshot = self.valuation_repository.find_by_fund_id(&fund.id)?;
        let now = self.clock.now().naive_utc();
        let staleness = SnapshotStaleness::classify(snapshot.as_ref(), now, self.ttl());

        if !force_refresh && staleness == SnapshotStaleness::Fresh {
            return Ok(NormalizedValuation::from_parts(
                fund_code,
                &fund.fund_name,
                snapshot.as_ref(),
                false,
            ));
        }

        let quote = self.fetch_quote(fund_code).await;
        let returns = self.provider.fetch_returns(fund_code).await;

        if quote.is_none() && returns.is_empty() {
            return Ok(NormalizedValuation::from_parts(
                fund_code,
                &fund.fund_name,
                snapshot.as_ref(),
                false,
            ));
        }

        let update = SnapshotUpdate::from_quote_and_returns(&fund.id, quote.as_ref(), &returns);
        let stored = self.store_snapshot(update, now).await?;

        Ok(NormalizedValuation::from_parts(
            fund_code,
            &fund.fund_name,
            Some(&stored),
            false,
        ))
    }

    async fn get_quotes(
        &self,
        fund_codes: &HashSet<String>,
        force_refresh: bool,
    ) -> Result<HashMap<String, NormalizedValuation>> {
        let mut results = HashMap::new();
        if fund_codes.is_empty() {
            return Ok(results);
        }

        let now = self.clock.now().naive_utc();
        let ttl = self.ttl();

        let mut funds = Vec::new();
        for code in fund_codes {
            match self.fund_repository.find_by_code(code)? {
                Some(fund) => funds.push(fund),
                None => debug!("Skipping unregistered fund {} in batch read", code),
            }
        }

        let fund_ids: Vec<String> = funds.iter().map(|fund| fund.id.clone()).collect();
        let mut snapshots: HashMap<String, ValuationSnapshot> = self
            .valuation_repository
            .find_for_funds(&fund_ids)?
            .into_iter()
            .map(|snapshot| (snapshot.fund_id.clone(), snapshot))
            .collect();

        let mut to_refresh = Vec::new();
        for fund in funds {
            let snapshot = snapshots.remove(&fund.id);
            if !force_refresh
                && SnapshotStaleness::classify(snapshot.as_ref(), now, ttl)
                    == SnapshotStaleness::Fresh
            {
                let normalized = NormalizedValuation::from_parts(
                    &fund.fund_code,
                    &fund.fund_name,
                    snapshot.as_ref(),
                    false,
                );
                results.insert(fund.fund_code.clone(), normalized);
            } else {
                to_refresh.push((fund, snapshot));
            }
        }

        if to_refresh.is_empty() {
            return Ok(results);
        }

        let refresh_codes: HashSet<String> = to_refresh
            .iter()
            .map(|(fund, _)| fund.fund_code.clone())
            .collect();
        let mut quotes = self.batch_fetcher.fetch_valuations_many(&refresh_codes).await;
        let mut returns_map = self.batch_fetcher.fetch_returns_many(&refresh_codes).await;

        for (fund, snapshot) in to_refresh {
            let quote = quotes.remove(&fund.fund_code).flatten();
            let returns = returns_map
                .remove(&fund.fund_code)
                .unwrap_or_else(|| FundReturns::empty(&fund.fund_code));

            let normalized = if quote.is_none() && returns.is_empty() {
                NormalizedValuation::from_parts(
                    &fund.fund_code,
                    &fund.fund_name,
                    snapshot.as_ref(),
                    false,
                )
            } else {
                let update =
                    SnapshotUpdate::from_quote_and_returns(&fund.id, quote.as_ref(), &returns);
                match self.store_snapshot(update, now).await {
                    Ok(stored) => NormalizedValuation::from_parts(
                        &fund.fund_code,
                        &fund.fund_name,
                        Some(&stored),
                        false,
                    ),
                    Err(e) => {
                        warn!(
                            "Storing refreshed snapshot for fund {} failed: {}",
                            fund.fund_code, e
                        );
                        NormalizedValuation::from_parts(
                            &fund.fund_code,
                            &fund.fund_name,
                            snapshot.as_ref(),
                            false,
                        )
                    }
                }
            };
            results.insert(fund.fund_code.clone(), normalized);
        }

        Ok(results)
    }

    async fn resolve_trade_price(
        &self,
        fund_code: &str,
        trade_date: Option<NaiveDate>,
    ) -> Result<Decimal> {
        if let Some(date) = trade_date {
            if let Some(record) = self.provider.fetch_history_on(fund_code, date).await {
                if record.unit_net_value > Decimal::ZERO {
                    info!(
                        "Using historical NAV {} on {} for fund {}",
                        record.unit_net_value, date, fund_code
                    );
                    return Ok(record.unit_net_value);
                }
            }
            debug!(
                "No NAV published on {} for fund {}, falling back to latest",
                date, fund_code
            );
        }

        let detail = self
            .get_detail(
                fund_code,
                DetailOptions {
                    force_refresh: true,
                    need_history: false,
                    skip_store_write: false,
                },
            )
            .await?;

        if let Some(unit) = detail.unit_net_value.filter(|unit| *unit > Decimal::ZERO) {
            return Ok(unit);
        }
        if let Some(estimate) = detail
            .estimate_net_value
            .filter(|estimate| *estimate > Decimal::ZERO)
        {
            return Ok(estimate);
        }

        warn!(
            "No usable price for fund {}, defaulting to {}",
            fund_code, FALLBACK_UNIT_VALUE
        );
        Ok(FALLBACK_UNIT_VALUE)
    }
}
