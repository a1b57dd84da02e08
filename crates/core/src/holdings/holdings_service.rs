use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::info;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use fundfolio_market_data::parse_decimal;

use crate::constants::{DECIMAL_PRECISION, FALLBACK_PLATFORM_NAME, PROFIT_HISTORY_DEFAULT_LIMIT};
use crate::errors::{Error, LedgerError, Result};
use crate::funds::{Fund, FundRepositoryTrait, FundServiceTrait};
use crate::holdings::holdings_model::{
    BuyRequest, Holding, HoldingProfitRecord, HoldingUpdateRequest, HoldingView, HoldingWrite,
    NewTransaction, SellRequest, SyncRequest, Transaction, TransactionKind,
};
use crate::holdings::holdings_traits::{
    HoldingRepositoryTrait, HoldingServiceTrait, ProfitHistoryRepositoryTrait,
    TransactionRepositoryTrait,
};
use crate::retry::{is_lock_contention, with_retry, RetryPolicy};
use crate::utils::clock::Clock;
use crate::utils::time_utils::valuation_date;
use crate::valuations::{is_trading_day, DetailOptions, NormalizedValuation, ValuationServiceTrait};
use crate::watchlist::WatchlistRepositoryTrait;

/// The holding ledger: buys, sells, manual overrides, and the read-side
/// projection of every position against its cached quote.
///
/// Ledger math lives here, not in storage: repositories persist exactly the
/// values this service derives. Prices come from the valuation layer's
/// fallback chain, so every mutation works (with a logged approximation)
/// even when upstream is down.
pub struct HoldingService {
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    profit_history_repository: Arc<dyn ProfitHistoryRepositoryTrait>,
    fund_repository: Arc<dyn FundRepositoryTrait>,
    fund_service: Arc<dyn FundServiceTrait>,
    valuation_service: Arc<dyn ValuationServiceTrait>,
    watchlist_repository: Arc<dyn WatchlistRepositoryTrait>,
    clock: Arc<dyn Clock>,
    write_policy: RetryPolicy,
}

impl HoldingService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        profit_history_repository: Arc<dyn ProfitHistoryRepositoryTrait>,
        fund_repository: Arc<dyn FundRepositoryTrait>,
        fund_service: Arc<dyn FundServiceTrait>,
        valuation_service: Arc<dyn ValuationServiceTrait>,
        watchlist_repository: Arc<dyn WatchlistRepositoryTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            holding_repository,
            transaction_repository,
            profit_history_repository,
            fund_repository,
            fund_service,
            valuation_service,
            watchlist_repository,
            clock,
            write_policy: RetryPolicy::store_write(),
        }
    }

    fn transaction_timestamp(&self, trade_date: Option<NaiveDate>) -> NaiveDateTime {
        match trade_date {
            Some(date) => date.and_time(NaiveTime::MIN),
            None => self.clock.now().naive_utc(),
        }
    }

    /// Non-empty tags on a buy or sync also file the fund on the watchlist.
    async fn apply_tags(&self, fund_id: &str, tags: Option<&str>) -> Result<()> {
        let tags = match tags {
            Some(tags) if !tags.is_empty() => tags,
            _ => return Ok(()),
        };
        with_retry(&self.write_policy, is_lock_contention, || {
            self.watchlist_repository.upsert_tags(fund_id, tags)
        })
        .await?;
        Ok(())
    }

    fn require_fund(&self, fund_code: &str) -> Result<Fund> {
        self.fund_repository
            .find_by_code(fund_code)?
            .ok_or_else(|| Error::NotFound(format!("Fund {}", fund_code)))
    }

    /// Derived-from-unit back-fill shared by sync and update: the user gives
    /// value and profit, the ledger derives shares and cost from the NAV.
    fn derive_override(
        current_value: Decimal,
        profit: Decimal,
        unit_net_value: Decimal,
    ) -> (Decimal, Decimal, Decimal, Decimal) {
        let shares = if unit_net_value > Decimal::ZERO {
            current_value / unit_net_value
        } else {
            Decimal::ZERO
        };
        let cost = current_value - profit;
        let avg_cost = if shares > Decimal::ZERO {
            (cost / shares).round_dp(DECIMAL_PRECISION)
        } else {
            Decimal::ZERO
        };
        let profit_loss_rate = if cost > Decimal::ZERO {
            ((profit / cost) * dec!(100)).round_dp(DECIMAL_PRECISION)
        } else {
            Decimal::ZERO
        };
        (shares, cost, avg_cost, profit_loss_rate)
    }

    fn valued_write(
        id: Option<String>,
        fund_id: &str,
        platform: &str,
        cost: Decimal,
        shares: Decimal,
        avg_cost: Decimal,
        price: Decimal,
    ) -> HoldingWrite {
        let current_value = shares * price;
        let profit_loss = current_value - cost;
        let profit_loss_rate = if cost > Decimal::ZERO {
            ((profit_loss / cost) * dec!(100)).round_dp(DECIMAL_PRECISION)
        } else {
            Decimal::ZERO
        };
        HoldingWrite {
            id,
            fund_id: fund_id.to_string(),
            platform: platform.to_string(),
            cost,
            shares,
            avg_cost,
            current_value: Some(current_value),
            profit_loss: Some(profit_loss),
            profit_loss_rate: Some(profit_loss_rate),
        }
    }
}

/// Display-time projection of one position against its cached quote.
///
/// Returns `(current_value, estimate_profit)`. When the day's change rate is
/// published and the valuation is for today, yesterday's value is projected
/// forward by it; otherwise the intraday estimate is backed out; with
/// neither, the estimate is zero. Nothing here is persisted.
fn project_market_value(
    holding: &Holding,
    quote: &NormalizedValuation,
    today: NaiveDate,
) -> (Decimal, Decimal) {
    let unit = match quote.unit_net_value.filter(|v| !v.is_zero()) {
        Some(unit) => unit,
        None => return (holding.cost, Decimal::ZERO),
    };
    let base_value = holding.shares * unit;

    if !quote.daily_change_rate.is_zero() && is_trading_day(&quote.fsrq, today) {
        let today_value = base_value * (Decimal::ONE + quote.daily_change_rate / dec!(100));
        return (today_value, today_value - base_value);
    }

    if let Some(estimate_rate) = parse_decimal(&quote.estimate_change_rate) {
        let denominator = Decimal::ONE + estimate_rate / dec!(100);
        if !denominator.is_zero() {
            return (base_value, base_value - base_value / denominator);
        }
    }

    (base_value, Decimal::ZERO)
}

fn build_view(
    holding: &Holding,
    fund: &Fund,
    quote: Option<&NormalizedValuation>,
    tags: String,
    today: NaiveDate,
) -> HoldingView {
    match quote {
        Some(quote) => {
            let (current_value, estimate_profit) = project_market_value(holding, quote, today);
            let profit_loss = current_value - holding.cost;
            let profit_loss_rate = if holding.cost > Decimal::ZERO {
                ((profit_loss / holding.cost) * dec!(100)).round_dp(DECIMAL_PRECISION)
            } else {
                Decimal::ZERO
            };
            HoldingView {
                fund_code: fund.fund_code.clone(),
                fund_name: fund.fund_name.clone(),
                platform: holding.platform.clone(),
                cost: holding.cost,
                shares: holding.shares,
                avg_cost: holding.avg_cost,
                current_value,
                profit_loss,
                profit_loss_rate,
                estimate_change_rate: quote.estimate_change_rate.clone(),
                estimate_profit,
                daily_change_rate: quote.daily_change_rate,
                fsrq: quote.fsrq.clone(),
                one_month_rate: quote.one_month_rate,
                three_month_rate: quote.three_month_rate,
                one_year_rate: quote.one_year_rate,
                tags,
            }
        }
        // No quote at all: fall back to the last persisted valuation.
        None => HoldingView {
            fund_code: fund.fund_code.clone(),
            fund_name: fund.fund_name.clone(),
            platform: holding.platform.clone(),
            cost: holding.cost,
            shares: holding.shares,
            avg_cost: holding.avg_cost,
            current_value: holding.current_value.unwrap_or(holding.cost),
            profit_loss: holding.profit_loss.unwrap_or_default(),
            profit_loss_rate: holding.profit_loss_rate.unwrap_or_default(),
            estimate_change_rate: "-".to_string(),
            estimate_profit: Decimal::ZERO,
            daily_change_rate: Decimal::ZERO,
            fsrq: String::new(),
            one_month_rate: Decimal::ZERO,
            three_month_rate: Decimal::ZERO,
            one_year_rate: Decimal::ZERO,
            tags,
        },
    }
}

#[async_trait]
impl HoldingServiceTrait for HoldingService {
    async fn buy(&self, request: BuyRequest) -> Result<Holding> {
        request.validate()?;
        let fund = self
            .fund_service
            .get_or_create(&request.fund_code)
            .await?
            .into_fund();
        self.apply_tags(&fund.id, request.tags.as_deref()).await?;

        let platform = request
            .platform
            .clone()
            .unwrap_or_else(|| FALLBACK_PLATFORM_NAME.to_string());
        let price = self
            .valuation_service
            .resolve_trade_price(&request.fund_code, request.trade_date)
            .await?;
        let shares_bought = request.amount / price;

        let existing = self
            .holding_repository
            .find_for_platform(&fund.id, &platform)?;
        let (id, cost, shares, avg_cost) = match &existing {
            Some(holding) => {
                let cost = holding.cost + request.amount;
                let shares = holding.shares + shares_bought;
                let avg_cost = (cost / shares).round_dp(DECIMAL_PRECISION);
                (Some(holding.id.clone()), cost, shares, avg_cost)
            }
            None => (None, request.amount, shares_bought, price),
        };

        let write = Self::valued_write(id, &fund.id, &platform, cost, shares, avg_cost, price);
        let transaction = NewTransaction {
            fund_id: fund.id.clone(),
            kind: TransactionKind::Buy,
            amount: request.amount,
            shares: shares_bought,
            price,
            transaction_date: self.transaction_timestamp(request.trade_date),
        };

        let holding = with_retry(&self.write_policy, is_lock_contention, || {
            self.holding_repository
                .upsert_with_transaction(write.clone(), transaction.clone())
        })
        .await?;
        info!(
            "Recorded buy of fund {} on {}: amount {}, price {}",
            request.fund_code, platform, request.amount, price
        );
        Ok(holding)
    }

    async fn sell(&self, request: SellRequest) -> Result<Option<Holding>> {
        request.validate()?;
        let fund = self
            .fund_service
            .get_or_create(&request.fund_code)
            .await?
            .into_fund();
        let platform = request
            .platform
            .clone()
            .unwrap_or_else(|| FALLBACK_PLATFORM_NAME.to_string());
        let price = self
            .valuation_service
            .resolve_trade_price(&request.fund_code, request.trade_date)
            .await?;

        let holding = self
            .holding_repository
            .find_for_platform(&fund.id, &platform)?;
        let holding = match holding {
            Some(holding) if holding.shares >= request.shares => holding,
            other => {
                return Err(LedgerError::InsufficientShares {
                    fund_code: request.fund_code.clone(),
                    requested: request.shares,
                    held: other.map(|h| h.shares).unwrap_or_default(),
                }
                .into())
            }
        };

        let amount = request.shares * price;
        let remaining_shares = holding.shares - request.shares;
        let remaining_cost = holding.cost - amount;
        let transaction = NewTransaction {
            fund_id: fund.id.clone(),
            kind: TransactionKind::Sell,
            amount,
            shares: request.shares,
            price,
            transaction_date: self.transaction_timestamp(request.trade_date),
        };

        if remaining_shares <= Decimal::ZERO {
            with_retry(&self.write_policy, is_lock_contention, || {
                self.holding_repository
                    .close_with_transaction(&holding.id, transaction.clone())
            })
            .await?;
            info!(
                "Closed position in fund {} on {}: sold {} shares at {}",
                request.fund_code, platform, request.shares, price
            );
            return Ok(None);
        }

        let avg_cost = (remaining_cost / remaining_shares).round_dp(DECIMAL_PRECISION);
        let write = Self::valued_write(
            Some(holding.id.clone()),
            &fund.id,
            &platform,
            remaining_cost,
            remaining_shares,
            avg_cost,
            price,
        );
        let updated = with_retry(&self.write_policy, is_lock_contention, || {
            self.holding_repository
                .upsert_with_transaction(write.clone(), transaction.clone())
        })
        .await?;
        info!(
            "Recorded sell of fund {} on {}: {} shares at {}",
            request.fund_code, platform, request.shares, price
        );
        Ok(Some(updated))
    }

    async fn sync(&self, request: SyncRequest) -> Result<Holding> {
        request.validate()?;
        let fund = self
            .fund_service
            .get_or_create(&request.fund_code)
            .await?
            .into_fund();
        self.apply_tags(&fund.id, request.tags.as_deref()).await?;

        let platform = request
            .platform
            .clone()
            .unwrap_or_else(|| FALLBACK_PLATFORM_NAME.to_string());
        let unit_net_value = self
            .valuation_service
            .resolve_trade_price(&request.fund_code, None)
            .await?;
        let (shares, cost, avg_cost, profit_loss_rate) =
            Self::derive_override(request.current_value, request.profit, unit_net_value);

        let existing = self
            .holding_repository
            .find_for_platform(&fund.id, &platform)?;
        let write = HoldingWrite {
            id: existing.map(|holding| holding.id),
            fund_id: fund.id.clone(),
            platform: platform.clone(),
            cost,
            shares,
            avg_cost,
            current_value: Some(request.current_value),
            profit_loss: Some(request.profit),
            profit_loss_rate: Some(profit_loss_rate),
        };
        let holding = with_retry(&self.write_policy, is_lock_contention, || {
            self.holding_repository.upsert_position(write.clone())
        })
        .await?;
        info!(
            "Synced holding of fund {} on {}: value {}, profit {}, unit {}",
            request.fund_code, platform, request.current_value, request.profit, unit_net_value
        );
        Ok(holding)
    }

    async fn update(&self, fund_code: &str, request: HoldingUpdateRequest) -> Result<Holding> {
        request.validate()?;
        let fund = self.require_fund(fund_code)?;

        // Peek at the latest NAV without disturbing the cached snapshot.
        let detail = self
            .valuation_service
            .get_detail(
                fund_code,
                DetailOptions {
                    force_refresh: true,
                    need_history: false,
                    skip_store_write: true,
                },
            )
            .await?;
        let unit_net_value = detail
            .unit_net_value
            .filter(|unit| *unit > Decimal::ZERO)
            .ok_or_else(|| Error::NotFound(format!("No published net value for fund {}", fund_code)))?;

        let platform = request
            .platform
            .clone()
            .unwrap_or_else(|| FALLBACK_PLATFORM_NAME.to_string());
        let holding = self
            .holding_repository
            .find_for_platform(&fund.id, &platform)?
            .ok_or_else(|| {
                Error::NotFound(format!("No holding for fund {} on {}", fund_code, platform))
            })?;

        let (shares, cost, avg_cost, profit_loss_rate) =
            Self::derive_override(request.current_value, request.profit, unit_net_value);
        info!(
            "Overriding holding {}: value {} -> {}, profit {} -> {}",
            holding.id,
            holding.current_value.unwrap_or_default(),
            request.current_value,
            holding.profit_loss.unwrap_or_default(),
            request.profit
        );

        let write = HoldingWrite {
            id: Some(holding.id),
            fund_id: fund.id.clone(),
            platform,
            cost,
            shares,
            avg_cost,
            current_value: Some(request.current_value),
            profit_loss: Some(request.profit),
            profit_loss_rate: Some(profit_loss_rate),
        };
        with_retry(&self.write_policy, is_lock_contention, || {
            self.holding_repository.upsert_position(write.clone())
        })
        .await
    }

    async fn delete(&self, fund_code: &str, platform: Option<&str>) -> Result<usize> {
        let fund = self.require_fund(fund_code)?;
        let removed = match platform {
            Some(platform) => {
                let holding = self
                    .holding_repository
                    .find_for_platform(&fund.id, platform)?
                    .ok_or_else(|| {
                        Error::NotFound(format!(
                            "No holding for fund {} on {}",
                            fund_code, platform
                        ))
                    })?;
                with_retry(&self.write_policy, is_lock_contention, || {
                    self.holding_repository.delete(&holding.id)
                })
                .await?
            }
            None => {
                with_retry(&self.write_policy, is_lock_contention, || {
                    self.holding_repository.delete_for_fund(&fund.id)
                })
                .await?
            }
        };
        if removed == 0 {
            return Err(Error::NotFound(format!("No holdings for fund {}", fund_code)));
        }
        info!("Deleted {} holding(s) of fund {}", removed, fund_code);
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<HoldingView>> {
        let rows = self.holding_repository.list_with_funds()?;
        let codes: HashSet<String> = rows
            .iter()
            .map(|(_, fund)| fund.fund_code.clone())
            .collect();
        let quotes = self.valuation_service.get_quotes(&codes, false).await?;
        let tags_by_fund: HashMap<String, String> = self
            .watchlist_repository
            .list_with_funds()?
            .into_iter()
            .map(|(entry, fund)| (fund.id, entry.tags))
            .collect();
        let today = valuation_date(self.clock.now());

        Ok(rows
            .iter()
            .map(|(holding, fund)| {
                let tags = tags_by_fund.get(&fund.id).cloned().unwrap_or_default();
                build_view(holding, fund, quotes.get(&fund.fund_code), tags, today)
            })
            .collect())
    }

    fn transactions(&self, fund_code: &str) -> Result<Vec<Transaction>> {
        let fund = self.require_fund(fund_code)?;
        self.transaction_repository.list_for_fund(&fund.id)
    }

    fn profit_history(
        &self,
        fund_code: &str,
        limit: Option<i64>,
    ) -> Result<Vec<HoldingProfitRecord>> {
        let fund = self.require_fund(fund_code)?;
        let holding = self
            .holding_repository
            .find_first_for_fund(&fund.id)?
            .ok_or_else(|| Error::NotFound(format!("No holding for fund {}", fund_code)))?;
        self.profit_history_repository
            .list_for_holding(&holding.id, limit.unwrap_or(PROFIT_HISTORY_DEFAULT_LIMIT))
    }
}
