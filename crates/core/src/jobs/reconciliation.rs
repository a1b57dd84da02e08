use chrono::NaiveDate;
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::constants::{
    DECIMAL_PRECISION, DISPLAY_DECIMAL_PRECISION, PROFIT_WINDOW_END_HOUR, PROFIT_WINDOW_START_HOUR,
};
use crate::errors::Result;
use crate::funds::Fund;
use crate::holdings::{Holding, HoldingProfitUpdate, HoldingRepositoryTrait, NewProfitRecord};
use crate::retry::{is_lock_contention, with_retry, RetryPolicy};
use crate::utils::clock::Clock;
use crate::utils::time_utils::{valuation_date, valuation_hour};
use crate::valuations::{is_trading_day, DetailOptions, NormalizedValuation, ValuationServiceTrait};
use crate::watchlist::WatchlistRepositoryTrait;

/// Counters reported by one sweep run. The refresh sweep fills
/// `refreshed`/`failed`; the profit sweep fills the other three.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SweepSummary {
    pub refreshed: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// The two periodic reconciliation sweeps.
///
/// Both run against the same store the request handlers use, so every write
/// here goes through the sensitive retry policy. Errors are contained per
/// fund: one bad code never aborts a sweep.
pub struct ReconciliationJobs {
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    watchlist_repository: Arc<dyn WatchlistRepositoryTrait>,
    valuation_service: Arc<dyn ValuationServiceTrait>,
    clock: Arc<dyn Clock>,
    write_policy: RetryPolicy,
}

impl ReconciliationJobs {
    pub fn new(
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
        watchlist_repository: Arc<dyn WatchlistRepositoryTrait>,
        valuation_service: Arc<dyn ValuationServiceTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            holding_repository,
            watchlist_repository,
            valuation_service,
            clock,
            write_policy: RetryPolicy::sensitive_store_write(),
        }
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

    async fn force_detail(&self, fund_code: &str) -> Result<NormalizedValuation> {
        self.valuation_service
            .get_detail(
                fund_code,
                DetailOptions {
                    force_refresh: true,
                    need_history: true,
                    skip_store_write: false,
                },
            )
            .await
    }

    /// Force-refreshes the cached valuation of every watched or held fund.
    pub async fn refresh_sweep(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();
        let codes = match self.tracked_codes() {
            Ok(codes) => codes,
            Err(error) => {
                error!("Refresh sweep could not list tracked funds: {}", error);
                summary.failed += 1;
                return summary;
            }
        };
        info!("Refreshing valuations for {} tracked fund(s)", codes.len());

        for code in codes {
            match self.force_detail(&code).await {
                Ok(_) => summary.refreshed += 1,
                Err(error) => {
                    warn!("Refresh of fund {} failed: {}", code, error);
                    summary.failed += 1;
                }
            }
        }
        info!(
            "Refresh sweep finished: {} refreshed, {} failed",
            summary.refreshed, summary.failed
        );
        summary
    }

    /// Recomputes and snapshots holding profit once the day's change rate is
    /// published. Outside the evening window this returns immediately. Each
    /// tick that sees the same published values re-derives them, so repeat
    /// runs change nothing.
    pub async fn profit_sweep(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();
        let hour = valuation_hour(self.clock.now());
        if hour < PROFIT_WINDOW_START_HOUR || hour >= PROFIT_WINDOW_END_HOUR {
            debug!("Profit sweep outside the evening window (hour {})", hour);
            return summary;
        }

        let rows = match self.holding_repository.list_with_funds() {
            Ok(rows) => rows,
            Err(error) => {
                error!("Profit sweep could not list holdings: {}", error);
                summary.failed += 1;
                return summary;
            }
        };
        if rows.is_empty() {
            info!("No holdings, skipping the profit sweep");
            return summary;
        }

        let today = valuation_date(self.clock.now());
        for (holding, fund) in rows {
            match self.record_profit(&holding, &fund, today).await {
                Ok(true) => summary.updated += 1,
                Ok(false) => summary.skipped += 1,
                Err(error) => {
                    warn!(
                        "Profit update of fund {} failed: {}",
                        fund.fund_code, error
                    );
                    summary.failed += 1;
                }
            }
        }
        info!(
            "Profit sweep finished: {} updated, {} skipped, {} failed",
            summary.updated, summary.skipped, summary.failed
        );
        summary
    }

    /// Returns `Ok(false)` when the holding was skipped because the day's
    /// numbers are not ready yet.
    async fn record_profit(
        &self,
        holding: &Holding,
        fund: &Fund,
        today: NaiveDate,
    ) -> Result<bool> {
        let detail = self.force_detail(&fund.fund_code).await?;

        if !is_trading_day(&detail.fsrq, today) {
            info!(
                "Fund {} valuation date {:?} is not today, skipping",
                fund.fund_code, detail.fsrq
            );
            return Ok(false);
        }
        if detail.daily_change_rate.is_zero() {
            info!(
                "Fund {} daily change not published yet, skipping",
                fund.fund_code
            );
            return Ok(false);
        }
        let unit_net_value = match detail.unit_net_value.filter(|unit| !unit.is_zero()) {
            Some(unit) => unit,
            None => {
                warn!("Fund {} has no unit net value, skipping", fund.fund_code);
                return Ok(false);
            }
        };

        let current_value = holding.shares * unit_net_value;
        let profit_loss = current_value - holding.cost;
        let profit_loss_rate = if holding.cost > Decimal::ZERO {
            ((profit_loss / holding.cost) * dec!(100)).round_dp(DECIMAL_PRECISION)
        } else {
            Decimal::ZERO
        };

        let update = HoldingProfitUpdate {
            holding_id: holding.id.clone(),
            current_value,
            profit_loss,
            profit_loss_rate,
        };
        let record = NewProfitRecord {
            holding_id: holding.id.clone(),
            fund_code: fund.fund_code.clone(),
            cost: holding.cost,
            shares: holding.shares,
            avg_cost: holding.avg_cost,
            current_value,
            profit_loss,
            profit_loss_rate,
            unit_net_value,
            as_of_date: detail.fsrq.clone(),
            daily_change_rate: detail.daily_change_rate,
        };
        with_retry(&self.write_policy, is_lock_contention, || {
            self.holding_repository
                .apply_profit_update(update.clone(), record.clone())
        })
        .await?;

        info!(
            "Recorded profit for fund {}: value {} -> {}, profit {} -> {} (unit {}, change {}%)",
            fund.fund_code,
            holding
                .current_value
                .unwrap_or(holding.cost)
                .round_dp(DISPLAY_DECIMAL_PRECISION),
            current_value.round_dp(DISPLAY_DECIMAL_PRECISION),
            holding
                .profit_loss
                .unwrap_or_default()
                .round_dp(DISPLAY_DECIMAL_PRECISION),
            profit_loss.round_dp(DISPLAY_DECIMAL_PRECISION),
            unit_net_value,
            detail.daily_change_rate
        );
        Ok(true)
    }
}
