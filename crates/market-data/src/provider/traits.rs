//! Fund data provider trait definition.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::MarketDataError;
use crate::model::{FundHistory, FundReturns, FundSearchHit, HistoryDepth, NavRecord, ValuationQuote};

/// A source of fund valuation, return and history data.
///
/// Implementations must never panic past their boundary and must bound every
/// outbound call with a short timeout. The two "infallible" methods encode
/// the degradation contract directly in their signatures: a failed fetch is
/// an empty-default value, not an error the caller has to branch on.
#[async_trait]
pub trait FundDataProvider: Send + Sync {
    /// Stable identifier for logging.
    fn id(&self) -> &'static str;

    /// Fetch the intraday valuation estimate for a fund.
    ///
    /// `Ok(None)` means the provider answered but had no parseable payload
    /// for this code (delisted funds, money-market funds without estimates).
    /// `Err` is reserved for transport failures; callers treat both the
    /// same way.
    async fn fetch_valuation(
        &self,
        fund_code: &str,
    ) -> Result<Option<ValuationQuote>, MarketDataError>;

    /// Fetch trailing returns. Failures collapse to [`FundReturns::empty`].
    async fn fetch_returns(&self, fund_code: &str) -> FundReturns;

    /// Fetch returns plus (depending on `depth`) the historical NAV series.
    /// Failures collapse to [`FundHistory::empty`].
    async fn fetch_history(&self, fund_code: &str, depth: HistoryDepth) -> FundHistory;

    /// Look up the published NAV for an exact date, if the history series
    /// contains it.
    async fn fetch_history_on(&self, fund_code: &str, date: NaiveDate) -> Option<NavRecord> {
        self.fetch_history(fund_code, HistoryDepth::Full)
            .await
            .net_values
            .into_iter()
            .find(|record| record.date == date)
    }

    /// Search funds by code or name keyword.
    async fn search(&self, keyword: &str) -> Result<Vec<FundSearchHit>, MarketDataError>;
}
