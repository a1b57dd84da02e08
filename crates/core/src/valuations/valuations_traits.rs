use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use super::valuations_model::{
    DetailOptions, NormalizedValuation, SnapshotUpdate, ValuationSnapshot,
};
use crate::errors::Result;

/// Storage access for the per-fund valuation snapshot.
pub trait ValuationRepositoryTrait: Send + Sync {
    fn find_by_fund_id(&self, fund_id: &str) -> Result<Option<ValuationSnapshot>>;
    fn find_for_funds(&self, fund_ids: &[String]) -> Result<Vec<ValuationSnapshot>>;
    /// Field-masked upsert keyed by fund id; returns the merged row.
    fn upsert(&self, update: SnapshotUpdate, refreshed_at: NaiveDateTime)
        -> Result<ValuationSnapshot>;
}

#[async_trait]
pub trait ValuationServiceTrait: Send + Sync {
    /// The full read path: cached-or-refreshed valuation, optionally with
    /// the historical NAV series.
    async fn get_detail(
        &self,
        fund_code: &str,
        options: DetailOptions,
    ) -> Result<NormalizedValuation>;

    /// Lightweight read path: quote + trailing returns only.
    async fn get_quote(&self, fund_code: &str, force_refresh: bool)
        -> Result<NormalizedValuation>;

    /// Batch read path over the bounded fetch orchestrator. Unknown codes
    /// are absent from the result; per-code upstream failure degrades to
    /// the stale or empty shape.
    async fn get_quotes(
        &self,
        fund_codes: &HashSet<String>,
        force_refresh: bool,
    ) -> Result<HashMap<String, NormalizedValuation>>;

    /// Resolves the unit price for a trade: exact-date historical NAV,
    /// then latest unit value, then intraday estimate, then a logged 1.0.
    async fn resolve_trade_price(
        &self,
        fund_code: &str,
        trade_date: Option<NaiveDate>,
    ) -> Result<Decimal>;
}
