use chrono::{Duration, NaiveDate, NaiveDateTime};
use fundfolio_market_data::{FundHistory, FundReturns, NavRecord, ValuationQuote};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::time_utils;

/// Persisted last-known valuation state for one fund. At most one row per
/// fund; refreshed in place with upsert semantics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValuationSnapshot {
    pub fund_id: String,
    /// Date of the published NAV the quote refers to.
    pub net_value_date: Option<NaiveDate>,
    pub unit_net_value: Option<Decimal>,
    pub estimate_net_value: Option<Decimal>,
    pub estimate_change_rate: Option<Decimal>,
    pub estimate_time: Option<String>,
    pub one_month_rate: Decimal,
    pub three_month_rate: Decimal,
    pub one_year_rate: Decimal,
    pub daily_change_rate: Decimal,
    /// Valuation date (fsrq) the trailing returns were computed against.
    pub as_of_date: Option<NaiveDate>,
    pub net_values: Vec<NavRecord>,
    pub updated_at: NaiveDateTime,
}

impl ValuationSnapshot {
    pub fn empty(fund_id: &str, updated_at: NaiveDateTime) -> Self {
        ValuationSnapshot {
            fund_id: fund_id.to_string(),
            net_value_date: None,
            unit_net_value: None,
            estimate_net_value: None,
            estimate_change_rate: None,
            estimate_time: None,
            one_month_rate: Decimal::ZERO,
            three_month_rate: Decimal::ZERO,
            one_year_rate: Decimal::ZERO,
            daily_change_rate: Decimal::ZERO,
            as_of_date: None,
            net_values: Vec::new(),
            updated_at,
        }
    }

    pub fn is_fresh(&self, now: NaiveDateTime, ttl: Duration) -> bool {
        now.signed_duration_since(self.updated_at) <= ttl
    }
}

/// Freshness classification of a cached snapshot against the TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStaleness {
    Fresh,
    Stale,
    Missing,
}

impl SnapshotStaleness {
    pub fn classify(
        snapshot: Option<&ValuationSnapshot>,
        now: NaiveDateTime,
        ttl: Duration,
    ) -> Self {
        match snapshot {
            Some(snapshot) if snapshot.is_fresh(now, ttl) => SnapshotStaleness::Fresh,
            Some(_) => SnapshotStaleness::Stale,
            None => SnapshotStaleness::Missing,
        }
    }
}

/// Field-masked write merged into the stored snapshot.
///
/// `None` leaves the stored value untouched, so a lightweight refresh never
/// clobbers what a full refresh recorded (history blob, trailing rates).
/// The estimate fields are double-optional: a refresh that reached upstream
/// but got no intraday quote clears them, because a morning estimate must
/// not outlive the day's published NAV.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotUpdate {
    pub fund_id: String,
    pub net_value_date: Option<NaiveDate>,
    pub unit_net_value: Option<Decimal>,
    pub estimate_net_value: Option<Option<Decimal>>,
    pub estimate_change_rate: Option<Option<Decimal>>,
    pub estimate_time: Option<String>,
    pub one_month_rate: Option<Decimal>,
    pub three_month_rate: Option<Decimal>,
    pub one_year_rate: Option<Decimal>,
    pub daily_change_rate: Option<Decimal>,
    pub as_of_date: Option<NaiveDate>,
    pub net_values: Option<Vec<NavRecord>>,
}

impl SnapshotUpdate {
    /// Lightweight refresh payload: quote + trailing returns, history
    /// untouched.
    pub fn from_quote_and_returns(
        fund_id: &str,
        quote: Option<&ValuationQuote>,
        returns: &FundReturns,
    ) -> Self {
        let quoted_date = quote
            .and_then(|q| q.net_value_date.as_deref())
            .and_then(time_utils::parse_date);

        SnapshotUpdate {
            fund_id: fund_id.to_string(),
            net_value_date: quoted_date.or_else(|| time_utils::parse_date(&returns.as_of_date)),
            unit_net_value: quote.and_then(|q| q.unit_net_value),
            estimate_net_value: Some(quote.and_then(|q| q.estimate_net_value)),
            estimate_change_rate: Some(quote.and_then(|q| q.estimate_change_rate)),
            estimate_time: Some(
                quote
                    .and_then(|q| q.estimate_time.clone())
                    .unwrap_or_default(),
            ),
            one_month_rate: Some(returns.one_month_rate),
            three_month_rate: Some(returns.three_month_rate),
            one_year_rate: Some(returns.one_year_rate),
            daily_change_rate: Some(returns.daily_change_rate),
            as_of_date: time_utils::parse_date(&returns.as_of_date),
            net_values: None,
        }
    }

    /// Detail refresh payload. The unit value falls back to what the history
    /// endpoint reported when no quote was available; the NAV series is only
    /// written when it was actually fetched.
    pub fn from_quote_and_history(
        fund_id: &str,
        quote: Option<&ValuationQuote>,
        history: &FundHistory,
        include_series: bool,
    ) -> Self {
        let mut update = Self::from_quote_and_returns(fund_id, quote, &history.returns);

        if update.unit_net_value.is_none() {
            update.unit_net_value = history.unit_net_value;
        }
        if history.returns.is_empty() {
            // Only the quote came back; leave stored returns alone.
            update.one_month_rate = None;
            update.three_month_rate = None;
            update.one_year_rate = None;
            update.daily_change_rate = None;
        }
        if include_series {
            update.net_values = Some(history.net_values.clone());
        }

        update
    }

    /// Pure merge of this update over an existing row, mirroring what the
    /// storage upsert does. Used for the write-skipping read path and for
    /// deriving the post-write state without a second query.
    pub fn apply_to(
        &self,
        existing: Option<&ValuationSnapshot>,
        refreshed_at: NaiveDateTime,
    ) -> ValuationSnapshot {
        let mut snapshot = existing
            .cloned()
            .unwrap_or_else(|| ValuationSnapshot::empty(&self.fund_id, refreshed_at));

        if let Some(date) = self.net_value_date {
            snapshot.net_value_date = Some(date);
        }
        if let Some(unit) = self.unit_net_value {
            snapshot.unit_net_value = Some(unit);
        }
        if let Some(estimate) = self.estimate_net_value {
            snapshot.estimate_net_value = estimate;
        }
        if let Some(rate) = self.estimate_change_rate {
            snapshot.estimate_change_rate = rate;
        }
        if let Some(time) = &self.estimate_time {
            snapshot.estimate_time = Some(time.clone());
        }
        if let Some(rate) = self.one_month_rate {
            snapshot.one_month_rate = rate;
        }
        if let Some(rate) = self.three_month_rate {
            snapshot.three_month_rate = rate;
        }
        if let Some(rate) = self.one_year_rate {
            snapshot.one_year_rate = rate;
        }
        if let Some(rate) = self.daily_change_rate {
            snapshot.daily_change_rate = rate;
        }
        if let Some(date) = self.as_of_date {
            snapshot.as_of_date = Some(date);
        }
        if let Some(values) = &self.net_values {
            snapshot.net_values = values.clone();
        }
        snapshot.updated_at = refreshed_at;

        snapshot
    }
}

/// Options for the detail read path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailOptions {
    pub force_refresh: bool,
    pub need_history: bool,
    pub skip_store_write: bool,
}

/// The one public valuation shape. Every read branch (fresh hit, refresh,
/// stale fallback, unknown-but-registered fund) produces exactly this;
/// callers must not depend on anything beyond it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedValuation {
    pub fund_code: String,
    pub fund_name: String,
    /// Date of the published NAV, `""` when unknown.
    pub net_value: String,
    pub unit_net_value: Option<Decimal>,
    pub estimate_net_value: Option<Decimal>,
    /// Stringified percentage, `"-"` when no estimate exists.
    pub estimate_change_rate: String,
    pub estimate_time: String,
    pub one_month_rate: Decimal,
    pub three_month_rate: Decimal,
    pub one_year_rate: Decimal,
    pub daily_change_rate: Decimal,
    /// Valuation date the returns apply to, `""` when unknown.
    pub fsrq: String,
    pub net_values: Vec<NavRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

impl NormalizedValuation {
    pub fn empty(fund_code: &str, fund_name: &str) -> Self {
        NormalizedValuation {
            fund_code: fund_code.to_string(),
            fund_name: fund_name.to_string(),
            net_value: String::new(),
            unit_net_value: None,
            estimate_net_value: None,
            estimate_change_rate: "-".to_string(),
            estimate_time: String::new(),
            one_month_rate: Decimal::ZERO,
            three_month_rate: Decimal::ZERO,
            one_year_rate: Decimal::ZERO,
            daily_change_rate: Decimal::ZERO,
            fsrq: String::new(),
            net_values: Vec::new(),
            tags: None,
        }
    }

    /// The single normalization point for every cache branch. `None` yields
    /// the documented empty default; `include_history` controls whether the
    /// stored NAV series is surfaced or suppressed.
    pub fn from_parts(
        fund_code: &str,
        fund_name: &str,
        snapshot: Option<&ValuationSnapshot>,
        include_history: bool,
    ) -> Self {
        let snapshot = match snapshot {
            Some(snapshot) => snapshot,
            None => return Self::empty(fund_code, fund_name),
        };

        NormalizedValuation {
            fund_code: fund_code.to_string(),
            fund_name: fund_name.to_string(),
            net_value: snapshot
                .net_value_date
                .map(time_utils::format_date)
                .unwrap_or_default(),
            unit_net_value: snapshot.unit_net_value,
            estimate_net_value: snapshot.estimate_net_value,
            estimate_change_rate: snapshot
                .estimate_change_rate
                .map(|rate| rate.to_string())
                .unwrap_or_else(|| "-".to_string()),
            estimate_time: snapshot.estimate_time.clone().unwrap_or_default(),
            one_month_rate: snapshot.one_month_rate,
            three_month_rate: snapshot.three_month_rate,
            one_year_rate: snapshot.one_year_rate,
            daily_change_rate: snapshot.daily_change_rate,
            fsrq: snapshot
                .as_of_date
                .map(time_utils::format_date)
                .unwrap_or_default(),
            net_values: if include_history {
                snapshot.net_values.clone()
            } else {
                Vec::new()
            },
            tags: None,
        }
    }

    pub fn with_tags(mut self, tags: Option<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Trading-day predicate: the valuation date equals today's calendar date in
/// the valuation timezone. Off-trading-day responses reuse yesterday's NAV
/// and must not be treated as a fresh daily return signal.
pub fn is_trading_day(fsrq: &str, today: NaiveDate) -> bool {
    !fsrq.is_empty() && fsrq == time_utils::format_date(today)
}
