//! Wire-adjacent models for upstream fund data.
//!
//! These types mirror what the upstream endpoints actually deliver, after
//! lenient parsing. Anything optional upstream stays optional here; the
//! domain layer decides how to degrade when a field is missing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Intraday valuation estimate for a fund.
///
/// Carries the last published NAV (`unit_net_value` as of `net_value_date`)
/// together with the live intraday estimate. Every numeric field is optional
/// because the upstream feed omits them freely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValuationQuote {
    pub fund_code: String,
    pub fund_name: String,
    /// Date the published NAV applies to, `YYYY-MM-DD`.
    pub net_value_date: Option<String>,
    pub unit_net_value: Option<Decimal>,
    pub estimate_net_value: Option<Decimal>,
    /// Estimated intraday change, percent.
    pub estimate_change_rate: Option<Decimal>,
    /// Upstream timestamp of the estimate, e.g. `2024-03-08 14:59`.
    pub estimate_time: Option<String>,
}

/// Trailing percentage returns for a fund.
///
/// Never absent by contract: fetch failures yield [`FundReturns::empty`]
/// so batch callers always have a value per requested code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundReturns {
    pub fund_code: String,
    pub one_month_rate: Decimal,
    pub three_month_rate: Decimal,
    pub one_year_rate: Decimal,
    /// Change on the most recent valuation date, percent.
    pub daily_change_rate: Decimal,
    /// Valuation date the returns were computed against (`fsrq`), empty when
    /// upstream did not publish one.
    pub as_of_date: String,
}

impl FundReturns {
    /// All-zero sentinel used when the upstream call failed or timed out.
    pub fn empty(fund_code: &str) -> Self {
        Self {
            fund_code: fund_code.to_string(),
            one_month_rate: Decimal::ZERO,
            three_month_rate: Decimal::ZERO,
            one_year_rate: Decimal::ZERO,
            daily_change_rate: Decimal::ZERO,
            as_of_date: String::new(),
        }
    }

    /// True when this is the failure sentinel rather than published data.
    pub fn is_empty(&self) -> bool {
        self.as_of_date.is_empty()
    }
}

/// One historical NAV observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavRecord {
    pub date: NaiveDate,
    pub unit_net_value: Decimal,
    pub cumulative_net_value: Option<Decimal>,
    /// Day-over-day change, percent. Empty upstream on ex-dividend rows.
    pub change_rate: Option<Decimal>,
}

/// Result of a history fetch: trailing returns plus (optionally) the full
/// NAV series.
#[derive(Debug, Clone, PartialEq)]
pub struct FundHistory {
    pub returns: FundReturns,
    /// Published unit NAV recovered from the lightweight endpoint, used when
    /// no intraday quote was available.
    pub unit_net_value: Option<Decimal>,
    pub net_values: Vec<NavRecord>,
}

impl FundHistory {
    /// Empty-default shape returned when the upstream call failed.
    pub fn empty(fund_code: &str) -> Self {
        Self {
            returns: FundReturns::empty(fund_code),
            unit_net_value: None,
            net_values: Vec::new(),
        }
    }

    /// True when this is the failure sentinel rather than published data.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty() && self.unit_net_value.is_none() && self.net_values.is_empty()
    }
}

/// How much history a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDepth {
    /// Trailing returns and the latest published NAV only.
    ReturnsOnly,
    /// Returns plus the paged NAV series (capped, newest first).
    Full,
}

/// One fund search result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundSearchHit {
    pub fund_code: String,
    pub fund_name: String,
    pub fund_type: String,
}

/// Lenient decimal parsing for upstream string fields.
///
/// Upstream mixes numbers, numeric strings, empty strings and `"-"`
/// placeholders in the same positions; anything unparseable is `None`.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }
    trimmed.parse::<Decimal>().ok()
}

/// Pulls a decimal out of a loosely typed JSON value (number or string).
pub fn decimal_from_value(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(s) => parse_decimal(s),
        serde_json::Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        _ => None,
    }
}
