use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// One position: a fund held through one platform.
///
/// `cost`, `shares` and `avg_cost` are the ledger truth maintained by the
/// buy/sell/sync operations. The `current_value`/`profit_loss` trio is the
/// last persisted valuation of that ledger, written by the evening
/// reconciliation sweep or an explicit override; the list view recomputes a
/// display-time value on top of it and does not persist the result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub fund_id: String,
    pub platform: String,
    pub cost: Decimal,
    pub shares: Decimal,
    pub avg_cost: Decimal,
    pub current_value: Option<Decimal>,
    pub profit_loss: Option<Decimal>,
    pub profit_loss_rate: Option<Decimal>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Full column set written when creating or replacing a position.
///
/// `id` is `None` on insert; the storage layer mints one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingWrite {
    pub id: Option<String>,
    pub fund_id: String,
    pub platform: String,
    pub cost: Decimal,
    pub shares: Decimal,
    pub avg_cost: Decimal,
    pub current_value: Option<Decimal>,
    pub profit_loss: Option<Decimal>,
    pub profit_loss_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Buy,
    Sell,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Buy => "buy",
            TransactionKind::Sell => "sell",
        }
    }
}

impl From<TransactionKind> for String {
    fn from(kind: TransactionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl From<&str> for TransactionKind {
    fn from(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "sell" => TransactionKind::Sell,
            _ => TransactionKind::Buy,
        }
    }
}

/// Append-only record of one buy or sell. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub fund_id: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub shares: Decimal,
    pub price: Decimal,
    /// Effective date of the trade: user-supplied, or the wall clock at
    /// recording time when none was given.
    pub transaction_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub fund_id: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub shares: Decimal,
    pub price: Decimal,
    pub transaction_date: NaiveDateTime,
}

/// Append-only snapshot of a holding's derived state plus the valuation
/// inputs that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingProfitRecord {
    pub id: String,
    pub holding_id: String,
    pub fund_code: String,
    pub cost: Decimal,
    pub shares: Decimal,
    pub avg_cost: Decimal,
    pub current_value: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_rate: Decimal,
    pub unit_net_value: Decimal,
    /// Valuation date the unit value applies to, `YYYY-MM-DD`.
    pub as_of_date: String,
    pub daily_change_rate: Decimal,
    pub recorded_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewProfitRecord {
    pub holding_id: String,
    pub fund_code: String,
    pub cost: Decimal,
    pub shares: Decimal,
    pub avg_cost: Decimal,
    pub current_value: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_rate: Decimal,
    pub unit_net_value: Decimal,
    pub as_of_date: String,
    pub daily_change_rate: Decimal,
}

/// Valuation fields the evening sweep writes back onto a holding, committed
/// atomically with the matching [`NewProfitRecord`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingProfitUpdate {
    pub holding_id: String,
    pub current_value: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuyRequest {
    pub fund_code: String,
    pub amount: Decimal,
    pub trade_date: Option<NaiveDate>,
    pub platform: Option<String>,
    pub tags: Option<String>,
}

impl BuyRequest {
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(
                "Buy amount must be greater than zero".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SellRequest {
    pub fund_code: String,
    pub shares: Decimal,
    pub trade_date: Option<NaiveDate>,
    pub platform: Option<String>,
}

impl SellRequest {
    pub fn validate(&self) -> Result<()> {
        if self.shares <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(
                "Sell shares must be greater than zero".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

/// Manual override: the user declares what the position is worth and what
/// it has earned; cost and shares are back-derived from the latest NAV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub fund_code: String,
    pub current_value: Decimal,
    pub profit: Decimal,
    pub platform: Option<String>,
    pub tags: Option<String>,
}

impl SyncRequest {
    pub fn validate(&self) -> Result<()> {
        if self.current_value <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(
                "Current value must be greater than zero".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

/// Same back-derivation as [`SyncRequest`], but requires the position to
/// already exist for the (fund, platform) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingUpdateRequest {
    pub current_value: Decimal,
    pub profit: Decimal,
    pub platform: Option<String>,
}

impl HoldingUpdateRequest {
    pub fn validate(&self) -> Result<()> {
        if self.current_value <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(
                "Current value must be greater than zero".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

/// One row of the holdings list: the persisted ledger plus a display-time
/// valuation projected from the cached quote. Nothing here is written back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingView {
    pub fund_code: String,
    pub fund_name: String,
    pub platform: String,
    pub cost: Decimal,
    pub shares: Decimal,
    pub avg_cost: Decimal,
    pub current_value: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_rate: Decimal,
    /// Intraday estimated change, percent, as a string; `"-"` when the
    /// upstream published none.
    pub estimate_change_rate: String,
    pub estimate_profit: Decimal,
    pub daily_change_rate: Decimal,
    /// Valuation date (`fsrq`) of the quote the projection used, empty when
    /// no quote was available.
    pub fsrq: String,
    pub one_month_rate: Decimal,
    pub three_month_rate: Decimal,
    pub one_year_rate: Decimal,
    /// Comma-separated watchlist tags, empty when the fund carries none.
    pub tags: String,
}
