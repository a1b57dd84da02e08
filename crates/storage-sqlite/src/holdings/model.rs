//! Database models for holdings.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use fundfolio_core::holdings::{Holding, HoldingWrite};

use crate::utils::{parse_decimal_column, parse_optional_decimal_column};

/// Database model for one position
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::holdings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct HoldingDB {
    pub id: String,
    pub fund_id: String,
    pub platform: String,
    pub cost: String,
    pub shares: String,
    pub avg_cost: String,
    pub current_value: Option<String>,
    pub profit_loss: Option<String>,
    pub profit_loss_rate: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl HoldingDB {
    /// Materializes a ledger write as a full insert row.
    pub(crate) fn from_write(write: &HoldingWrite, row_id: String, now: NaiveDateTime) -> Self {
        Self {
            id: row_id,
            fund_id: write.fund_id.clone(),
            platform: write.platform.clone(),
            cost: write.cost.to_string(),
            shares: write.shares.to_string(),
            avg_cost: write.avg_cost.to_string(),
            current_value: write.current_value.map(|d| d.to_string()),
            profit_loss: write.profit_loss.map(|d| d.to_string()),
            profit_loss_rate: write.profit_loss_rate.map(|d| d.to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<HoldingDB> for Holding {
    fn from(db: HoldingDB) -> Self {
        Self {
            id: db.id,
            fund_id: db.fund_id,
            platform: db.platform,
            cost: parse_decimal_column(&db.cost, "cost"),
            shares: parse_decimal_column(&db.shares, "shares"),
            avg_cost: parse_decimal_column(&db.avg_cost, "avg_cost"),
            current_value: parse_optional_decimal_column(
                db.current_value.as_deref(),
                "current_value",
            ),
            profit_loss: parse_optional_decimal_column(db.profit_loss.as_deref(), "profit_loss"),
            profit_loss_rate: parse_optional_decimal_column(
                db.profit_loss_rate.as_deref(),
                "profit_loss_rate",
            ),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
