//! Database models for the evening-sweep profit history.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use fundfolio_core::holdings::{HoldingProfitRecord, NewProfitRecord};

use crate::utils::parse_decimal_column;

/// Database model for one profit snapshot
#[derive(
    Queryable,
    Identifiable,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::holding_profit_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct HoldingProfitRecordDB {
    pub id: String,
    pub holding_id: String,
    pub fund_code: String,
    pub cost: String,
    pub shares: String,
    pub avg_cost: String,
    pub current_value: String,
    pub profit_loss: String,
    pub profit_loss_rate: String,
    pub unit_net_value: String,
    pub as_of_date: String,
    pub daily_change_rate: String,
    pub recorded_at: NaiveDateTime,
}

/// Database model for appending a profit snapshot
#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::holding_profit_history)]
#[serde(rename_all = "camelCase")]
pub struct NewProfitRecordDB {
    pub id: Option<String>,
    pub holding_id: String,
    pub fund_code: String,
    pub cost: String,
    pub shares: String,
    pub avg_cost: String,
    pub current_value: String,
    pub profit_loss: String,
    pub profit_loss_rate: String,
    pub unit_net_value: String,
    pub as_of_date: String,
    pub daily_change_rate: String,
    pub recorded_at: NaiveDateTime,
}

impl From<HoldingProfitRecordDB> for HoldingProfitRecord {
    fn from(db: HoldingProfitRecordDB) -> Self {
        Self {
            id: db.id,
            holding_id: db.holding_id,
            fund_code: db.fund_code,
            cost: parse_decimal_column(&db.cost, "cost"),
            shares: parse_decimal_column(&db.shares, "shares"),
            avg_cost: parse_decimal_column(&db.avg_cost, "avg_cost"),
            current_value: parse_decimal_column(&db.current_value, "current_value"),
            profit_loss: parse_decimal_column(&db.profit_loss, "profit_loss"),
            profit_loss_rate: parse_decimal_column(&db.profit_loss_rate, "profit_loss_rate"),
            unit_net_value: parse_decimal_column(&db.unit_net_value, "unit_net_value"),
            as_of_date: db.as_of_date,
            daily_change_rate: parse_decimal_column(&db.daily_change_rate, "daily_change_rate"),
            recorded_at: db.recorded_at,
        }
    }
}

impl From<NewProfitRecord> for NewProfitRecordDB {
    fn from(domain: NewProfitRecord) -> Self {
        Self {
            id: None,
            holding_id: domain.holding_id,
            fund_code: domain.fund_code,
            cost: domain.cost.to_string(),
            shares: domain.shares.to_string(),
            avg_cost: domain.avg_cost.to_string(),
            current_value: domain.current_value.to_string(),
            profit_loss: domain.profit_loss.to_string(),
            profit_loss_rate: domain.profit_loss_rate.to_string(),
            unit_net_value: domain.unit_net_value.to_string(),
            as_of_date: domain.as_of_date,
            daily_change_rate: domain.daily_change_rate.to_string(),
            recorded_at: Utc::now().naive_utc(),
        }
    }
}
