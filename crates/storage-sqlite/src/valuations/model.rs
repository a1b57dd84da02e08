//! Database models for valuation snapshots.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use fundfolio_core::utils::time_utils;
use fundfolio_core::valuations::ValuationSnapshot;

use crate::utils::{parse_decimal_column, parse_optional_decimal_column};

/// Database model for the per-fund valuation snapshot.
///
/// The historical NAV series is stored as a JSON array in the `net_values`
/// column; dates are stored in the upstream `YYYY-MM-DD` text form.
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
#[diesel(table_name = crate::schema::valuation_snapshots)]
#[diesel(primary_key(fund_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ValuationSnapshotDB {
    pub fund_id: String,
    pub net_value_date: Option<String>,
    pub unit_net_value: Option<String>,
    pub estimate_net_value: Option<String>,
    pub estimate_change_rate: Option<String>,
    pub estimate_time: Option<String>,
    pub one_month_rate: String,
    pub three_month_rate: String,
    pub one_year_rate: String,
    pub daily_change_rate: String,
    pub as_of_date: Option<String>,
    pub net_values: String,
    pub updated_at: NaiveDateTime,
}

impl From<ValuationSnapshotDB> for ValuationSnapshot {
    fn from(db: ValuationSnapshotDB) -> Self {
        let net_values = serde_json::from_str(&db.net_values).unwrap_or_else(|e| {
            log::error!(
                "Failed to parse net_values for fund {}: {}",
                db.fund_id,
                e
            );
            Vec::new()
        });

        Self {
            net_value_date: db.net_value_date.as_deref().and_then(time_utils::parse_date),
            unit_net_value: parse_optional_decimal_column(
                db.unit_net_value.as_deref(),
                "unit_net_value",
            ),
            estimate_net_value: parse_optional_decimal_column(
                db.estimate_net_value.as_deref(),
                "estimate_net_value",
            ),
            estimate_change_rate: parse_optional_decimal_column(
                db.estimate_change_rate.as_deref(),
                "estimate_change_rate",
            ),
            estimate_time: db.estimate_time,
            one_month_rate: parse_decimal_column(&db.one_month_rate, "one_month_rate"),
            three_month_rate: parse_decimal_column(&db.three_month_rate, "three_month_rate"),
            one_year_rate: parse_decimal_column(&db.one_year_rate, "one_year_rate"),
            daily_change_rate: parse_decimal_column(&db.daily_change_rate, "daily_change_rate"),
            as_of_date: db.as_of_date.as_deref().and_then(time_utils::parse_date),
            net_values,
            updated_at: db.updated_at,
            fund_id: db.fund_id,
        }
    }
}

impl From<&ValuationSnapshot> for ValuationSnapshotDB {
    fn from(domain: &ValuationSnapshot) -> Self {
        Self {
            fund_id: domain.fund_id.clone(),
            net_value_date: domain.net_value_date.map(time_utils::format_date),
            unit_net_value: domain.unit_net_value.map(|d| d.to_string()),
            estimate_net_value: domain.estimate_net_value.map(|d| d.to_string()),
            estimate_change_rate: domain.estimate_change_rate.map(|d| d.to_string()),
            estimate_time: domain.estimate_time.clone(),
            one_month_rate: domain.one_month_rate.to_string(),
            three_month_rate: domain.three_month_rate.to_string(),
            one_year_rate: domain.one_year_rate.to_string(),
            daily_change_rate: domain.daily_change_rate.to_string(),
            as_of_date: domain.as_of_date.map(time_utils::format_date),
            net_values: serde_json::to_string(&domain.net_values)
                .unwrap_or_else(|_| "[]".to_string()),
            updated_at: domain.updated_at,
        }
    }
}
