//! Database models for funds.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use fundfolio_core::funds::{Fund, NewFund};

/// Database model for fund identity records
#[derive(
    Queryable,
    Identifiable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::funds)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct FundDB {
    pub id: String,
    pub fund_code: String,
    pub fund_name: String,
    pub fund_type: String,
    pub created_at: NaiveDateTime,
}

/// Database model for registering a new fund
#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::funds)]
#[serde(rename_all = "camelCase")]
pub struct NewFundDB {
    pub id: Option<String>,
    pub fund_code: String,
    pub fund_name: String,
    pub fund_type: String,
    pub created_at: NaiveDateTime,
}

impl From<FundDB> for Fund {
    fn from(db: FundDB) -> Self {
        Self {
            id: db.id,
            fund_code: db.fund_code,
            fund_name: db.fund_name,
            fund_type: db.fund_type,
            created_at: db.created_at,
        }
    }
}

impl From<NewFund> for NewFundDB {
    fn from(domain: NewFund) -> Self {
        Self {
            id: None,
            fund_code: domain.fund_code,
            fund_name: domain.fund_name,
            fund_type: domain.fund_type,
            created_at: Utc::now().naive_utc(),
        }
    }
}
