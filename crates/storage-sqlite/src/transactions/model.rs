//! Database models for the append-only trade log.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use fundfolio_core::holdings::{NewTransaction, Transaction, TransactionKind};

use crate::utils::parse_decimal_column;

/// Database model for one recorded buy or sell
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
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct TransactionDB {
    pub id: String,
    pub fund_id: String,
    pub kind: String,
    pub amount: String,
    pub shares: String,
    pub price: String,
    pub transaction_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

/// Database model for appending a trade
#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionDB {
    pub id: Option<String>,
    pub fund_id: String,
    pub kind: String,
    pub amount: String,
    pub shares: String,
    pub price: String,
    pub transaction_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl From<TransactionDB> for Transaction {
    fn from(db: TransactionDB) -> Self {
        Self {
            id: db.id,
            fund_id: db.fund_id,
            kind: TransactionKind::from(db.kind.as_str()),
            amount: parse_decimal_column(&db.amount, "amount"),
            shares: parse_decimal_column(&db.shares, "shares"),
            price: parse_decimal_column(&db.price, "price"),
            transaction_date: db.transaction_date,
            created_at: db.created_at,
        }
    }
}

impl From<NewTransaction> for NewTransactionDB {
    fn from(domain: NewTransaction) -> Self {
        Self {
            id: None,
            fund_id: domain.fund_id,
            kind: domain.kind.as_str().to_string(),
            amount: domain.amount.to_string(),
            shares: domain.shares.to_string(),
            price: domain.price.to_string(),
            transaction_date: domain.transaction_date,
            created_at: Utc::now().naive_utc(),
        }
    }
}
