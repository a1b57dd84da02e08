//! Database models for the watchlist.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use fundfolio_core::watchlist::WatchlistEntry;

/// Database model for one watched fund
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
#[diesel(table_name = crate::schema::watchlist)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntryDB {
    pub id: String,
    pub fund_id: String,
    pub tags: String,
    pub created_at: NaiveDateTime,
}

/// Database model for adding a fund to the watchlist
#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::watchlist)]
#[serde(rename_all = "camelCase")]
pub struct NewWatchlistEntryDB {
    pub id: Option<String>,
    pub fund_id: String,
    pub tags: String,
    pub created_at: NaiveDateTime,
}

impl NewWatchlistEntryDB {
    pub(crate) fn new(fund_id: &str, tags: &str) -> Self {
        Self {
            id: None,
            fund_id: fund_id.to_string(),
            tags: tags.to_string(),
            created_at: Utc::now().naive_utc(),
        }
    }
}

impl From<WatchlistEntryDB> for WatchlistEntry {
    fn from(db: WatchlistEntryDB) -> Self {
        Self {
            id: db.id,
            fund_id: db.fund_id,
            tags: db.tags,
            created_at: db.created_at,
        }
    }
}
