use std::sync::Arc;

use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use uuid::Uuid;

use fundfolio_core::funds::Fund;
use fundfolio_core::watchlist::{WatchlistEntry, WatchlistRepositoryTrait};
use fundfolio_core::Result;

use super::model::{NewWatchlistEntryDB, WatchlistEntryDB};
use crate::db::get_connection;
use crate::errors::IntoCore;
use crate::funds::FundDB;
use crate::schema::{funds, watchlist};
use crate::schema::watchlist::dsl::*;

pub struct WatchlistRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl WatchlistRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        WatchlistRepository { pool }
    }
}

impl WatchlistRepositoryTrait for WatchlistRepository {
    fn find_by_fund_id(&self, target_fund_id: &str) -> Result<Option<WatchlistEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let row = watchlist
            .filter(fund_id.eq(target_fund_id))
            .first::<WatchlistEntryDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(WatchlistEntry::from))
    }

    fn list_with_funds(&self) -> Result<Vec<(WatchlistEntry, Fund)>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = watchlist::table
            .inner_join(funds::table)
            .select((WatchlistEntryDB::as_select(), FundDB::as_select()))
            .order((watchlist::created_at.asc(), watchlist::id.asc()))
            .load::<(WatchlistEntryDB, FundDB)>(&mut conn)
            .into_core()?;
        Ok(rows
            .into_iter()
            .map(|(entry, fund)| (WatchlistEntry::from(entry), Fund::from(fund)))
            .collect())
    }

    fn create(&self, target_fund_id: &str, tag_list: &str) -> Result<WatchlistEntry> {
        let mut conn = get_connection(&self.pool)?;

        let mut row = NewWatchlistEntryDB::new(target_fund_id, tag_list);
        row.id = Some(Uuid::new_v4().to_string());

        let entry_db = diesel::insert_into(watchlist::table)
            .values(&row)
            .returning(WatchlistEntryDB::as_returning())
            .get_result(&mut conn)
            .into_core()?;
        Ok(WatchlistEntry::from(entry_db))
    }

    fn update_tags(&self, target_fund_id: &str, tag_list: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        diesel::update(watchlist.filter(fund_id.eq(target_fund_id)))
            .set(tags.eq(tag_list))
            .execute(&mut conn)
            .into_core()
    }

    fn upsert_tags(&self, target_fund_id: &str, tag_list: &str) -> Result<WatchlistEntry> {
        let mut conn = get_connection(&self.pool)?;

        let mut row = NewWatchlistEntryDB::new(target_fund_id, tag_list);
        row.id = Some(Uuid::new_v4().to_string());

        diesel::insert_into(watchlist::table)
            .values(&row)
            .on_conflict(fund_id)
            .do_update()
            .set(tags.eq(tag_list))
            .execute(&mut conn)
            .into_core()?;

        let entry_db = watchlist
            .filter(fund_id.eq(target_fund_id))
            .first::<WatchlistEntryDB>(&mut conn)
            .into_core()?;
        Ok(WatchlistEntry::from(entry_db))
    }

    fn delete_by_fund_id(&self, target_fund_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        diesel::delete(watchlist.filter(fund_id.eq(target_fund_id)))
            .execute(&mut conn)
            .into_core()
    }
}
