use std::sync::Arc;

use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::result::Error as DieselError;
use diesel::SqliteConnection;
use uuid::Uuid;

use fundfolio_core::funds::Fund;
use fundfolio_core::holdings::{
    Holding, HoldingProfitUpdate, HoldingRepositoryTrait, HoldingWrite, NewProfitRecord,
    NewTransaction,
};
use fundfolio_core::Result;

use super::model::HoldingDB;
use crate::db::get_connection;
use crate::errors::IntoCore;
use crate::funds::FundDB;
use crate::profit_history::append_profit_record;
use crate::schema::{funds, holdings};
use crate::schema::holdings::dsl::*;
use crate::transactions::append_transaction;

pub struct HoldingRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl HoldingRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        HoldingRepository { pool }
    }
}

/// Inserts or replaces a position on an existing connection.
///
/// A write carrying an id replaces that row's ledger columns; a write
/// without one is a fresh position and gets a minted id. The replace path
/// re-reads the row so callers always get the stored state back.
fn write_position(conn: &mut SqliteConnection, write: &HoldingWrite) -> QueryResult<HoldingDB> {
    let now = Utc::now().naive_utc();

    match &write.id {
        Some(existing_id) => {
            diesel::update(holdings.find(existing_id))
                .set((
                    platform.eq(&write.platform),
                    cost.eq(write.cost.to_string()),
                    shares.eq(write.shares.to_string()),
                    avg_cost.eq(write.avg_cost.to_string()),
                    current_value.eq(write.current_value.map(|d| d.to_string())),
                    profit_loss.eq(write.profit_loss.map(|d| d.to_string())),
                    profit_loss_rate.eq(write.profit_loss_rate.map(|d| d.to_string())),
                    updated_at.eq(now),
                ))
                .execute(conn)?;
            holdings.find(existing_id).first::<HoldingDB>(conn)
        }
        None => {
            let row = HoldingDB::from_write(write, Uuid::new_v4().to_string(), now);
            diesel::insert_into(holdings::table)
                .values(&row)
                .returning(HoldingDB::as_returning())
                .get_result(conn)
        }
    }
}

impl HoldingRepositoryTrait for HoldingRepository {
    fn find_for_platform(&self, target_fund_id: &str, platform_name: &str) -> Result<Option<Holding>> {
        let mut conn = get_connection(&self.pool)?;
        let row = holdings
            .filter(fund_id.eq(target_fund_id))
            .filter(platform.eq(platform_name))
            .first::<HoldingDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(Holding::from))
    }

    fn find_first_for_fund(&self, target_fund_id: &str) -> Result<Option<Holding>> {
        let mut conn = get_connection(&self.pool)?;
        let row = holdings
            .filter(fund_id.eq(target_fund_id))
            .order((created_at.asc(), id.asc()))
            .first::<HoldingDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(Holding::from))
    }

    fn list(&self) -> Result<Vec<Holding>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = holdings
            .order((created_at.asc(), id.asc()))
            .load::<HoldingDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Holding::from).collect())
    }

    fn list_with_funds(&self) -> Result<Vec<(Holding, Fund)>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = holdings::table
            .inner_join(funds::table)
            .select((HoldingDB::as_select(), FundDB::as_select()))
            .order((holdings::created_at.asc(), holdings::id.asc()))
            .load::<(HoldingDB, FundDB)>(&mut conn)
            .into_core()?;
        Ok(rows
            .into_iter()
            .map(|(holding, fund)| (Holding::from(holding), Fund::from(fund)))
            .collect())
    }

    fn count_for_platform_name(&self, platform_name: &str) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        holdings
            .filter(platform.eq(platform_name))
            .count()
            .get_result(&mut conn)
            .into_core()
    }

    fn upsert_position(&self, write: HoldingWrite) -> Result<Holding> {
        let mut conn = get_connection(&self.pool)?;
        write_position(&mut conn, &write)
            .map(Holding::from)
            .into_core()
    }

    fn upsert_with_transaction(
        &self,
        write: HoldingWrite,
        transaction: NewTransaction,
    ) -> Result<Holding> {
        let mut conn = get_connection(&self.pool)?;
        conn.transaction::<HoldingDB, DieselError, _>(|conn| {
            let row = write_position(conn, &write)?;
            append_transaction(conn, transaction)?;
            Ok(row)
        })
        .map(Holding::from)
        .into_core()
    }

    fn close_with_transaction(
        &self,
        holding_id: &str,
        transaction: NewTransaction,
    ) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        conn.transaction::<usize, DieselError, _>(|conn| {
            let removed = diesel::delete(holdings.find(holding_id)).execute(conn)?;
            append_transaction(conn, transaction)?;
            Ok(removed)
        })
        .into_core()
    }

    fn delete(&self, holding_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        diesel::delete(holdings.find(holding_id))
            .execute(&mut conn)
            .into_core()
    }

    fn delete_for_fund(&self, target_fund_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        diesel::delete(holdings.filter(fund_id.eq(target_fund_id)))
            .execute(&mut conn)
            .into_core()
    }

    fn apply_profit_update(
        &self,
        update: HoldingProfitUpdate,
        record: NewProfitRecord,
    ) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        conn.transaction::<(), DieselError, _>(|conn| {
            append_profit_record(conn, record)?;

            let affected = diesel::update(holdings.find(&update.holding_id))
                .set((
                    current_value.eq(Some(update.current_value.to_string())),
                    profit_loss.eq(Some(update.profit_loss.to_string())),
                    profit_loss_rate.eq(Some(update.profit_loss_rate.to_string())),
                    updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;
            if affected == 0 {
                // Holding vanished mid-sweep; roll the pair back.
                return Err(DieselError::NotFound);
            }
            Ok(())
        })
        .into_core()
    }
}
