use std::sync::Arc;

use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use uuid::Uuid;

use fundfolio_core::holdings::{
    HoldingProfitRecord, NewProfitRecord, ProfitHistoryRepositoryTrait,
};
use fundfolio_core::Result;

use super::model::{HoldingProfitRecordDB, NewProfitRecordDB};
use crate::db::get_connection;
use crate::errors::IntoCore;
use crate::schema::holding_profit_history;
use crate::schema::holding_profit_history::dsl::*;

pub struct ProfitHistoryRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl ProfitHistoryRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        ProfitHistoryRepository { pool }
    }
}

/// Appends a profit snapshot on an existing connection. The holding
/// repository calls this inside `apply_profit_update` so the snapshot and
/// the holding write commit or roll back together.
pub(crate) fn append_profit_record(
    conn: &mut SqliteConnection,
    record: NewProfitRecord,
) -> QueryResult<usize> {
    let mut row: NewProfitRecordDB = record.into();
    row.id = Some(Uuid::new_v4().to_string());
    diesel::insert_into(holding_profit_history::table)
        .values(&row)
        .execute(conn)
}

impl ProfitHistoryRepositoryTrait for ProfitHistoryRepository {
    fn list_for_holding(
        &self,
        target_holding_id: &str,
        limit: i64,
    ) -> Result<Vec<HoldingProfitRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = holding_profit_history
            .filter(holding_id.eq(target_holding_id))
            .order(recorded_at.desc())
            .limit(limit)
            .load::<HoldingProfitRecordDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(HoldingProfitRecord::from).collect())
    }
}
