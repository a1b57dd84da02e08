use std::sync::Arc;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::result::Error as DieselError;
use diesel::SqliteConnection;

use fundfolio_core::valuations::{SnapshotUpdate, ValuationRepositoryTrait, ValuationSnapshot};
use fundfolio_core::Result;

use super::model::ValuationSnapshotDB;
use crate::db::get_connection;
use crate::errors::IntoCore;
use crate::schema::valuation_snapshots::dsl::*;

pub struct ValuationRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl ValuationRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        ValuationRepository { pool }
    }
}

impl ValuationRepositoryTrait for ValuationRepository {
    fn find_by_fund_id(&self, target: &str) -> Result<Option<ValuationSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let row = valuation_snapshots
            .find(target)
            .first::<ValuationSnapshotDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(ValuationSnapshot::from))
    }

    fn find_for_funds(&self, fund_ids: &[String]) -> Result<Vec<ValuationSnapshot>> {
        if fund_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = get_connection(&self.pool)?;
        let rows = valuation_snapshots
            .filter(fund_id.eq_any(fund_ids))
            .load::<ValuationSnapshotDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(ValuationSnapshot::from).collect())
    }

    fn upsert(
        &self,
        update: SnapshotUpdate,
        refreshed_at: NaiveDateTime,
    ) -> Result<ValuationSnapshot> {
        let mut conn = get_connection(&self.pool)?;

        // Read-merge-write in one transaction so a concurrent refresh of the
        // same fund cannot interleave between the load and the replace.
        conn.transaction::<ValuationSnapshot, DieselError, _>(|conn| {
            let existing = valuation_snapshots
                .find(&update.fund_id)
                .first::<ValuationSnapshotDB>(conn)
                .optional()?
                .map(ValuationSnapshot::from);

            let merged = update.apply_to(existing.as_ref(), refreshed_at);

            let row = ValuationSnapshotDB::from(&merged);
            diesel::replace_into(valuation_snapshots)
                .values(&row)
                .execute(conn)?;

            Ok(merged)
        })
        .into_core()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fundfolio_market_data::NavRecord;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    use crate::db::{create_pool, run_migrations};
    use crate::funds::FundRepository;
    use fundfolio_core::errors::{DatabaseError, Error};
    use fundfolio_core::funds::{Fund, FundRepositoryTrait, NewFund};

    fn open_store() -> (
        tempfile::TempDir,
        Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    ) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        (temp_dir, pool)
    }

    fn register_fund(
        pool: &Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        code: &str,
    ) -> Fund {
        FundRepository::new(Arc::clone(pool))
            .create(NewFund {
                fund_code: code.to_string(),
                fund_name: format!("基金{code}"),
                fund_type: "混合型".to_string(),
            })
            .expect("Failed to register fund")
    }

    fn naive(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    /// Detail refresh: quote, estimates, trailing returns and the NAV series.
    fn full_update(fund: &Fund) -> SnapshotUpdate {
        SnapshotUpdate {
            fund_id: fund.id.clone(),
            net_value_date: NaiveDate::from_ymd_opt(2025, 6, 19),
            unit_net_value: Some(dec!(1.05)),
            estimate_net_value: Some(Some(dec!(1.06))),
            estimate_change_rate: Some(Some(dec!(0.95))),
            estimate_time: Some("2025-06-19 14:58".to_string()),
            one_month_rate: Some(dec!(2.1)),
            three_month_rate: Some(dec!(5.4)),
            one_year_rate: Some(dec!(12.3)),
            daily_change_rate: Some(dec!(0.57)),
            as_of_date: NaiveDate::from_ymd_opt(2025, 6, 19),
            net_values: Some(vec![NavRecord {
                date: NaiveDate::from_ymd_opt(2025, 6, 19).unwrap(),
                unit_net_value: dec!(1.05),
                cumulative_net_value: Some(dec!(2.31)),
                change_rate: Some(dec!(0.57)),
            }]),
        }
    }

    #[test]
    fn test_light_refresh_preserves_history_and_clears_estimates() {
        let (_temp_dir, pool) = open_store();
        let fund = register_fund(&pool, "000001");
        let repo = ValuationRepository::new(Arc::clone(&pool));

        repo.upsert(full_update(&fund), naive(2025, 6, 19, 15))
            .expect("Full refresh failed");

        // Next morning: published NAV but no intraday estimate yet.
        let light = SnapshotUpdate {
            fund_id: fund.id.clone(),
            net_value_date: NaiveDate::from_ymd_opt(2025, 6, 20),
            unit_net_value: Some(dec!(1.07)),
            estimate_net_value: Some(None),
            estimate_change_rate: Some(None),
            estimate_time: Some(String::new()),
            one_month_rate: None,
            three_month_rate: None,
            one_year_rate: None,
            daily_change_rate: Some(dec!(1.9)),
            as_of_date: NaiveDate::from_ymd_opt(2025, 6, 20),
            net_values: None,
        };
        let merged = repo
            .upsert(light, naive(2025, 6, 20, 9))
            .expect("Light refresh failed");

        assert_eq!(merged.unit_net_value, Some(dec!(1.07)));
        assert_eq!(merged.estimate_net_value, None);
        assert_eq!(merged.estimate_change_rate, None);
        assert_eq!(merged.estimate_time, Some(String::new()));
        assert_eq!(merged.one_month_rate, dec!(2.1));
        assert_eq!(merged.daily_change_rate, dec!(1.9));
        assert_eq!(merged.net_values.len(), 1);
        assert_eq!(merged.net_values[0].cumulative_net_value, Some(dec!(2.31)));

        // The returned merge is exactly what the store now holds.
        let stored = repo.find_by_fund_id(&fund.id).expect("Read-back failed");
        assert_eq!(stored, Some(merged));
    }

    #[test]
    fn test_upsert_is_keyed_by_fund_id() {
        let (_temp_dir, pool) = open_store();
        let fund = register_fund(&pool, "000001");
        let repo = ValuationRepository::new(Arc::clone(&pool));

        repo.upsert(full_update(&fund), naive(2025, 6, 19, 15))
            .expect("First refresh failed");
        repo.upsert(full_update(&fund), naive(2025, 6, 20, 15))
            .expect("Second refresh failed");

        let rows = repo
            .find_for_funds(std::slice::from_ref(&fund.id))
            .expect("Batch read failed");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].updated_at, naive(2025, 6, 20, 15));

        assert!(repo.find_for_funds(&[]).expect("Empty read failed").is_empty());
        assert_eq!(repo.find_by_fund_id("missing").expect("Lookup failed"), None);
    }

    #[test]
    fn test_snapshot_requires_a_registered_fund() {
        let (_temp_dir, pool) = open_store();
        let repo = ValuationRepository::new(Arc::clone(&pool));

        let fund = Fund {
            id: "missing".to_string(),
            fund_code: "999999".to_string(),
            fund_name: String::new(),
            fund_type: String::new(),
            created_at: naive(2025, 6, 19, 0),
        };
        let err = repo
            .upsert(full_update(&fund), naive(2025, 6, 19, 15))
            .expect_err("Expected the unregistered fund to fail");
        assert!(matches!(
            err,
            Error::Database(DatabaseError::ForeignKeyViolation(_))
        ));
    }
}
