use std::sync::Arc;

use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use uuid::Uuid;

use fundfolio_core::funds::{Fund, FundRepositoryTrait, NewFund};
use fundfolio_core::Result;

use super::model::{FundDB, NewFundDB};
use crate::db::get_connection;
use crate::errors::IntoCore;
use crate::schema::funds;
use crate::schema::funds::dsl::*;

pub struct FundRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl FundRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        FundRepository { pool }
    }
}

impl FundRepositoryTrait for FundRepository {
    fn find_by_code(&self, code: &str) -> Result<Option<Fund>> {
        let mut conn = get_connection(&self.pool)?;
        let fund_db = funds
            .filter(fund_code.eq(code))
            .first::<FundDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(fund_db.map(Fund::from))
    }

    fn get_by_code(&self, code: &str) -> Result<Fund> {
        let mut conn = get_connection(&self.pool)?;
        let fund_db = funds
            .filter(fund_code.eq(code))
            .first::<FundDB>(&mut conn)
            .into_core()?;
        Ok(Fund::from(fund_db))
    }

    fn list(&self) -> Result<Vec<Fund>> {
        let mut conn = get_connection(&self.pool)?;
        let funds_db = funds
            .order(created_at.asc())
            .load::<FundDB>(&mut conn)
            .into_core()?;
        Ok(funds_db.into_iter().map(Fund::from).collect())
    }

    fn create(&self, new_fund: NewFund) -> Result<Fund> {
        let mut conn = get_connection(&self.pool)?;

        let mut new_fund_db: NewFundDB = new_fund.into();
        new_fund_db.id = Some(Uuid::new_v4().to_string());

        let fund_db = diesel::insert_into(funds::table)
            .values(&new_fund_db)
            .returning(FundDB::as_returning())
            .get_result(&mut conn)
            .into_core()?;
        Ok(Fund::from(fund_db))
    }

    fn update_name(&self, target_id: &str, name: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        diesel::update(funds.find(target_id))
            .set(fund_name.eq(name))
            .execute(&mut conn)
            .into_core()
    }
}
