use std::sync::Arc;

use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use uuid::Uuid;

use fundfolio_core::holdings::{NewTransaction, Transaction, TransactionRepositoryTrait};
use fundfolio_core::Result;

use super::model::{NewTransactionDB, TransactionDB};
use crate::db::get_connection;
use crate::errors::IntoCore;
use crate::schema::transactions;
use crate::schema::transactions::dsl::*;

pub struct TransactionRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl TransactionRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        TransactionRepository { pool }
    }
}

/// Appends a trade row on an existing connection. The holding repository
/// calls this inside its compound-write transactions.
pub(crate) fn append_transaction(
    conn: &mut SqliteConnection,
    transaction: NewTransaction,
) -> QueryResult<usize> {
    let mut row: NewTransactionDB = transaction.into();
    row.id = Some(Uuid::new_v4().to_string());
    diesel::insert_into(transactions::table)
        .values(&row)
        .execute(conn)
}

impl TransactionRepositoryTrait for TransactionRepository {
    fn list_for_fund(&self, target_fund_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions
            .filter(fund_id.eq(target_fund_id))
            .order((transaction_date.desc(), created_at.desc()))
            .load::<TransactionDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }
}
