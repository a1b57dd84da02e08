use std::sync::Arc;

use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use uuid::Uuid;

use fundfolio_core::platforms::{Platform, PlatformRepositoryTrait};
use fundfolio_core::Result;

use super::model::{NewPlatformDB, PlatformDB};
use crate::db::get_connection;
use crate::errors::IntoCore;
use crate::schema::platforms;
use crate::schema::platforms::dsl::*;

pub struct PlatformRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl PlatformRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        PlatformRepository { pool }
    }
}

impl PlatformRepositoryTrait for PlatformRepository {
    fn find_by_id(&self, platform_id: &str) -> Result<Option<Platform>> {
        let mut conn = get_connection(&self.pool)?;
        let row = platforms
            .find(platform_id)
            .first::<PlatformDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(Platform::from))
    }

    fn find_by_name(&self, platform_name: &str) -> Result<Option<Platform>> {
        let mut conn = get_connection(&self.pool)?;
        let row = platforms
            .filter(name.eq(platform_name))
            .first::<PlatformDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(Platform::from))
    }

    fn list_ordered(&self) -> Result<Vec<Platform>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = platforms
            .order((display_order.asc(), id.asc()))
            .load::<PlatformDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Platform::from).collect())
    }

    fn insert(&self, platform_name: &str, order: i32) -> Result<Platform> {
        let mut conn = get_connection(&self.pool)?;

        let mut row = NewPlatformDB::new(platform_name, order);
        row.id = Some(Uuid::new_v4().to_string());

        let platform_db = diesel::insert_into(platforms::table)
            .values(&row)
            .returning(PlatformDB::as_returning())
            .get_result(&mut conn)
            .into_core()?;
        Ok(Platform::from(platform_db))
    }

    fn rename(&self, platform_id: &str, platform_name: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        diesel::update(platforms.find(platform_id))
            .set(name.eq(platform_name))
            .execute(&mut conn)
            .into_core()
    }

    fn delete(&self, platform_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        diesel::delete(platforms.find(platform_id))
            .execute(&mut conn)
            .into_core()
    }

    fn max_display_order(&self) -> Result<i32> {
        let mut conn = get_connection(&self.pool)?;
        let highest: Option<i32> = platforms
            .select(diesel::dsl::max(display_order))
            .first(&mut conn)
            .into_core()?;
        Ok(highest.unwrap_or(0))
    }

    fn set_display_order(&self, platform_id: &str, order: i32) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        diesel::update(platforms.find(platform_id))
            .set(display_order.eq(order))
            .execute(&mut conn)
            .into_core()
    }
}
