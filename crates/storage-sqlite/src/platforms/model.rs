//! Database models for platforms.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use fundfolio_core::platforms::Platform;

/// Database model for one platform
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
#[diesel(table_name = crate::schema::platforms)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct PlatformDB {
    pub id: String,
    pub name: String,
    pub display_order: i32,
    pub created_at: NaiveDateTime,
}

/// Database model for registering a platform
#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::platforms)]
#[serde(rename_all = "camelCase")]
pub struct NewPlatformDB {
    pub id: Option<String>,
    pub name: String,
    pub display_order: i32,
    pub created_at: NaiveDateTime,
}

impl NewPlatformDB {
    pub(crate) fn new(name: &str, display_order: i32) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            display_order,
            created_at: Utc::now().naive_utc(),
        }
    }
}

impl From<PlatformDB> for Platform {
    fn from(db: PlatformDB) -> Self {
        Self {
            id: db.id,
            name: db.name,
            display_order: db.display_order,
            created_at: db.created_at,
        }
    }
}
