use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A venue label for filing positions. Holdings reference platforms by
/// name, not by id, so a rename leaves existing holdings under the old
/// label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    pub id: String,
    pub name: String,
    pub display_order: i32,
    pub created_at: NaiveDateTime,
}

/// One row of a bulk reorder request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOrder {
    pub id: String,
    pub display_order: i32,
}
