use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A fund tracked for display without necessarily holding a position.
///
/// `tags` is a free-form comma-separated label string; empty means
/// untagged. At most one entry exists per fund.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub id: String,
    pub fund_id: String,
    pub tags: String,
    pub created_at: NaiveDateTime,
}
