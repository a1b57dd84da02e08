use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Snapshot freshness window. A cached valuation older than this is stale
/// and triggers a refresh on read unless the caller accepts cached data.
pub const SNAPSHOT_TTL_MINUTES: i64 = 10;

/// Start of the evening profit-recording window (inclusive), in the
/// valuation timezone.
pub const PROFIT_WINDOW_START_HOUR: u32 = 19;

/// End of the evening profit-recording window (exclusive), in the
/// valuation timezone.
pub const PROFIT_WINDOW_END_HOUR: u32 = 23;

/// Cadence of the background reconciliation sweeps.
pub const RECONCILE_INTERVAL_SECS: u64 = 600;

/// Neutral unit price used when every resolution source fails.
pub const FALLBACK_UNIT_VALUE: Decimal = dec!(1.0);

/// Platform created at startup so a fresh database has somewhere to file
/// positions.
pub const DEFAULT_PLATFORM_NAME: &str = "默认";

/// Platform label assumed when a request names none.
pub const FALLBACK_PLATFORM_NAME: &str = "其他";

/// Category recorded for funds registered without a search hit.
pub const UNKNOWN_FUND_TYPE: &str = "未知";

/// How many profit-history rows a listing returns by default.
pub const PROFIT_HISTORY_DEFAULT_LIMIT: i64 = 30;

/// Decimal precision for valuation calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;
