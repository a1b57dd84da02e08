//! Coarse time-bucketed memoization for provider calls.
//!
//! Keys are `(fund_code, wall_clock_seconds / bucket_width)`: every caller
//! inside the same bucket shares one upstream call. This only throttles
//! refetching within the bucket; it is not a freshness guarantee, and the
//! snapshot TTL above it is what governs correctness.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::MarketDataError;
use crate::model::{FundHistory, FundReturns, FundSearchHit, HistoryDepth, NavRecord, ValuationQuote};
use crate::provider::FundDataProvider;

/// Bucket width for single-fund quote/returns lookups.
pub const DETAIL_QUOTE_BUCKET_SECS: u64 = 300;
/// Bucket width for batch quote/returns lookups.
pub const BATCH_QUOTE_BUCKET_SECS: u64 = 3600;
/// Bucket width for full NAV history fetches.
pub const HISTORY_BUCKET_SECS: u64 = 3600;

const MEMO_CAPACITY: usize = 512;

/// A clone-on-hit cache where entries are valid for exactly one bucket.
pub struct MemoCache<T: Clone> {
    entries: DashMap<String, (u64, T)>,
    bucket_secs: u64,
    capacity: usize,
}

impl<T: Clone> MemoCache<T> {
    pub fn new(bucket_secs: u64, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            bucket_secs: bucket_secs.max(1),
            capacity,
        }
    }

    fn bucket(&self, now_unix: u64) -> u64 {
        now_unix / self.bucket_secs
    }

    pub fn get(&self, key: &str, now_unix: u64) -> Option<T> {
        let bucket = self.bucket(now_unix);
        self.entries
            .get(key)
            .filter(|entry| entry.value().0 == bucket)
            .map(|entry| entry.value().1.clone())
    }

    pub fn insert(&self, key: &str, now_unix: u64, value: T) {
        let bucket = self.bucket(now_unix);
        if self.entries.len() >= self.capacity {
            // Entries from older buckets are dead weight; drop them first.
            self.entries.retain(|_, (b, _)| *b == bucket);
        }
        self.entries.insert(key.to_string(), (bucket, value));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Bucket widths for one memoized view over a provider.
#[derive(Debug, Clone, Copy)]
pub struct MemoConfig {
    pub quote_bucket_secs: u64,
    pub history_bucket_secs: u64,
    pub capacity: usize,
}

impl MemoConfig {
    /// Tuning for single-fund read paths.
    pub fn detail() -> Self {
        Self {
            quote_bucket_secs: DETAIL_QUOTE_BUCKET_SECS,
            history_bucket_secs: HISTORY_BUCKET_SECS,
            capacity: MEMO_CAPACITY,
        }
    }

    /// Tuning for batch read paths, which tolerate coarser reuse.
    pub fn batch() -> Self {
        Self {
            quote_bucket_secs: BATCH_QUOTE_BUCKET_SECS,
            history_bucket_secs: HISTORY_BUCKET_SECS,
            capacity: MEMO_CAPACITY,
        }
    }
}

/// Memoizing wrapper around any [`FundDataProvider`].
///
/// Successful results are cached per bucket; transport errors pass through
/// uncached. Search is deliberately never memoized.
pub struct MemoizedProvider {
    inner: Arc<dyn FundDataProvider>,
    valuations: MemoCache<Option<ValuationQuote>>,
    returns: MemoCache<FundReturns>,
    light_histories: MemoCache<FundHistory>,
    full_histories: MemoCache<FundHistory>,
}

impl MemoizedProvider {
    pub fn new(inner: Arc<dyn FundDataProvider>, config: MemoConfig) -> Self {
        Self {
            inner,
            valuations: MemoCache::new(config.quote_bucket_secs, config.capacity),
            returns: MemoCache::new(config.quote_bucket_secs, config.capacity),
            light_histories: MemoCache::new(config.quote_bucket_secs, config.capacity),
            full_histories: MemoCache::new(config.history_bucket_secs, config.capacity),
        }
    }

    fn now_unix() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

#[async_trait]
impl FundDataProvider for MemoizedProvider {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    async fn fetch_valuation(
        &self,
        fund_code: &str,
    ) -> Result<Option<ValuationQuote>, MarketDataError> {
        let now = Self::now_unix();
        if let Some(hit) = self.valuations.get(fund_code, now) {
            return Ok(hit);
        }
        let fetched = self.inner.fetch_valuation(fund_code).await?;
        self.valuations.insert(fund_code, now, fetched.clone());
        Ok(fetched)
    }

    async fn fetch_returns(&self, fund_code: &str) -> FundReturns {
        let now = Self::now_unix();
        if let Some(hit) = self.returns.get(fund_code, now) {
            return hit;
        }
        let fetched = self.inner.fetch_returns(fund_code).await;
        self.returns.insert(fund_code, now, fetched.clone());
        fetched
    }

    async fn fetch_history(&self, fund_code: &str, depth: HistoryDepth) -> FundHistory {
        let cache = match depth {
            HistoryDepth::ReturnsOnly => &self.light_histories,
            HistoryDepth::Full => &self.full_histories,
        };
        let now = Self::now_unix();
        if let Some(hit) = cache.get(fund_code, now) {
            return hit;
        }
        let fetched = self.inner.fetch_history(fund_code, depth).await;
        cache.insert(fund_code, now, fetched.clone());
        fetched
    }

    async fn fetch_history_on(&self, fund_code: &str, date: NaiveDate) -> Option<NavRecord> {
        // Rides the memoized full-history fetch.
        self.fetch_history(fund_code, HistoryDepth::Full)
            .await
            .net_values
            .into_iter()
            .find(|record| record.date == date)
    }

    async fn search(&self, keyword: &str) -> Result<Vec<FundSearchHit>, MarketDataError> {
        self.inner.search(keyword).await
    }
}
