//! Bounded concurrent fetching across many funds.
//!
//! One slow or dead upstream call must never sink a whole sweep, so every
//! per-fund future runs under its own timeout and degrades to a neutral
//! value on expiry. The result map always contains every requested code.

use futures::stream::{self, StreamExt};
use log::warn;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::model::{FundReturns, ValuationQuote};
use crate::provider::FundDataProvider;

/// Upper bound on in-flight upstream calls per batch.
pub const BATCH_CONCURRENCY: usize = 10;
/// Budget for a single per-fund call inside a batch.
pub const BATCH_TASK_TIMEOUT: Duration = Duration::from_secs(5);

/// Fans one provider out over a set of fund codes.
pub struct BatchFetcher {
    provider: Arc<dyn FundDataProvider>,
    concurrency: usize,
    task_timeout: Duration,
}

impl BatchFetcher {
    pub fn new(provider: Arc<dyn FundDataProvider>) -> Self {
        Self::with_limits(provider, BATCH_CONCURRENCY, BATCH_TASK_TIMEOUT)
    }

    pub fn with_limits(
        provider: Arc<dyn FundDataProvider>,
        concurrency: usize,
        task_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            concurrency: concurrency.max(1),
            task_timeout,
        }
    }

    /// Fetches interval returns for every code. Codes whose call fails or
    /// times out map to [`FundReturns::empty`].
    pub async fn fetch_returns_many(
        &self,
        fund_codes: &HashSet<String>,
    ) -> HashMap<String, FundReturns> {
        let results = stream::iter(fund_codes.iter().cloned())
            .map(|code| {
                let provider = self.provider.clone();
                let budget = self.task_timeout;
                async move {
                    let fetched =
                        tokio::time::timeout(budget, provider.fetch_returns(&code)).await;
                    match fetched {
                        Ok(returns) => (code, returns),
                        Err(_) => {
                            warn!("batch returns fetch timed out for fund {}", code);
                            let empty = FundReturns::empty(&code);
                            (code, empty)
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        results.into_iter().collect()
    }

    /// Fetches live valuation quotes for every code. Codes whose call fails
    /// or times out map to `None`.
    pub async fn fetch_valuations_many(
        &self,
        fund_codes: &HashSet<String>,
    ) -> HashMap<String, Option<ValuationQuote>> {
        let results = stream::iter(fund_codes.iter().cloned())
            .map(|code| {
                let provider = self.provider.clone();
                let budget = self.task_timeout;
                async move {
                    let fetched =
                        tokio::time::timeout(budget, provider.fetch_valuation(&code)).await;
                    let quote = match fetched {
                        Ok(Ok(quote)) => quote,
                        Ok(Err(e)) => {
                            warn!("batch valuation fetch failed for fund {}: {}", code, e);
                            None
                        }
                        Err(_) => {
                            warn!("batch valuation fetch timed out for fund {}", code);
                            None
                        }
                    };
                    (code, quote)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        results.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MarketDataError;
    use crate::model::{FundHistory, FundSearchHit, HistoryDepth};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct StalledProvider;

    #[async_trait]
    impl FundDataProvider for StalledProvider {
        fn id(&self) -> &'static str {
            "STALLED"
        }

        async fn fetch_valuation(
            &self,
            _fund_code: &str,
        ) -> Result<Option<ValuationQuote>, MarketDataError> {
            futures::future::pending().await
        }

        async fn fetch_returns(&self, _fund_code: &str) -> FundReturns {
            futures::future::pending().await
        }

        async fn fetch_history(&self, fund_code: &str, _depth: HistoryDepth) -> FundHistory {
            FundHistory::empty(fund_code)
        }

        async fn search(&self, _keyword: &str) -> Result<Vec<FundSearchHit>, MarketDataError> {
            Ok(Vec::new())
        }
    }

    struct FlakyProvider;

    #[async_trait]
    impl FundDataProvider for FlakyProvider {
        fn id(&self) -> &'static str {
            "FLAKY"
        }

        async fn fetch_valuation(
            &self,
            fund_code: &str,
        ) -> Result<Option<ValuationQuote>, MarketDataError> {
            if fund_code == "000002" {
                return Err(MarketDataError::ProviderError {
                    provider: "FLAKY".to_string(),
                    message: "boom".to_string(),
                });
            }
            Ok(Some(ValuationQuote {
                fund_code: fund_code.to_string(),
                fund_name: "某基金".to_string(),
                net_value_date: Some("2026-08-25".to_string()),
                unit_net_value: Some(dec!(1.2345)),
                estimate_net_value: Some(dec!(1.2400)),
                estimate_change_rate: Some(dec!(0.45)),
                estimate_time: Some("2026-08-25 14:30".to_string()),
            }))
        }

        async fn fetch_returns(&self, fund_code: &str) -> FundReturns {
            FundReturns {
                fund_code: fund_code.to_string(),
                one_month_rate: dec!(1.1),
                three_month_rate: dec!(2.2),
                one_year_rate: dec!(3.3),
                daily_change_rate: dec!(0.4),
                as_of_date: "2026-08-25".to_string(),
            }
        }

        async fn fetch_history(&self, fund_code: &str, _depth: HistoryDepth) -> FundHistory {
            FundHistory::empty(fund_code)
        }

        async fn search(&self, _keyword: &str) -> Result<Vec<FundSearchHit>, MarketDataError> {
            Ok(Vec::new())
        }
    }

    fn codes(list: &[&str]) -> HashSet<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn timeouts_still_yield_all_keys() {
        let fetcher = BatchFetcher::with_limits(
            Arc::new(StalledProvider),
            4,
            Duration::from_millis(20),
        );
        let requested = codes(&["000001", "000002", "000003", "000004", "000005"]);

        let returns = fetcher.fetch_returns_many(&requested).await;
        assert_eq!(returns.len(), 5);
        for code in &requested {
            assert!(returns[code].is_empty());
        }

        let valuations = fetcher.fetch_valuations_many(&requested).await;
        assert_eq!(valuations.len(), 5);
        for code in &requested {
            assert!(valuations[code].is_none());
        }
    }

    #[tokio::test]
    async fn failed_valuations_degrade_to_none_without_dropping_others() {
        let fetcher = BatchFetcher::new(Arc::new(FlakyProvider));
        let requested = codes(&["000001", "000002"]);

        let valuations = fetcher.fetch_valuations_many(&requested).await;
        assert_eq!(valuations.len(), 2);
        assert!(valuations["000002"].is_none());
        let quote = valuations["000001"].as_ref().unwrap();
        assert_eq!(quote.fund_code, "000001");
        assert_eq!(quote.estimate_net_value, Some(dec!(1.2400)));
    }

    #[tokio::test]
    async fn returns_batch_carries_fetched_values() {
        let fetcher = BatchFetcher::new(Arc::new(FlakyProvider));
        let requested = codes(&["161725"]);

        let returns = fetcher.fetch_returns_many(&requested).await;
        assert_eq!(returns["161725"].one_year_rate, dec!(3.3));
        assert_eq!(returns["161725"].as_of_date, "2026-08-25");
    }
}
