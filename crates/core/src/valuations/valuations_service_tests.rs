#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, RwLock};

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
    use fundfolio_market_data::{
        FundDataProvider, FundHistory, FundReturns, FundSearchHit, HistoryDepth, MarketDataError,
        NavRecord, ValuationQuote,
    };
    use rust_decimal_macros::dec;

    use crate::errors::{DatabaseError, Error, Result};
    use crate::funds::{Fund, FundRepositoryTrait, NewFund};
    use crate::utils::clock::FixedClock;
    use crate::valuations::{
        DetailOptions, SnapshotUpdate, ValuationRepositoryTrait, ValuationService,
        ValuationServiceTrait, ValuationSnapshot,
    };

    #[derive(Default)]
    struct MockFundRepository {
        funds: RwLock<HashMap<String, Fund>>,
    }

    impl MockFundRepository {
        fn seed(&self, code: &str, name: &str) {
            let fund = Fund {
                id: format!("fund-{}", code),
                fund_code: code.to_string(),
                fund_name: name.to_string(),
                fund_type: "混合型".to_string(),
                created_at: Utc::now().naive_utc(),
            };
            self.funds
                .write()
                .unwrap()
                .insert(code.to_string(), fund);
        }
    }

    impl FundRepositoryTrait for MockFundRepository {
        fn find_by_code(&self, fund_code: &str) -> Result<Option<Fund>> {
            Ok(self.funds.read().unwrap().get(fund_code).cloned())
        }

        fn get_by_code(&self, fund_code: &str) -> Result<Fund> {
            self.find_by_code(fund_code)?
                .ok_or_else(|| Error::Database(DatabaseError::NotFound(fund_code.to_string())))
        }

        fn list(&self) -> Result<Vec<Fund>> {
            Ok(self.funds.read().unwrap().values().cloned().collect())
        }

        fn create(&self, _new_fund: NewFund) -> Result<Fund> {
            unimplemented!()
        }

        fn update_name(&self, _fund_id: &str, _fund_name: &str) -> Result<usize> {
            unimplemented!()
        }
    }

    #[derive(Default)]
    struct MockValuationRepository {
        snapshots: RwLock<HashMap<String, ValuationSnapshot>>,
        upsert_calls: AtomicUsize,
    }

    impl MockValuationRepository {
        fn seed(&self, snapshot: ValuationSnapshot) {
            self.snapshots
                .write()
                .unwrap()
                .insert(snapshot.fund_id.clone(), snapshot);
        }

        fn upserts(&self) -> usize {
            self.upsert_calls.load(Ordering::SeqCst)
        }
    }

    impl ValuationRepositoryTrait for MockValuationRepository {
        fn find_by_fund_id(&self, fund_id: &str) -> Result<Option<ValuationSnapshot>> {
            Ok(self.snapshots.read().unwrap().get(fund_id).cloned())
        }

        fn find_for_funds(&self, fund_ids: &[String]) -> Result<Vec<ValuationSnapshot>> {
            let snapshots = self.snapshots.read().unwrap();
            Ok(fund_ids
                .iter()
                .filter_map(|id| snapshots.get(id).cloned())
                .collect())
        }

        fn upsert(
            &self,
            update: SnapshotUpdate,
            refreshed_at: NaiveDateTime,
        ) -> Result<ValuationSnapshot> {
            self.upsert_calls.fetch_add(1, Ordering::SeqCst);
            let mut snapshots = self.snapshots.write().unwrap();
            let merged = update.apply_to(snapshots.get(&update.fund_id), refreshed_at);
            snapshots.insert(update.fund_id.clone(), merged.clone());
            Ok(merged)
        }
    }

    #[derive(Default)]
    struct MockProvider {
        quote: Option<ValuationQuote>,
        returns: Option<FundReturns>,
        history: Option<FundHistory>,
        history_on: Option<NavRecord>,
        valuation_calls: AtomicUsize,
        returns_calls: AtomicUsize,
        history_calls: AtomicUsize,
    }

    impl MockProvider {
        fn upstream_calls(&self) -> usize {
            self.valuation_calls.load(Ordering::SeqCst)
                + self.returns_calls.load(Ordering::SeqCst)
                + self.history_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FundDataProvider for MockProvider {
        fn id(&self) -> &'static str {
            "mock"
        }

        async fn fetch_valuation(
            &self,
            _fund_code: &str,
        ) -> std::result::Result<Option<ValuationQuote>, MarketDataError> {
            self.valuation_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.quote.clone())
        }

        async fn fetch_returns(&self, fund_code: &str) -> FundReturns {
            self.returns_calls.fetch_add(1, Ordering::SeqCst);
            self.returns
                .clone()
                .unwrap_or_else(|| FundReturns::empty(fund_code))
        }

        async fn fetch_history(&self, fund_code: &str, _depth: HistoryDepth) -> FundHistory {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            self.history
                .clone()
                .unwrap_or_else(|| FundHistory::empty(fund_code))
        }

        async fn fetch_history_on(
            &self,
            _fund_code: &str,
            _date: NaiveDate,
        ) -> Option<NavRecord> {
            self.history_on.clone()
        }

        async fn search(
            &self,
            _keyword: &str,
        ) -> std::result::Result<Vec<FundSearchHit>, MarketDataError> {
            Ok(Vec::new())
        }
    }

    fn noon() -> DateTime<Utc> {
        // 12:00 in the valuation timezone.
        Utc.with_ymd_and_hms(2025, 6, 20, 4, 0, 0).unwrap()
    }

    fn cached_snapshot(fund_id: &str, updated_at: NaiveDateTime) -> ValuationSnapshot {
        let mut snapshot = ValuationSnapshot::empty(fund_id, updated_at);
        snapshot.unit_net_value = Some(dec!(1.2345));
        snapshot.one_month_rate = dec!(2.1);
        snapshot.as_of_date = NaiveDate::from_ymd_opt(2025, 6, 19);
        snapshot
    }

    fn returns(fsrq: &str) -> FundReturns {
        FundReturns {
            fund_code: "000001".to_string(),
            one_month_rate: dec!(1.5),
            three_month_rate: dec!(4.0),
            one_year_rate: dec!(15.0),
            daily_change_rate: dec!(0.8),
            as_of_date: fsrq.to_string(),
        }
    }

    fn service(
        fund_repository: Arc<MockFundRepository>,
        valuation_repository: Arc<MockValuationRepository>,
        provider: Arc<MockProvider>,
        now: DateTime<Utc>,
    ) -> ValuationService {
        ValuationService::new(
            fund_repository,
            valuation_repository,
            provider.clone(),
            provider,
            Arc::new(FixedClock::new(now)),
        )
    }

    #[tokio::test]
    async fn test_fresh_snapshot_never_calls_the_provider() {
        let funds = Arc::new(MockFundRepository::default());
        funds.seed("000001", "华夏成长");
        let valuations = Arc::new(MockValuationRepository::default());
        let now = noon();
        valuations.seed(cached_snapshot(
            "fund-000001",
            now.naive_utc() - Duration::minutes(5),
        ));
        let provider = Arc::new(MockProvider::default());
        let service = service(funds, valuations.clone(), provider.clone(), now);

        let normalized = service.get_quote("000001", false).await.unwrap();

        assert_eq!(normalized.unit_net_value, Some(dec!(1.2345)));
        assert_eq!(normalized.one_month_rate, dec!(2.1));
        assert_eq!(provider.upstream_calls(), 0);
        assert_eq!(valuations.upserts(), 0);
    }

    #[tokio::test]
    async fn test_force_refresh_always_calls_the_provider() {
        let funds = Arc::new(MockFundRepository::default());
        funds.seed("000001", "华夏成长");
        let valuations = Arc::new(MockValuationRepository::default());
        let now = noon();
        valuations.seed(cached_snapshot(
            "fund-000001",
            now.naive_utc() - Duration::minutes(1),
        ));
        let provider = Arc::new(MockProvider {
            returns: Some(returns("2025-06-20")),
            ..Default::default()
        });
        let service = service(funds, valuations.clone(), provider.clone(), now);

        let normalized = service.get_quote("000001", true).await.unwrap();

        assert!(provider.upstream_calls() > 0);
        assert_eq!(valuations.upserts(), 1);
        assert_eq!(normalized.one_month_rate, dec!(1.5));
        assert_eq!(normalized.fsrq, "2025-06-20");
    }

    #[tokio::test]
    async fn test_stale_snapshot_triggers_a_refresh() {
        let funds = Arc::new(MockFundRepository::default());
        funds.seed("000001", "华夏成长");
        let valuations = Arc::new(MockValuationRepository::default());
        let now = noon();
        valuations.seed(cached_snapshot(
            "fund-000001",
            now.naive_utc() - Duration::minutes(11),
        ));
        let provider = Arc::new(MockProvider {
            returns: Some(returns("2025-06-20")),
            ..Default::default()
        });
        let service = service(funds, valuations.clone(), provider.clone(), now);

        let normalized = service.get_quote("000001", false).await.unwrap();

        assert!(provider.upstream_calls() > 0);
        assert_eq!(valuations.upserts(), 1);
        // Masked merge keeps the stored unit value the light path cannot see.
        assert_eq!(normalized.unit_net_value, Some(dec!(1.2345)));
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_the_stale_snapshot() {
        let funds = Arc::new(MockFundRepository::default());
        funds.seed("000001", "华夏成长");
        let valuations = Arc::new(MockValuationRepository::default());
        let now = noon();
        valuations.seed(cached_snapshot(
            "fund-000001",
            now.naive_utc() - Duration::hours(3),
        ));
        let provider = Arc::new(MockProvider::default());
        let service = service(funds, valuations.clone(), provider, now);

        let normalized = service.get_quote("000001", false).await.unwrap();

        assert_eq!(normalized.unit_net_value, Some(dec!(1.2345)));
        assert_eq!(normalized.fsrq, "2025-06-19");
        assert_eq!(valuations.upserts(), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_without_snapshot_is_the_empty_shape() {
        let funds = Arc::new(MockFundRepository::default());
        funds.seed("000001", "华夏成长");
        let valuations = Arc::new(MockValuationRepository::default());
        let provider = Arc::new(MockProvider::default());
        let service = service(funds, valuations.clone(), provider, noon());

        let normalized = service
            .get_detail("000001", DetailOptions::default())
            .await
            .unwrap();

        assert_eq!(normalized.fund_name, "华夏成长");
        assert_eq!(normalized.estimate_change_rate, "-");
        assert_eq!(normalized.unit_net_value, None);
        assert!(normalized.net_values.is_empty());
        assert_eq!(valuations.upserts(), 0);
    }

    #[tokio::test]
    async fn test_unknown_fund_is_not_found() {
        let funds = Arc::new(MockFundRepository::default());
        let valuations = Arc::new(MockValuationRepository::default());
        let provider = Arc::new(MockProvider::default());
        let service = service(funds, valuations, provider, noon());

        let result = service.get_quote("999999", false).await;

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_skip_store_write_merges_without_touching_the_store() {
        let funds = Arc::new(MockFundRepository::default());
        funds.seed("000001", "华夏成长");
        let valuations = Arc::new(MockValuationRepository::default());
        let provider = Arc::new(MockProvider {
            history: Some(FundHistory {
                returns: returns("2025-06-20"),
                unit_net_value: Some(dec!(1.3000)),
                net_values: Vec::new(),
            }),
            ..Default::default()
        });
        let service = service(funds, valuations.clone(), provider, noon());

        let normalized = service
            .get_detail(
                "000001",
                DetailOptions {
                    force_refresh: true,
                    need_history: false,
                    skip_store_write: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(normalized.unit_net_value, Some(dec!(1.3000)));
        assert_eq!(valuations.upserts(), 0);
        assert!(valuations
            .find_by_fund_id("fund-000001")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_batch_skips_unknown_codes_and_covers_the_rest() {
        let funds = Arc::new(MockFundRepository::default());
        funds.seed("000001", "华夏成长");
        funds.seed("161725", "招商中证白酒");
        let valuations = Arc::new(MockValuationRepository::default());
        let provider = Arc::new(MockProvider {
            returns: Some(returns("2025-06-20")),
            ..Default::default()
        });
        let service = service(funds, valuations, provider, noon());

        let codes: HashSet<String> = ["000001", "161725", "999999"]
            .iter()
            .map(|code| code.to_string())
            .collect();
        let quotes = service.get_quotes(&codes, true).await.unwrap();

        assert_eq!(quotes.len(), 2);
        assert!(quotes.contains_key("000001"));
        assert!(quotes.contains_key("161725"));
        assert!(!quotes.contains_key("999999"));
    }

    #[tokio::test]
    async fn test_trade_price_prefers_the_exact_date_nav() {
        let funds = Arc::new(MockFundRepository::default());
        funds.seed("000001", "华夏成长");
        let valuations = Arc::new(MockValuationRepository::default());
        let provider = Arc::new(MockProvider {
            history_on: Some(NavRecord {
                date: NaiveDate::from_ymd_opt(2025, 6, 18).unwrap(),
                unit_net_value: dec!(1.0987),
                cumulative_net_value: None,
                change_rate: None,
            }),
            ..Default::default()
        });
        let service = service(funds, valuations, provider, noon());

        let price = service
            .resolve_trade_price("000001", NaiveDate::from_ymd_opt(2025, 6, 18))
            .await
            .unwrap();

        assert_eq!(price, dec!(1.0987));
    }

    #[tokio::test]
    async fn test_trade_price_falls_back_to_the_latest_unit_value() {
        let funds = Arc::new(MockFundRepository::default());
        funds.seed("000001", "华夏成长");
        let valuations = Arc::new(MockValuationRepository::default());
        let provider = Arc::new(MockProvider {
            history: Some(FundHistory {
                returns: returns("2025-06-20"),
                unit_net_value: Some(dec!(2.0)),
                net_values: Vec::new(),
            }),
            ..Default::default()
        });
        let service = service(funds, valuations, provider, noon());

        let price = service.resolve_trade_price("000001", None).await.unwrap();

        assert_eq!(price, dec!(2.0));
    }

    #[tokio::test]
    async fn test_trade_price_falls_back_to_the_intraday_estimate() {
        let funds = Arc::new(MockFundRepository::default());
        funds.seed("000001", "华夏成长");
        let valuations = Arc::new(MockValuationRepository::default());
        let provider = Arc::new(MockProvider {
            quote: Some(ValuationQuote {
                fund_code: "000001".to_string(),
                fund_name: "华夏成长".to_string(),
                net_value_date: None,
                unit_net_value: None,
                estimate_net_value: Some(dec!(1.5)),
                estimate_change_rate: None,
                estimate_time: None,
            }),
            ..Default::default()
        });
        let service = service(funds, valuations, provider, noon());

        let price = service.resolve_trade_price("000001", None).await.unwrap();

        assert_eq!(price, dec!(1.5));
    }

    #[tokio::test]
    async fn test_trade_price_defaults_to_one_when_nothing_resolves() {
        let funds = Arc::new(MockFundRepository::default());
        funds.seed("000001", "华夏成长");
        let valuations = Arc::new(MockValuationRepository::default());
        let provider = Arc::new(MockProvider::default());
        let service = service(funds, valuations, provider, noon());

        let price = service.resolve_trade_price("000001", None).await.unwrap();

        assert_eq!(price, dec!(1.0));
    }
}
