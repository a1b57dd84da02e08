#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, RwLock};

    use chrono::Utc;

    use crate::constants::DEFAULT_PLATFORM_NAME;
    use crate::errors::{Error, Result};
    use crate::funds::Fund;
    use crate::holdings::{
        Holding, HoldingProfitUpdate, HoldingRepositoryTrait, HoldingWrite, NewProfitRecord,
        NewTransaction,
    };
    use crate::platforms::{
        Platform, PlatformOrder, PlatformRepositoryTrait, PlatformService, PlatformServiceTrait,
    };

    #[derive(Default)]
    struct MockPlatformRepository {
        platforms: RwLock<Vec<Platform>>,
        next_id: AtomicUsize,
    }

    impl MockPlatformRepository {
        fn seed(&self, name: &str, display_order: i32) -> Platform {
            let platform = Platform {
                id: format!("platform-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
                name: name.to_string(),
                display_order,
                created_at: Utc::now().naive_utc(),
            };
            self.platforms.write().unwrap().push(platform.clone());
            platform
        }

        fn get(&self, platform_id: &str) -> Option<Platform> {
            self.platforms
                .read()
                .unwrap()
                .iter()
                .find(|p| p.id == platform_id)
                .cloned()
        }

        fn len(&self) -> usize {
            self.platforms.read().unwrap().len()
        }
    }

    impl PlatformRepositoryTrait for MockPlatformRepository {
        fn find_by_id(&self, platform_id: &str) -> Result<Option<Platform>> {
            Ok(self.get(platform_id))
        }

        fn find_by_name(&self, name: &str) -> Result<Option<Platform>> {
            Ok(self
                .platforms
                .read()
                .unwrap()
                .iter()
                .find(|p| p.name == name)
                .cloned())
        }

        fn list_ordered(&self) -> Result<Vec<Platform>> {
            let mut platforms = self.platforms.read().unwrap().clone();
            platforms.sort_by(|a, b| {
                a.display_order
                    .cmp(&b.display_order)
                    .then_with(|| a.id.cmp(&b.id))
            });
            Ok(platforms)
        }

        fn insert(&self, name: &str, display_order: i32) -> Result<Platform> {
            Ok(self.seed(name, display_order))
        }

        fn rename(&self, platform_id: &str, name: &str) -> Result<usize> {
            let mut platforms = self.platforms.write().unwrap();
            match platforms.iter_mut().find(|p| p.id == platform_id) {
                Some(platform) => {
                    platform.name = name.to_string();
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        fn delete(&self, platform_id: &str) -> Result<usize> {
            let mut platforms = self.platforms.write().unwrap();
            let before = platforms.len();
            platforms.retain(|p| p.id != platform_id);
            Ok(before - platforms.len())
        }

        fn max_display_order(&self) -> Result<i32> {
            Ok(self
                .platforms
                .read()
                .unwrap()
                .iter()
                .map(|p| p.display_order)
                .max()
                .unwrap_or(0))
        }

        fn set_display_order(&self, platform_id: &str, display_order: i32) -> Result<usize> {
            let mut platforms = self.platforms.write().unwrap();
            match platforms.iter_mut().find(|p| p.id == platform_id) {
                Some(platform) => {
                    platform.display_order = display_order;
                    Ok(1)
                }
                None => Ok(0),
            }
        }
    }

    #[derive(Default)]
    struct MockHoldingRepository {
        counts: RwLock<HashMap<String, i64>>,
    }

    impl MockHoldingRepository {
        fn set_count(&self, platform: &str, count: i64) {
            self.counts
                .write()
                .unwrap()
                .insert(platform.to_string(), count);
        }
    }

    impl HoldingRepositoryTrait for MockHoldingRepository {
        fn find_for_platform(&self, _fund_id: &str, _platform: &str) -> Result<Option<Holding>> {
            unimplemented!()
        }

        fn find_first_for_fund(&self, _fund_id: &str) -> Result<Option<Holding>> {
            unimplemented!()
        }

        fn list(&self) -> Result<Vec<Holding>> {
            unimplemented!()
        }

        fn list_with_funds(&self) -> Result<Vec<(Holding, Fund)>> {
            unimplemented!()
        }

        fn count_for_platform_name(&self, platform: &str) -> Result<i64> {
            Ok(self
                .counts
                .read()
                .unwrap()
                .get(platform)
                .copied()
                .unwrap_or(0))
        }

        fn upsert_position(&self, _write: HoldingWrite) -> Result<Holding> {
            unimplemented!()
        }

        fn upsert_with_transaction(
            &self,
            _write: HoldingWrite,
            _transaction: NewTransaction,
        ) -> Result<Holding> {
            unimplemented!()
        }

        fn close_with_transaction(
            &self,
            _holding_id: &str,
            _transaction: NewTransaction,
        ) -> Result<usize> {
            unimplemented!()
        }

        fn delete(&self, _holding_id: &str) -> Result<usize> {
            unimplemented!()
        }

        fn delete_for_fund(&self, _fund_id: &str) -> Result<usize> {
            unimplemented!()
        }

        fn apply_profit_update(
            &self,
            _update: HoldingProfitUpdate,
            _record: NewProfitRecord,
        ) -> Result<()> {
            unimplemented!()
        }
    }

    struct Fixture {
        platforms: Arc<MockPlatformRepository>,
        holdings: Arc<MockHoldingRepository>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                platforms: Arc::new(MockPlatformRepository::default()),
                holdings: Arc::new(MockHoldingRepository::default()),
            }
        }

        fn service(&self) -> PlatformService {
            PlatformService::new(self.platforms.clone(), self.holdings.clone())
        }
    }

    #[tokio::test]
    async fn test_create_appends_after_the_highest_order() {
        let fixture = Fixture::new();
        fixture.platforms.seed(DEFAULT_PLATFORM_NAME, 0);
        fixture.platforms.seed("支付宝", 3);
        let service = fixture.service();

        let platform = service.create("  天天基金  ").await.unwrap();

        assert_eq!(platform.name, "天天基金");
        assert_eq!(platform.display_order, 4);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_and_duplicate_names() {
        let fixture = Fixture::new();
        fixture.platforms.seed("支付宝", 1);
        let service = fixture.service();

        assert!(matches!(
            service.create("   ").await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            service.create("支付宝").await,
            Err(Error::Validation(_))
        ));
        assert_eq!(fixture.platforms.len(), 1);
    }

    #[tokio::test]
    async fn test_rename_rejects_a_name_held_by_another_platform() {
        let fixture = Fixture::new();
        let alipay = fixture.platforms.seed("支付宝", 1);
        fixture.platforms.seed("天天基金", 2);
        let service = fixture.service();

        assert!(matches!(
            service.rename(&alipay.id, "天天基金").await,
            Err(Error::Validation(_))
        ));
        // Renaming to its own current name is a no-op, not a conflict.
        service.rename(&alipay.id, "支付宝").await.unwrap();

        service.rename(&alipay.id, "蚂蚁财富").await.unwrap();
        assert_eq!(fixture.platforms.get(&alipay.id).unwrap().name, "蚂蚁财富");
    }

    #[tokio::test]
    async fn test_rename_requires_an_existing_platform() {
        let fixture = Fixture::new();
        let service = fixture.service();

        assert!(matches!(
            service.rename("platform-404", "支付宝").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_is_blocked_while_holdings_use_the_name() {
        let fixture = Fixture::new();
        let alipay = fixture.platforms.seed("支付宝", 1);
        fixture.holdings.set_count("支付宝", 2);
        let service = fixture.service();

        match service.delete(&alipay.id).await {
            Err(Error::Validation(error)) => {
                assert!(error.to_string().contains("2 holding(s)"))
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
        assert_eq!(fixture.platforms.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_an_unused_platform() {
        let fixture = Fixture::new();
        let alipay = fixture.platforms.seed("支付宝", 1);
        let service = fixture.service();

        service.delete(&alipay.id).await.unwrap();
        assert_eq!(fixture.platforms.len(), 0);

        assert!(matches!(
            service.delete(&alipay.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reorder_skips_unknown_ids_and_applies_the_rest() {
        let fixture = Fixture::new();
        let alipay = fixture.platforms.seed("支付宝", 1);
        let tiantian = fixture.platforms.seed("天天基金", 2);
        let service = fixture.service();

        service
            .reorder(vec![
                PlatformOrder {
                    id: tiantian.id.clone(),
                    display_order: 1,
                },
                PlatformOrder {
                    id: alipay.id.clone(),
                    display_order: 2,
                },
                PlatformOrder {
                    id: "platform-404".to_string(),
                    display_order: 9,
                },
            ])
            .await
            .unwrap();

        let ordered = service.list().unwrap();
        assert_eq!(ordered[0].name, "天天基金");
        assert_eq!(ordered[1].name, "支付宝");

        assert!(matches!(
            service.reorder(Vec::new()).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_default_seeds_exactly_once() {
        let fixture = Fixture::new();
        let service = fixture.service();

        service.ensure_default().await.unwrap();
        service.ensure_default().await.unwrap();

        assert_eq!(fixture.platforms.len(), 1);
        let platforms = service.list().unwrap();
        assert_eq!(platforms[0].name, DEFAULT_PLATFORM_NAME);
        assert_eq!(platforms[0].display_order, 0);
    }

    #[tokio::test]
    async fn test_list_orders_by_display_order_then_id() {
        let fixture = Fixture::new();
        fixture.platforms.seed("支付宝", 2);
        fixture.platforms.seed(DEFAULT_PLATFORM_NAME, 0);
        fixture.platforms.seed("天天基金", 2);
        let service = fixture.service();

        let names: Vec<String> = service
            .list()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec![DEFAULT_PLATFORM_NAME, "支付宝", "天天基金"]);
    }
}
