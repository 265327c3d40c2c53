use axum_helpers::AuthUser;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use crate::error::{CatalogError, CatalogResult, FeedError};
use crate::feed::Feed;
use crate::fetcher::FeedFetcher;
use crate::models::{Category, ProductInfoUpsert, ProductPage, ProductQuery, Shop};
use crate::repository::CatalogRepository;

/// Role a principal needs to upload a feed
pub const SHOP_ROLE: &str = "shop";

/// What one ingestion wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub shop_id: i64,
    pub categories: usize,
    pub goods: usize,
}

/// Service layer for the catalog: feed ingestion and browsing
#[derive(Clone)]
pub struct CatalogService {
    repository: Arc<dyn CatalogRepository>,
    fetcher: Arc<dyn FeedFetcher>,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn CatalogRepository>, fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self {
            repository,
            fetcher,
        }
    }

    pub fn repository(&self) -> Arc<dyn CatalogRepository> {
        Arc::clone(&self.repository)
    }

    /// Fetch the feed at `url` and load it into the catalog on behalf of a shop user.
    pub async fn upload(
        &self,
        principal: Option<&AuthUser>,
        url: Option<&str>,
    ) -> CatalogResult<IngestSummary> {
        let principal = principal.ok_or(CatalogError::LoginRequired)?;
        if !principal.has_role(SHOP_ROLE) {
            return Err(CatalogError::NotShop);
        }

        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(CatalogError::MissingUrl)?;
        let url = validate_feed_url(url)?;

        let document = self.fetcher.fetch(url.as_str()).await?;
        let feed = Feed::from_yaml(&document)?;

        self.ingest(principal.id, url.as_str(), &feed).await
    }

    /// Upsert a validated feed. Each row is written with its own statement;
    /// a storage failure part way through leaves earlier rows in place.
    pub async fn ingest(&self, owner_id: i64, url: &str, feed: &Feed) -> CatalogResult<IngestSummary> {
        let shop: Shop = self.repository.upsert_shop(&feed.shop, owner_id, url).await?;

        let mut categories: HashMap<i64, Category> = HashMap::with_capacity(feed.categories.len());
        for entry in &feed.categories {
            let category = self.repository.upsert_category(entry.id, &entry.name).await?;
            self.repository.set_category_shop(category.id, shop.id).await?;
            categories.insert(entry.id, category);
        }

        for good in &feed.goods {
            let category = categories
                .get(&good.category)
                .ok_or(FeedError::UnknownCategory(good.category))?;

            let product = self.repository.upsert_product(&good.name, category.id).await?;
            let info = self
                .repository
                .upsert_product_info(ProductInfoUpsert {
                    product_id: product.id,
                    shop_id: shop.id,
                    external_id: good.id,
                    model: good.model.clone(),
                    quantity: good.quantity,
                    price: good.price,
                    price_rrc: good.price_rrc,
                })
                .await?;

            for (name, value) in &good.parameters {
                let parameter = self.repository.upsert_parameter(name).await?;
                self.repository
                    .upsert_product_parameter(info.id, parameter.id, value)
                    .await?;
            }
        }

        let summary = IngestSummary {
            shop_id: shop.id,
            categories: categories.len(),
            goods: feed.goods.len(),
        };
        tracing::info!(
            shop_id = summary.shop_id,
            shop = %shop.name,
            categories = summary.categories,
            goods = summary.goods,
            "Ingested feed"
        );
        Ok(summary)
    }

    pub async fn list_products(&self, query: &ProductQuery) -> CatalogResult<ProductPage> {
        self.repository.list_products(query).await
    }

    pub async fn list_shops(&self) -> CatalogResult<Vec<Shop>> {
        self.repository.list_shops().await
    }

    pub async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        self.repository.list_categories().await
    }
}

/// Accept only absolute http(s) URLs with a host.
fn validate_feed_url(raw: &str) -> CatalogResult<Url> {
    let url = Url::parse(raw).map_err(|e| CatalogError::InvalidUrl(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CatalogError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(CatalogError::InvalidUrl("missing host".to_string()));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{InMemoryFeedFetcher, MockFeedFetcher};
    use crate::repository::InMemoryCatalogRepository;

    const FEED_URL: &str = "https://shop.example/feed.yaml";

    const FEED: &str = r#"
shop: Связной
categories:
  - id: 224
    name: Смартфоны
  - id: 15
    name: Аксессуары
goods:
  - id: 4216292
    category: 224
    model: apple/iphone/xs-max
    name: Смартфон Apple iPhone XS Max 512GB (золотистый)
    price: 110000
    price_rrc: 116990
    quantity: 14
    parameters:
      "Диагональ (дюйм)": 6.5
      "Цвет": золотистый
  - id: 4216313
    category: 224
    model: apple/iphone/xr
    name: Смартфон Apple iPhone XR 256GB (красный)
    price: 65000
    price_rrc: 69990
    quantity: 9
    parameters:
      "Диагональ (дюйм)": 6.1
      "Цвет": красный
  - id: 4672670
    category: 15
    model: cable/usb-c
    name: Кабель USB-C
    price: 300
    price_rrc: 590
    quantity: 100
    parameters:
      "Длина (м)": 1
"#;

    fn shop_user() -> AuthUser {
        AuthUser::new(7, "shop@example.com", vec!["shop".to_string()])
    }

    async fn service_with_feed() -> (CatalogService, InMemoryCatalogRepository) {
        let repository = InMemoryCatalogRepository::new();
        let fetcher = InMemoryFeedFetcher::new();
        fetcher.insert(FEED_URL, FEED).await;
        let service = CatalogService::new(Arc::new(repository.clone()), Arc::new(fetcher));
        (service, repository)
    }

    #[tokio::test]
    async fn test_upload_ingests_feed() {
        let (service, repository) = service_with_feed().await;

        let summary = service.upload(Some(&shop_user()), Some(FEED_URL)).await.unwrap();
        assert_eq!(summary.categories, 2);
        assert_eq!(summary.goods, 3);

        let stats = repository.stats().await.unwrap();
        assert_eq!(stats.shops, 1);
        assert_eq!(stats.categories, 2);
        assert_eq!(stats.products, 3);
        assert_eq!(stats.product_infos, 3);
        assert_eq!(stats.parameters, 3);
        assert_eq!(stats.product_parameters, 5);

        let shops = service.list_shops().await.unwrap();
        assert_eq!(shops[0].user_id, Some(7));
        assert_eq!(shops[0].url.as_deref(), Some(FEED_URL));
    }

    #[tokio::test]
    async fn test_upload_twice_is_idempotent() {
        let (service, repository) = service_with_feed().await;

        service.upload(Some(&shop_user()), Some(FEED_URL)).await.unwrap();
        let first = repository.stats().await.unwrap();
        service.upload(Some(&shop_user()), Some(FEED_URL)).await.unwrap();

        assert_eq!(repository.stats().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_upload_requires_shop_principal() {
        let (service, _) = service_with_feed().await;

        assert!(matches!(
            service.upload(None, Some(FEED_URL)).await,
            Err(CatalogError::LoginRequired)
        ));

        let buyer = AuthUser::new(1, "buyer@example.com", vec!["buyer".to_string()]);
        assert!(matches!(
            service.upload(Some(&buyer), Some(FEED_URL)).await,
            Err(CatalogError::NotShop)
        ));
    }

    #[tokio::test]
    async fn test_upload_rejects_missing_or_malformed_url_without_fetching() {
        let mut fetcher = MockFeedFetcher::new();
        fetcher.expect_fetch().never();
        let service = CatalogService::new(
            Arc::new(InMemoryCatalogRepository::new()),
            Arc::new(fetcher),
        );

        assert!(matches!(
            service.upload(Some(&shop_user()), None).await,
            Err(CatalogError::MissingUrl)
        ));
        assert!(matches!(
            service.upload(Some(&shop_user()), Some("  ")).await,
            Err(CatalogError::MissingUrl)
        ));
        for bad in ["not a url", "ftp://shop.example/feed.yaml", "/relative/feed.yaml"] {
            assert!(
                matches!(
                    service.upload(Some(&shop_user()), Some(bad)).await,
                    Err(CatalogError::InvalidUrl(_))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_upload_with_missing_key_writes_nothing() {
        let repository = InMemoryCatalogRepository::new();
        let fetcher = InMemoryFeedFetcher::new();
        fetcher
            .insert(FEED_URL, FEED.replace("    model: cable/usb-c\n", ""))
            .await;
        let service = CatalogService::new(Arc::new(repository.clone()), Arc::new(fetcher));

        let err = service.upload(Some(&shop_user()), Some(FEED_URL)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Feed(FeedError::MissingKey(ref k)) if k == "model"));
        assert_eq!(repository.stats().await.unwrap(), Default::default());
    }

    #[tokio::test]
    async fn test_upload_propagates_fetch_failure() {
        let (service, _) = service_with_feed().await;

        let err = service
            .upload(Some(&shop_user()), Some("https://shop.example/missing.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Feed(FeedError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_reupload_updates_stock_and_prices() {
        let (service, _) = service_with_feed().await;
        let feed = Feed::from_yaml(FEED).unwrap();
        service.ingest(7, FEED_URL, &feed).await.unwrap();

        let changed = Feed::from_yaml(&FEED.replace("quantity: 100", "quantity: 42")).unwrap();
        service.ingest(7, FEED_URL, &changed).await.unwrap();

        let page = service
            .list_products(&ProductQuery {
                search: Some("usb-c".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].quantity, 42);
    }
}
