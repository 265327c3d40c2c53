//! Catalog Domain
//!
//! Shops, categories, products and their shop-specific variants, loaded from
//! YAML feeds that shop accounts publish at a URL.
//!
//! ```text
//! POST /upload ─► CatalogService::upload ─► FeedFetcher ─► Feed::from_yaml
//!                                    │
//!                                    └─► CatalogRepository::upsert_* (in-memory or Postgres)
//! ```
//!
//! The order engine reads variants and decrements stock through the same
//! [`CatalogRepository`].

pub mod error;
pub mod feed;
pub mod fetcher;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{CatalogError, CatalogResult, FeedError};
pub use feed::{Feed, FeedCategory, FeedGood};
pub use fetcher::{FeedFetcher, HttpFeedFetcher, InMemoryFeedFetcher};
pub use models::{
    CatalogStats, Category, Parameter, ParameterValue, Product, ProductInfo, ProductInfoUpsert,
    ProductListItem, ProductOrdering, ProductPage, ProductParameter, ProductQuery, ProductRef,
    ProductSortField, Shop, ShopRef, UploadRequest, Variant,
};
pub use postgres::PgCatalogRepository;
pub use repository::{CatalogRepository, InMemoryCatalogRepository};
pub use service::{CatalogService, IngestSummary, SHOP_ROLE};
