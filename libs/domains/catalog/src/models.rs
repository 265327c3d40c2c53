use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 100;

/// A seller. Upserted by (name, owner) on ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Shop {
    pub id: i64,
    pub name: String,
    /// Owning user id
    #[serde(rename = "user")]
    pub user_id: Option<i64>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: i64,
    pub external_id: i64,
    pub name: String,
}

/// Shop-independent catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
}

/// Shop-specific stock and pricing record for a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductInfo {
    pub id: i64,
    pub model: String,
    pub external_id: i64,
    pub product_id: i64,
    pub shop_id: i64,
    pub quantity: i64,
    pub price: i64,
    pub price_rrc: i64,
}

/// Variant fields written by ingestion; keyed by (shop, external id, model).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInfoUpsert {
    pub product_id: i64,
    pub shop_id: i64,
    pub external_id: i64,
    pub model: String,
    pub quantity: i64,
    pub price: i64,
    pub price_rrc: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Parameter {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductParameter {
    pub id: i64,
    pub product_info_id: i64,
    pub parameter_id: i64,
    pub value: String,
}

/// A variant joined with its product and shop names, as the order engine needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub product_info_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub shop_id: i64,
    pub shop_name: String,
    pub quantity: i64,
    pub price_rrc: i64,
}

/// Row counts, handy for checking that ingestion is idempotent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub shops: i64,
    pub categories: i64,
    pub products: i64,
    pub product_infos: i64,
    pub parameters: i64,
    pub product_parameters: i64,
}

/// `POST /upload` body
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UploadRequest {
    #[schema(example = "https://example.com/shop1.yaml")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShopRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductRef {
    pub id: i64,
    pub name: String,
    /// Category name
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParameterValue {
    pub name: String,
    pub value: String,
}

/// One row of the public product listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductListItem {
    pub id: i64,
    pub model: String,
    pub quantity: i64,
    pub price_rrc: i64,
    pub shop: ShopRef,
    pub product: ProductRef,
    pub parameters: Vec<ParameterValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductPage {
    pub items: Vec<ProductListItem>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Fields the listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortField {
    Model,
    ProductName,
    ShopName,
    CategoryName,
    PriceRrc,
    Quantity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductOrdering {
    pub field: ProductSortField,
    pub descending: bool,
}

impl Default for ProductOrdering {
    fn default() -> Self {
        Self {
            field: ProductSortField::Model,
            descending: true,
        }
    }
}

impl ProductOrdering {
    /// Parses `field` or `-field`; unknown fields yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let field = match name {
            "model" => ProductSortField::Model,
            "product__name" => ProductSortField::ProductName,
            "shop__name" => ProductSortField::ShopName,
            "product__category__name" => ProductSortField::CategoryName,
            "price_rrc" => ProductSortField::PriceRrc,
            "quantity" => ProductSortField::Quantity,
            _ => return None,
        };

        Some(Self { field, descending })
    }
}

/// Query string of `GET /products`
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Case-insensitive substring of model, product, shop or category name
    pub search: Option<String>,
    /// `model`, `product__name`, `shop__name`, `product__category__name`,
    /// `price_rrc` or `quantity`; prefix with `-` for descending
    pub ordering: Option<String>,
    /// Page size (default 50, max 100)
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ProductQuery {
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Orderings in priority order; unknown entries are dropped.
    pub fn orderings(&self) -> Vec<ProductOrdering> {
        let parsed: Vec<ProductOrdering> = self
            .ordering
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter_map(ProductOrdering::parse)
            .collect();

        if parsed.is_empty() {
            vec![ProductOrdering::default()]
        } else {
            parsed
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}
