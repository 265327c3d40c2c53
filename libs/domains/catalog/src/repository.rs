use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::CatalogResult;
use crate::models::{
    CatalogStats, Category, Parameter, ParameterValue, Product, ProductInfo, ProductInfoUpsert,
    ProductListItem, ProductOrdering, ProductPage, ProductParameter, ProductQuery, ProductRef,
    ProductSortField, Shop, ShopRef, Variant,
};

/// Repository trait for the catalog.
///
/// Every `upsert_*` method is keyed by the natural key of its table, so
/// replaying the same feed leaves row counts unchanged.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Keyed by (name, owner); the stored url is replaced.
    async fn upsert_shop(&self, name: &str, owner_id: i64, url: &str) -> CatalogResult<Shop>;

    /// Keyed by (external id, name)
    async fn upsert_category(&self, external_id: i64, name: &str) -> CatalogResult<Category>;

    /// Replace the shops linked to a category with exactly `shop_id`
    async fn set_category_shop(&self, category_id: i64, shop_id: i64) -> CatalogResult<()>;

    /// Keyed by (name, category)
    async fn upsert_product(&self, name: &str, category_id: i64) -> CatalogResult<Product>;

    /// Keyed by (shop, external id, model); product, quantity and prices are replaced.
    async fn upsert_product_info(&self, info: ProductInfoUpsert) -> CatalogResult<ProductInfo>;

    /// Keyed by name
    async fn upsert_parameter(&self, name: &str) -> CatalogResult<Parameter>;

    /// Keyed by (variant, parameter); the last value wins.
    async fn upsert_product_parameter(
        &self,
        product_info_id: i64,
        parameter_id: i64,
        value: &str,
    ) -> CatalogResult<ProductParameter>;

    async fn list_products(&self, query: &ProductQuery) -> CatalogResult<ProductPage>;

    /// Ordered by name
    async fn list_shops(&self) -> CatalogResult<Vec<Shop>>;

    async fn list_shops_by_owner(&self, owner_id: i64) -> CatalogResult<Vec<Shop>>;

    /// Ordered by name
    async fn list_categories(&self) -> CatalogResult<Vec<Category>>;

    async fn get_product(&self, id: i64) -> CatalogResult<Option<Product>>;

    /// The variant of `product_id` offered by `shop_id`
    async fn find_variant(&self, product_id: i64, shop_id: i64) -> CatalogResult<Option<Variant>>;

    async fn get_variant(&self, product_info_id: i64) -> CatalogResult<Option<Variant>>;

    /// Atomically subtract `quantity` from a variant's stock if enough is left.
    /// Returns `false` when nothing was decremented.
    async fn decrement_stock(&self, product_info_id: i64, quantity: i64) -> CatalogResult<bool>;

    async fn stats(&self) -> CatalogResult<CatalogStats>;
}

#[derive(Debug, Default)]
struct CatalogTables {
    next_id: i64,
    shops: BTreeMap<i64, Shop>,
    categories: BTreeMap<i64, Category>,
    category_shops: BTreeSet<(i64, i64)>,
    products: BTreeMap<i64, Product>,
    product_infos: BTreeMap<i64, ProductInfo>,
    parameters: BTreeMap<i64, Parameter>,
    product_parameters: BTreeMap<i64, ProductParameter>,
}

impl CatalogTables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn variant(&self, info: &ProductInfo) -> Option<Variant> {
        let product = self.products.get(&info.product_id)?;
        let shop = self.shops.get(&info.shop_id)?;
        Some(Variant {
            product_info_id: info.id,
            product_id: product.id,
            product_name: product.name.clone(),
            shop_id: shop.id,
            shop_name: shop.name.clone(),
            quantity: info.quantity,
            price_rrc: info.price_rrc,
        })
    }

    fn list_item(&self, info: &ProductInfo) -> Option<ProductListItem> {
        let product = self.products.get(&info.product_id)?;
        let shop = self.shops.get(&info.shop_id)?;
        let category = self.categories.get(&product.category_id)?;

        let mut parameters: Vec<ParameterValue> = self
            .product_parameters
            .values()
            .filter(|pp| pp.product_info_id == info.id)
            .filter_map(|pp| {
                self.parameters.get(&pp.parameter_id).map(|p| ParameterValue {
                    name: p.name.clone(),
                    value: pp.value.clone(),
                })
            })
            .collect();
        parameters.sort_by(|a, b| a.name.cmp(&b.name));

        Some(ProductListItem {
            id: info.id,
            model: info.model.clone(),
            quantity: info.quantity,
            price_rrc: info.price_rrc,
            shop: ShopRef {
                id: shop.id,
                name: shop.name.clone(),
            },
            product: ProductRef {
                id: product.id,
                name: product.name.clone(),
                category: category.name.clone(),
            },
            parameters,
        })
    }
}

fn matches_search(item: &ProductListItem, needle: &str) -> bool {
    [
        &item.model,
        &item.product.name,
        &item.shop.name,
        &item.product.category,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

fn compare_items(a: &ProductListItem, b: &ProductListItem, ordering: ProductOrdering) -> Ordering {
    let ord = match ordering.field {
        ProductSortField::Model => a.model.cmp(&b.model),
        ProductSortField::ProductName => a.product.name.cmp(&b.product.name),
        ProductSortField::ShopName => a.shop.name.cmp(&b.shop.name),
        ProductSortField::CategoryName => a.product.category.cmp(&b.product.category),
        ProductSortField::PriceRrc => a.price_rrc.cmp(&b.price_rrc),
        ProductSortField::Quantity => a.quantity.cmp(&b.quantity),
    };
    if ordering.descending { ord.reverse() } else { ord }
}

/// In-memory implementation of CatalogRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalogRepository {
    tables: Arc<RwLock<CatalogTables>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn upsert_shop(&self, name: &str, owner_id: i64, url: &str) -> CatalogResult<Shop> {
        let mut tables = self.tables.write().await;

        if let Some(shop) = tables
            .shops
            .values_mut()
            .find(|s| s.name == name && s.user_id == Some(owner_id))
        {
            shop.url = Some(url.to_string());
            return Ok(shop.clone());
        }

        let shop = Shop {
            id: tables.allocate_id(),
            name: name.to_string(),
            user_id: Some(owner_id),
            url: Some(url.to_string()),
        };
        tables.shops.insert(shop.id, shop.clone());
        Ok(shop)
    }

    async fn upsert_category(&self, external_id: i64, name: &str) -> CatalogResult<Category> {
        let mut tables = self.tables.write().await;

        if let Some(category) = tables
            .categories
            .values()
            .find(|c| c.external_id == external_id && c.name == name)
        {
            return Ok(category.clone());
        }

        let category = Category {
            id: tables.allocate_id(),
            external_id,
            name: name.to_string(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn set_category_shop(&self, category_id: i64, shop_id: i64) -> CatalogResult<()> {
        let mut tables = self.tables.write().await;
        tables.category_shops.retain(|(c, _)| *c != category_id);
        tables.category_shops.insert((category_id, shop_id));
        Ok(())
    }

    async fn upsert_product(&self, name: &str, category_id: i64) -> CatalogResult<Product> {
        let mut tables = self.tables.write().await;

        if let Some(product) = tables
            .products
            .values()
            .find(|p| p.name == name && p.category_id == category_id)
        {
            return Ok(product.clone());
        }

        let product = Product {
            id: tables.allocate_id(),
            name: name.to_string(),
            category_id,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn upsert_product_info(&self, info: ProductInfoUpsert) -> CatalogResult<ProductInfo> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables.product_infos.values_mut().find(|pi| {
            pi.shop_id == info.shop_id && pi.external_id == info.external_id && pi.model == info.model
        }) {
            existing.product_id = info.product_id;
            existing.quantity = info.quantity;
            existing.price = info.price;
            existing.price_rrc = info.price_rrc;
            return Ok(existing.clone());
        }

        let created = ProductInfo {
            id: tables.allocate_id(),
            model: info.model,
            external_id: info.external_id,
            product_id: info.product_id,
            shop_id: info.shop_id,
            quantity: info.quantity,
            price: info.price,
            price_rrc: info.price_rrc,
        };
        tables.product_infos.insert(created.id, created.clone());
        Ok(created)
    }

    async fn upsert_parameter(&self, name: &str) -> CatalogResult<Parameter> {
        let mut tables = self.tables.write().await;

        if let Some(parameter) = tables.parameters.values().find(|p| p.name == name) {
            return Ok(parameter.clone());
        }

        let parameter = Parameter {
            id: tables.allocate_id(),
            name: name.to_string(),
        };
        tables.parameters.insert(parameter.id, parameter.clone());
        Ok(parameter)
    }

    async fn upsert_product_parameter(
        &self,
        product_info_id: i64,
        parameter_id: i64,
        value: &str,
    ) -> CatalogResult<ProductParameter> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables
            .product_parameters
            .values_mut()
            .find(|pp| pp.product_info_id == product_info_id && pp.parameter_id == parameter_id)
        {
            existing.value = value.to_string();
            return Ok(existing.clone());
        }

        let created = ProductParameter {
            id: tables.allocate_id(),
            product_info_id,
            parameter_id,
            value: value.to_string(),
        };
        tables.product_parameters.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_products(&self, query: &ProductQuery) -> CatalogResult<ProductPage> {
        let tables = self.tables.read().await;
        let needle = query.search_term().map(str::to_lowercase);
        let orderings = query.orderings();

        let mut items: Vec<ProductListItem> = tables
            .product_infos
            .values()
            .filter_map(|info| tables.list_item(info))
            .filter(|item| needle.as_deref().is_none_or(|n| matches_search(item, n)))
            .collect();

        items.sort_by(|a, b| {
            orderings
                .iter()
                .map(|o| compare_items(a, b, *o))
                .find(|ord| ord.is_ne())
                .unwrap_or_else(|| a.id.cmp(&b.id))
        });

        let total = items.len() as u64;
        let limit = query.limit();
        let offset = query.offset();
        let items = items
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(ProductPage {
            items,
            total,
            limit,
            offset,
        })
    }

    async fn list_shops(&self) -> CatalogResult<Vec<Shop>> {
        let tables = self.tables.read().await;
        let mut shops: Vec<Shop> = tables.shops.values().cloned().collect();
        shops.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(shops)
    }

    async fn list_shops_by_owner(&self, owner_id: i64) -> CatalogResult<Vec<Shop>> {
        let tables = self.tables.read().await;
        Ok(tables
            .shops
            .values()
            .filter(|s| s.user_id == Some(owner_id))
            .cloned()
            .collect())
    }

    async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn get_product(&self, id: i64) -> CatalogResult<Option<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products.get(&id).cloned())
    }

    async fn find_variant(&self, product_id: i64, shop_id: i64) -> CatalogResult<Option<Variant>> {
        let tables = self.tables.read().await;
        Ok(tables
            .product_infos
            .values()
            .find(|pi| pi.product_id == product_id && pi.shop_id == shop_id)
            .and_then(|pi| tables.variant(pi)))
    }

    async fn get_variant(&self, product_info_id: i64) -> CatalogResult<Option<Variant>> {
        let tables = self.tables.read().await;
        Ok(tables
            .product_infos
            .get(&product_info_id)
            .and_then(|pi| tables.variant(pi)))
    }

    async fn decrement_stock(&self, product_info_id: i64, quantity: i64) -> CatalogResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.product_infos.get_mut(&product_info_id) {
            Some(info) if info.quantity >= quantity => {
                info.quantity -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn stats(&self) -> CatalogResult<CatalogStats> {
        let tables = self.tables.read().await;
        Ok(CatalogStats {
            shops: tables.shops.len() as i64,
            categories: tables.categories.len() as i64,
            products: tables.products.len() as i64,
            product_infos: tables.product_infos.len() as i64,
            parameters: tables.parameters.len() as i64,
            product_parameters: tables.product_parameters.len() as i64,
        })
    }
}
