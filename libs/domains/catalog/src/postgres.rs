use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement,
    TransactionTrait, Value,
};
use std::collections::HashMap;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    CatalogStats, Category, Parameter, ParameterValue, Product, ProductInfo, ProductInfoUpsert,
    ProductListItem, ProductOrdering, ProductPage, ProductParameter, ProductQuery, ProductRef,
    ProductSortField, Shop, ShopRef, Variant,
};
use crate::repository::CatalogRepository;

fn db_error(e: DbErr) -> CatalogError {
    CatalogError::Internal(format!("Database error: {}", e))
}

fn missing_row(table: &str) -> CatalogError {
    CatalogError::Internal(format!("Upsert into {} returned no row", table))
}

/// PostgreSQL implementation of CatalogRepository.
///
/// Upserts are single `INSERT ... ON CONFLICT` statements against the
/// unique indexes created by the catalog migration.
#[derive(Clone)]
pub struct PgCatalogRepository {
    db: DatabaseConnection,
}

impl PgCatalogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromQueryResult)]
struct ShopRow {
    id: i64,
    name: String,
    user_id: Option<i64>,
    url: Option<String>,
}

impl From<ShopRow> for Shop {
    fn from(row: ShopRow) -> Self {
        Shop {
            id: row.id,
            name: row.name,
            user_id: row.user_id,
            url: row.url,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct CategoryRow {
    id: i64,
    external_id: i64,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            external_id: row.external_id,
            name: row.name,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct ProductRow {
    id: i64,
    name: String,
    category_id: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            category_id: row.category_id,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct ProductInfoRow {
    id: i64,
    model: String,
    external_id: i64,
    product_id: i64,
    shop_id: i64,
    quantity: i64,
    price: i64,
    price_rrc: i64,
}

impl From<ProductInfoRow> for ProductInfo {
    fn from(row: ProductInfoRow) -> Self {
        ProductInfo {
            id: row.id,
            model: row.model,
            external_id: row.external_id,
            product_id: row.product_id,
            shop_id: row.shop_id,
            quantity: row.quantity,
            price: row.price,
            price_rrc: row.price_rrc,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct ParameterRow {
    id: i64,
    name: String,
}

#[derive(Debug, FromQueryResult)]
struct ProductParameterRow {
    id: i64,
    product_info_id: i64,
    parameter_id: i64,
    value: String,
}

#[derive(Debug, FromQueryResult)]
struct VariantRow {
    product_info_id: i64,
    product_id: i64,
    product_name: String,
    shop_id: i64,
    shop_name: String,
    quantity: i64,
    price_rrc: i64,
}

impl From<VariantRow> for Variant {
    fn from(row: VariantRow) -> Self {
        Variant {
            product_info_id: row.product_info_id,
            product_id: row.product_id,
            product_name: row.product_name,
            shop_id: row.shop_id,
            shop_name: row.shop_name,
            quantity: row.quantity,
            price_rrc: row.price_rrc,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct ListingRow {
    id: i64,
    model: String,
    quantity: i64,
    price_rrc: i64,
    shop_id: i64,
    shop_name: String,
    product_id: i64,
    product_name: String,
    category_name: String,
}

#[derive(Debug, FromQueryResult)]
struct ListingParameterRow {
    product_info_id: i64,
    name: String,
    value: String,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct StatsRow {
    shops: i64,
    categories: i64,
    products: i64,
    product_infos: i64,
    parameters: i64,
    product_parameters: i64,
}

const VARIANT_SELECT: &str = r#"
    SELECT pi.id AS product_info_id, pi.product_id, p.name AS product_name,
           pi.shop_id, s.name AS shop_name, pi.quantity, pi.price_rrc
    FROM product_infos pi
    JOIN products p ON p.id = pi.product_id
    JOIN shops s ON s.id = pi.shop_id
"#;

const LISTING_FROM: &str = r#"
    FROM product_infos pi
    JOIN products p ON p.id = pi.product_id
    JOIN shops s ON s.id = pi.shop_id
    JOIN categories c ON c.id = p.category_id
    WHERE ($1::text IS NULL
        OR pi.model ILIKE $1 ESCAPE '\'
        OR p.name ILIKE $1 ESCAPE '\'
        OR s.name ILIKE $1 ESCAPE '\'
        OR c.name ILIKE $1 ESCAPE '\')
"#;

fn sort_column(field: ProductSortField) -> &'static str {
    match field {
        ProductSortField::Model => "pi.model",
        ProductSortField::ProductName => "p.name",
        ProductSortField::ShopName => "s.name",
        ProductSortField::CategoryName => "c.name",
        ProductSortField::PriceRrc => "pi.price_rrc",
        ProductSortField::Quantity => "pi.quantity",
    }
}

/// ORDER BY built only from whitelisted columns
fn order_by_clause(orderings: &[ProductOrdering]) -> String {
    let mut parts: Vec<String> = orderings
        .iter()
        .map(|o| {
            let direction = if o.descending { "DESC" } else { "ASC" };
            format!("{} {}", sort_column(o.field), direction)
        })
        .collect();
    parts.push("pi.id ASC".to_string());
    parts.join(", ")
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl PgCatalogRepository {
    async fn parameters_for(
        &self,
        product_info_ids: &[i64],
    ) -> CatalogResult<HashMap<i64, Vec<ParameterValue>>> {
        let mut grouped: HashMap<i64, Vec<ParameterValue>> = HashMap::new();
        if product_info_ids.is_empty() {
            return Ok(grouped);
        }

        let placeholders: Vec<String> = (1..=product_info_ids.len())
            .map(|i| format!("${}", i))
            .collect();
        let sql = format!(
            r#"
            SELECT pp.product_info_id, pa.name, pp.value
            FROM product_parameters pp
            JOIN parameters pa ON pa.id = pp.parameter_id
            WHERE pp.product_info_id IN ({})
            ORDER BY pa.name
            "#,
            placeholders.join(", ")
        );
        let values: Vec<Value> = product_info_ids.iter().map(|id| (*id).into()).collect();
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, values);

        let rows = ListingParameterRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        for row in rows {
            grouped
                .entry(row.product_info_id)
                .or_default()
                .push(ParameterValue {
                    name: row.name,
                    value: row.value,
                });
        }
        Ok(grouped)
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn upsert_shop(&self, name: &str, owner_id: i64, url: &str) -> CatalogResult<Shop> {
        let sql = r#"
            INSERT INTO shops (name, user_id, url)
            VALUES ($1, $2, $3)
            ON CONFLICT (name, user_id) DO UPDATE SET url = EXCLUDED.url
            RETURNING id, name, user_id, url
        "#;
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [name.into(), owner_id.into(), url.into()],
        );

        ShopRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(Shop::from)
            .ok_or_else(|| missing_row("shops"))
    }

    async fn upsert_category(&self, external_id: i64, name: &str) -> CatalogResult<Category> {
        // DO UPDATE (not DO NOTHING) so RETURNING yields the existing row.
        let sql = r#"
            INSERT INTO categories (external_id, name)
            VALUES ($1, $2)
            ON CONFLICT (external_id, name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, external_id, name
        "#;
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [external_id.into(), name.into()],
        );

        CategoryRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(Category::from)
            .ok_or_else(|| missing_row("categories"))
    }

    async fn set_category_shop(&self, category_id: i64, shop_id: i64) -> CatalogResult<()> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM category_shops WHERE category_id = $1",
            [category_id.into()],
        );
        txn.execute_raw(stmt).await.map_err(db_error)?;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "INSERT INTO category_shops (category_id, shop_id) VALUES ($1, $2)",
            [category_id.into(), shop_id.into()],
        );
        txn.execute_raw(stmt).await.map_err(db_error)?;

        txn.commit().await.map_err(db_error)
    }

    async fn upsert_product(&self, name: &str, category_id: i64) -> CatalogResult<Product> {
        let sql = r#"
            INSERT INTO products (name, category_id)
            VALUES ($1, $2)
            ON CONFLICT (name, category_id) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, category_id
        "#;
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [name.into(), category_id.into()],
        );

        ProductRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(Product::from)
            .ok_or_else(|| missing_row("products"))
    }

    async fn upsert_product_info(&self, info: ProductInfoUpsert) -> CatalogResult<ProductInfo> {
        let sql = r#"
            INSERT INTO product_infos (model, external_id, product_id, shop_id, quantity, price, price_rrc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (shop_id, external_id, model) DO UPDATE
            SET product_id = EXCLUDED.product_id,
                quantity = EXCLUDED.quantity,
                price = EXCLUDED.price,
                price_rrc = EXCLUDED.price_rrc
            RETURNING id, model, external_id, product_id, shop_id, quantity, price, price_rrc
        "#;
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                info.model.into(),
                info.external_id.into(),
                info.product_id.into(),
                info.shop_id.into(),
                info.quantity.into(),
                info.price.into(),
                info.price_rrc.into(),
            ],
        );

        ProductInfoRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(ProductInfo::from)
            .ok_or_else(|| missing_row("product_infos"))
    }

    async fn upsert_parameter(&self, name: &str) -> CatalogResult<Parameter> {
        let sql = r#"
            INSERT INTO parameters (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
        "#;
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [name.into()]);

        ParameterRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(|row| Parameter {
                id: row.id,
                name: row.name,
            })
            .ok_or_else(|| missing_row("parameters"))
    }

    async fn upsert_product_parameter(
        &self,
        product_info_id: i64,
        parameter_id: i64,
        value: &str,
    ) -> CatalogResult<ProductParameter> {
        let sql = r#"
            INSERT INTO product_parameters (product_info_id, parameter_id, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_info_id, parameter_id) DO UPDATE SET value = EXCLUDED.value
            RETURNING id, product_info_id, parameter_id, value
        "#;
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [product_info_id.into(), parameter_id.into(), value.into()],
        );

        ProductParameterRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(|row| ProductParameter {
                id: row.id,
                product_info_id: row.product_info_id,
                parameter_id: row.parameter_id,
                value: row.value,
            })
            .ok_or_else(|| missing_row("product_parameters"))
    }

    async fn list_products(&self, query: &ProductQuery) -> CatalogResult<ProductPage> {
        let pattern: Option<String> = query.search_term().map(like_pattern);
        let limit = query.limit();
        let offset = query.offset();

        let count_sql = format!("SELECT COUNT(*) AS total {LISTING_FROM}");
        let stmt =
            Statement::from_sql_and_values(DbBackend::Postgres, count_sql, [pattern.clone().into()]);
        let total = CountRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(|r| r.total)
            .unwrap_or(0);

        let sql = format!(
            r#"
            SELECT pi.id, pi.model, pi.quantity, pi.price_rrc,
                   s.id AS shop_id, s.name AS shop_name,
                   p.id AS product_id, p.name AS product_name,
                   c.name AS category_name
            {LISTING_FROM}
            ORDER BY {}
            LIMIT $2 OFFSET $3
            "#,
            order_by_clause(&query.orderings())
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [pattern.into(), (limit as i64).into(), (offset as i64).into()],
        );
        let rows = ListingRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut parameters = self.parameters_for(&ids).await?;

        let items = rows
            .into_iter()
            .map(|row| ProductListItem {
                id: row.id,
                model: row.model,
                quantity: row.quantity,
                price_rrc: row.price_rrc,
                shop: ShopRef {
                    id: row.shop_id,
                    name: row.shop_name,
                },
                product: ProductRef {
                    id: row.product_id,
                    name: row.product_name,
                    category: row.category_name,
                },
                parameters: parameters.remove(&row.id).unwrap_or_default(),
            })
            .collect();

        Ok(ProductPage {
            items,
            total: total as u64,
            limit,
            offset,
        })
    }

    async fn list_shops(&self) -> CatalogResult<Vec<Shop>> {
        let stmt = Statement::from_string(
            DbBackend::Postgres,
            "SELECT id, name, user_id, url FROM shops ORDER BY name, id",
        );

        let rows = ShopRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Shop::from).collect())
    }

    async fn list_shops_by_owner(&self, owner_id: i64) -> CatalogResult<Vec<Shop>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT id, name, user_id, url FROM shops WHERE user_id = $1 ORDER BY id",
            [owner_id.into()],
        );

        let rows = ShopRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Shop::from).collect())
    }

    async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        let stmt = Statement::from_string(
            DbBackend::Postgres,
            "SELECT id, external_id, name FROM categories ORDER BY name, id",
        );

        let rows = CategoryRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_product(&self, id: i64) -> CatalogResult<Option<Product>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT id, name, category_id FROM products WHERE id = $1",
            [id.into()],
        );

        let row = ProductRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?;
        Ok(row.map(Product::from))
    }

    async fn find_variant(&self, product_id: i64, shop_id: i64) -> CatalogResult<Option<Variant>> {
        let sql = format!(
            "{VARIANT_SELECT} WHERE pi.product_id = $1 AND pi.shop_id = $2 ORDER BY pi.id LIMIT 1"
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [product_id.into(), shop_id.into()],
        );

        let row = VariantRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?;
        Ok(row.map(Variant::from))
    }

    async fn get_variant(&self, product_info_id: i64) -> CatalogResult<Option<Variant>> {
        let sql = format!("{VARIANT_SELECT} WHERE pi.id = $1");
        let stmt =
            Statement::from_sql_and_values(DbBackend::Postgres, sql, [product_info_id.into()]);

        let row = VariantRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?;
        Ok(row.map(Variant::from))
    }

    async fn decrement_stock(&self, product_info_id: i64, quantity: i64) -> CatalogResult<bool> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE product_infos SET quantity = quantity - $2 WHERE id = $1 AND quantity >= $2",
            [product_info_id.into(), quantity.into()],
        );

        let result = self.db.execute_raw(stmt).await.map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> CatalogResult<CatalogStats> {
        let stmt = Statement::from_string(
            DbBackend::Postgres,
            r#"
            SELECT
                (SELECT COUNT(*) FROM shops) AS shops,
                (SELECT COUNT(*) FROM categories) AS categories,
                (SELECT COUNT(*) FROM products) AS products,
                (SELECT COUNT(*) FROM product_infos) AS product_infos,
                (SELECT COUNT(*) FROM parameters) AS parameters,
                (SELECT COUNT(*) FROM product_parameters) AS product_parameters
            "#,
        );

        let row = StatsRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or_else(|| CatalogError::Internal("Stats query returned no row".to_string()))?;

        Ok(CatalogStats {
            shops: row.shops,
            categories: row.categories,
            products: row.products,
            product_infos: row.product_infos,
            parameters: row.parameters,
            product_parameters: row.product_parameters,
        })
    }
}
