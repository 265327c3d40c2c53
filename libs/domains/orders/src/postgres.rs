use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement,
    TransactionTrait,
};

use crate::error::{OrderError, OrderResult};
use crate::models::{NewOrderItem, Order, OrderItem, OrderStatus};
use crate::repository::OrderRepository;

fn db_error(e: DbErr) -> OrderError {
    OrderError::Internal(format!("Database error: {}", e))
}

/// PostgreSQL implementation of OrderRepository using SeaORM raw statements
#[derive(Clone)]
pub struct PgOrderRepository {
    db: DatabaseConnection,
}

impl PgOrderRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromQueryResult)]
struct OrderRow {
    id: i64,
    user_id: i64,
    contact_id: i64,
    status: String,
    dt: chrono::DateTime<chrono::Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            user_id: row.user_id,
            contact_id: row.contact_id,
            status: row.status.parse().unwrap_or_default(),
            dt: row.dt,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct OrderTotalRow {
    id: i64,
    user_id: i64,
    contact_id: i64,
    status: String,
    dt: chrono::DateTime<chrono::Utc>,
    total_sum: i64,
}

#[derive(Debug, FromQueryResult)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    shop_id: i64,
    product_info_id: i64,
    quantity: i64,
    price: i64,
    total_price: i64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            shop_id: row.shop_id,
            product_info_id: row.product_info_id,
            quantity: row.quantity,
            price: row.price,
            total_price: row.total_price,
        }
    }
}

const ORDER_COLUMNS: &str = "id, user_id, contact_id, status, dt";
const ITEM_COLUMNS: &str =
    "id, order_id, product_id, shop_id, product_info_id, quantity, price, total_price";

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn get_or_create_open_order(&self, user_id: i64, contact_id: i64) -> OrderResult<Order> {
        let txn = self.db.begin().await.map_err(db_error)?;

        // Serializes basket creation per user so two requests share one order.
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT pg_advisory_xact_lock($1)",
            [user_id.into()],
        );
        txn.execute_raw(stmt).await.map_err(db_error)?;

        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE user_id = $1 AND contact_id = $2 AND status = 'new'
            ORDER BY id
            LIMIT 1
            "#
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [user_id.into(), contact_id.into()],
        );
        let existing = OrderRow::find_by_statement(stmt)
            .one(&txn)
            .await
            .map_err(db_error)?;

        let row = match existing {
            Some(row) => row,
            None => {
                let sql = format!(
                    "INSERT INTO orders (user_id, contact_id, status) VALUES ($1, $2, 'new') RETURNING {ORDER_COLUMNS}"
                );
                let stmt = Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    sql,
                    [user_id.into(), contact_id.into()],
                );
                OrderRow::find_by_statement(stmt)
                    .one(&txn)
                    .await
                    .map_err(db_error)?
                    .ok_or_else(|| OrderError::Internal("Failed to create order".to_string()))?
            }
        };

        txn.commit().await.map_err(db_error)?;
        Ok(row.into())
    }

    async fn get_order(&self, id: i64) -> OrderResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        let row = OrderRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?;
        Ok(row.map(Order::from))
    }

    async fn list_orders_with_totals(&self, user_id: i64) -> OrderResult<Vec<(Order, i64)>> {
        let sql = r#"
            SELECT o.id, o.user_id, o.contact_id, o.status, o.dt,
                   COALESCE(SUM(oi.total_price), 0)::BIGINT AS total_sum
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            WHERE o.user_id = $1
            GROUP BY o.id
            ORDER BY o.dt DESC, o.id DESC
        "#;
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [user_id.into()]);

        let rows = OrderTotalRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let total = row.total_sum;
                let order = Order {
                    id: row.id,
                    user_id: row.user_id,
                    contact_id: row.contact_id,
                    status: row.status.parse().unwrap_or_default(),
                    dt: row.dt,
                };
                (order, total)
            })
            .collect())
    }

    async fn transition_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> OrderResult<bool> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE orders SET status = $3 WHERE id = $1 AND status = $2",
            [id.into(), from.to_string().into(), to.to_string().into()],
        );

        let result = self.db.execute_raw(stmt).await.map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_item(&self, id: i64) -> OrderResult<Option<OrderItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE id = $1");
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        let row = OrderItemRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?;
        Ok(row.map(OrderItem::from))
    }

    async fn find_item(
        &self,
        order_id: i64,
        product_info_id: i64,
    ) -> OrderResult<Option<OrderItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 AND product_info_id = $2"
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [order_id.into(), product_info_id.into()],
        );

        let row = OrderItemRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?;
        Ok(row.map(OrderItem::from))
    }

    async fn create_item(&self, item: NewOrderItem) -> OrderResult<OrderItem> {
        let sql = format!(
            r#"
            INSERT INTO order_items (order_id, product_id, shop_id, product_info_id, quantity, price, total_price)
            VALUES ($1, $2, $3, $4, $5, $6, $5 * $6)
            RETURNING {ITEM_COLUMNS}
            "#
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                item.order_id.into(),
                item.product_id.into(),
                item.shop_id.into(),
                item.product_info_id.into(),
                item.quantity.into(),
                item.price.into(),
            ],
        );

        OrderItemRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(OrderItem::from)
            .ok_or_else(|| OrderError::Internal("Failed to create order item".to_string()))
    }

    async fn update_item_quantity(
        &self,
        id: i64,
        quantity: i64,
        price: i64,
    ) -> OrderResult<OrderItem> {
        let sql = format!(
            r#"
            UPDATE order_items
            SET quantity = $2, price = $3, total_price = $2 * $3
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [id.into(), quantity.into(), price.into()],
        );

        OrderItemRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(OrderItem::from)
            .ok_or(OrderError::ItemNotFound(id))
    }

    async fn list_items(&self, order_id: i64) -> OrderResult<Vec<OrderItem>> {
        let sql =
            format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id DESC");
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [order_id.into()]);

        let rows = OrderItemRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn list_open_items(&self, user_id: i64) -> OrderResult<Vec<OrderItem>> {
        let sql = r#"
            SELECT oi.id, oi.order_id, oi.product_id, oi.shop_id, oi.product_info_id,
                   oi.quantity, oi.price, oi.total_price
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = $1 AND o.status IN ('basket', 'new')
            ORDER BY oi.id DESC
        "#;
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [user_id.into()]);

        let rows = OrderItemRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn delete_item(&self, id: i64) -> OrderResult<bool> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM order_items WHERE id = $1",
            [id.into()],
        );

        let result = self.db.execute_raw(stmt).await.map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

// Needs Docker: cargo test -p domain_orders -- --ignored
#[cfg(test)]
mod tests {
    use super::*;
    use domain_catalog::{CatalogRepository, PgCatalogRepository, ProductInfoUpsert};
    use domain_users::{ContactRepository, CreateContact, PgContactRepository};
    use test_utils::TestDatabase;

    #[tokio::test]
    #[ignore]
    async fn test_pg_order_lifecycle() {
        let db = TestDatabase::new().await;
        let buyer = db.create_test_user("buyer@example.com", "buyer").await;
        let owner = db.create_test_user("shop@example.com", "shop").await;

        let contact = PgContactRepository::new(db.connection())
            .create(
                buyer,
                CreateContact {
                    city: "Moscow".to_string(),
                    street: "Arbat".to_string(),
                    phone: "+7000".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let catalog = PgCatalogRepository::new(db.connection());
        let shop = catalog.upsert_shop("Связной", owner, "https://a.example").await.unwrap();
        let category = catalog.upsert_category(1, "Phones").await.unwrap();
        let product = catalog.upsert_product("Phone", category.id).await.unwrap();
        let info = catalog
            .upsert_product_info(ProductInfoUpsert {
                product_id: product.id,
                shop_id: shop.id,
                external_id: 1,
                model: "phone".to_string(),
                quantity: 5,
                price: 10,
                price_rrc: 20,
            })
            .await
            .unwrap();

        let repo = PgOrderRepository::new(db.connection());
        let order = repo.get_or_create_open_order(buyer, contact.id).await.unwrap();
        assert_eq!(
            repo.get_or_create_open_order(buyer, contact.id).await.unwrap().id,
            order.id
        );

        let item = repo
            .create_item(NewOrderItem {
                order_id: order.id,
                product_id: product.id,
                shop_id: shop.id,
                product_info_id: info.id,
                quantity: 2,
                price: 20,
            })
            .await
            .unwrap();
        assert_eq!(item.total_price, 40);

        let item = repo.update_item_quantity(item.id, 3, 20).await.unwrap();
        assert_eq!(item.total_price, 60);
        assert_eq!(repo.list_open_items(buyer).await.unwrap().len(), 1);

        let orders = repo.list_orders_with_totals(buyer).await.unwrap();
        assert_eq!(orders[0].1, 60);

        assert!(repo
            .transition_status(order.id, OrderStatus::New, OrderStatus::Confirmed)
            .await
            .unwrap());
        assert!(!repo
            .transition_status(order.id, OrderStatus::New, OrderStatus::Confirmed)
            .await
            .unwrap());
        assert!(repo.list_open_items(buyer).await.unwrap().is_empty());

        assert!(repo.delete_item(item.id).await.unwrap());
        assert!(repo.get_item(item.id).await.unwrap().is_none());
    }
}
