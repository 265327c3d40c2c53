use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{OrderError, OrderResult};
use crate::models::{NewOrderItem, Order, OrderItem, OrderStatus};

/// Repository trait for orders and their items
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// The caller's open (`new`) order for this contact, created if missing
    async fn get_or_create_open_order(&self, user_id: i64, contact_id: i64) -> OrderResult<Order>;

    async fn get_order(&self, id: i64) -> OrderResult<Option<Order>>;

    /// Orders of one user with the sum of their item totals, newest first
    async fn list_orders_with_totals(&self, user_id: i64) -> OrderResult<Vec<(Order, i64)>>;

    /// Compare-and-set of the order status. Returns `false` if the stored
    /// status was not `from`.
    async fn transition_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> OrderResult<bool>;

    async fn get_item(&self, id: i64) -> OrderResult<Option<OrderItem>>;

    /// The order's line for one shop variant, if any
    async fn find_item(&self, order_id: i64, product_info_id: i64)
    -> OrderResult<Option<OrderItem>>;

    async fn create_item(&self, item: NewOrderItem) -> OrderResult<OrderItem>;

    /// Set quantity and unit price, recomputing the line total
    async fn update_item_quantity(&self, id: i64, quantity: i64, price: i64)
    -> OrderResult<OrderItem>;

    /// Items of one order, newest first
    async fn list_items(&self, order_id: i64) -> OrderResult<Vec<OrderItem>>;

    /// Items of the user's open orders, newest first
    async fn list_open_items(&self, user_id: i64) -> OrderResult<Vec<OrderItem>>;

    async fn delete_item(&self, id: i64) -> OrderResult<bool>;
}

#[derive(Debug, Default)]
struct OrderTables {
    next_order_id: i64,
    next_item_id: i64,
    orders: BTreeMap<i64, Order>,
    items: BTreeMap<i64, OrderItem>,
}

/// In-memory implementation of OrderRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryOrderRepository {
    tables: Arc<RwLock<OrderTables>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn get_or_create_open_order(&self, user_id: i64, contact_id: i64) -> OrderResult<Order> {
        let mut tables = self.tables.write().await;

        if let Some(order) = tables.orders.values().find(|o| {
            o.user_id == user_id && o.contact_id == contact_id && o.status == OrderStatus::New
        }) {
            return Ok(order.clone());
        }

        tables.next_order_id += 1;
        let order = Order {
            id: tables.next_order_id,
            user_id,
            contact_id,
            status: OrderStatus::New,
            dt: Utc::now(),
        };
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: i64) -> OrderResult<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&id).cloned())
    }

    async fn list_orders_with_totals(&self, user_id: i64) -> OrderResult<Vec<(Order, i64)>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<(Order, i64)> = tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .map(|o| {
                let total = tables
                    .items
                    .values()
                    .filter(|i| i.order_id == o.id)
                    .map(|i| i.total_price)
                    .sum();
                (o.clone(), total)
            })
            .collect();
        orders.sort_by(|(a, _), (b, _)| b.dt.cmp(&a.dt).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn transition_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> OrderResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.orders.get_mut(&id) {
            Some(order) if order.status == from => {
                order.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_item(&self, id: i64) -> OrderResult<Option<OrderItem>> {
        let tables = self.tables.read().await;
        Ok(tables.items.get(&id).cloned())
    }

    async fn find_item(
        &self,
        order_id: i64,
        product_info_id: i64,
    ) -> OrderResult<Option<OrderItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .find(|i| i.order_id == order_id && i.product_info_id == product_info_id)
            .cloned())
    }

    async fn create_item(&self, item: NewOrderItem) -> OrderResult<OrderItem> {
        let mut tables = self.tables.write().await;

        if tables
            .items
            .values()
            .any(|i| i.order_id == item.order_id && i.product_info_id == item.product_info_id)
        {
            return Err(OrderError::Internal(format!(
                "Order {} already has an item for variant {}",
                item.order_id, item.product_info_id
            )));
        }

        tables.next_item_id += 1;
        let created = OrderItem {
            id: tables.next_item_id,
            order_id: item.order_id,
            product_id: item.product_id,
            shop_id: item.shop_id,
            product_info_id: item.product_info_id,
            quantity: item.quantity,
            price: item.price,
            total_price: item.quantity * item.price,
        };
        tables.items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_item_quantity(
        &self,
        id: i64,
        quantity: i64,
        price: i64,
    ) -> OrderResult<OrderItem> {
        let mut tables = self.tables.write().await;
        let item = tables
            .items
            .get_mut(&id)
            .ok_or(OrderError::ItemNotFound(id))?;

        item.quantity = quantity;
        item.price = price;
        item.total_price = quantity * price;
        Ok(item.clone())
    }

    async fn list_items(&self, order_id: i64) -> OrderResult<Vec<OrderItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .rev()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn list_open_items(&self, user_id: i64) -> OrderResult<Vec<OrderItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .rev()
            .filter(|i| {
                tables
                    .orders
                    .get(&i.order_id)
                    .is_some_and(|o| o.user_id == user_id && o.status.is_open())
            })
            .cloned()
            .collect())
    }

    async fn delete_item(&self, id: i64) -> OrderResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.items.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(order_id: i64, product_id: i64, quantity: i64) -> NewOrderItem {
        NewOrderItem {
            order_id,
            product_id,
            shop_id: 1,
            product_info_id: product_id * 10,
            quantity,
            price: 100,
        }
    }

    #[tokio::test]
    async fn test_open_order_is_reused_per_contact() {
        let repo = InMemoryOrderRepository::new();

        let first = repo.get_or_create_open_order(1, 5).await.unwrap();
        let again = repo.get_or_create_open_order(1, 5).await.unwrap();
        let other_contact = repo.get_or_create_open_order(1, 6).await.unwrap();

        assert_eq!(first.id, again.id);
        assert_ne!(first.id, other_contact.id);
        assert_eq!(first.status, OrderStatus::New);
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let repo = InMemoryOrderRepository::new();
        let order = repo.get_or_create_open_order(1, 5).await.unwrap();

        assert!(repo
            .transition_status(order.id, OrderStatus::New, OrderStatus::Confirmed)
            .await
            .unwrap());
        assert!(!repo
            .transition_status(order.id, OrderStatus::New, OrderStatus::Confirmed)
            .await
            .unwrap());

        // Confirmed orders no longer count as the open order.
        let next = repo.get_or_create_open_order(1, 5).await.unwrap();
        assert_ne!(next.id, order.id);
    }

    #[tokio::test]
    async fn test_items_are_keyed_by_variant() {
        let repo = InMemoryOrderRepository::new();
        let order = repo.get_or_create_open_order(1, 5).await.unwrap();

        let first_shop = repo.create_item(new_item(order.id, 1, 2)).await.unwrap();
        let second_shop = repo
            .create_item(NewOrderItem {
                shop_id: 2,
                product_info_id: 11,
                ..new_item(order.id, 1, 4)
            })
            .await
            .unwrap();
        assert_ne!(first_shop.id, second_shop.id);

        let found = repo.find_item(order.id, 11).await.unwrap().unwrap();
        assert_eq!(found.id, second_shop.id);
        assert_eq!(found.shop_id, 2);
        assert!(repo.find_item(order.id, 12).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_items_and_totals() {
        let repo = InMemoryOrderRepository::new();
        let order = repo.get_or_create_open_order(1, 5).await.unwrap();

        let a = repo.create_item(new_item(order.id, 1, 2)).await.unwrap();
        let b = repo.create_item(new_item(order.id, 2, 1)).await.unwrap();
        assert_eq!(a.total_price, 200);
        assert!(repo.create_item(new_item(order.id, 1, 1)).await.is_err());

        let a = repo.update_item_quantity(a.id, 3, 120).await.unwrap();
        assert_eq!(a.total_price, 360);

        let items = repo.list_items(order.id).await.unwrap();
        assert_eq!(items[0].id, b.id);

        let orders = repo.list_orders_with_totals(1).await.unwrap();
        assert_eq!(orders, vec![(order.clone(), 460)]);

        assert_eq!(repo.list_open_items(1).await.unwrap().len(), 2);
        assert!(repo.list_open_items(2).await.unwrap().is_empty());

        assert!(repo.delete_item(a.id).await.unwrap());
        assert!(!repo.delete_item(a.id).await.unwrap());
    }
}
