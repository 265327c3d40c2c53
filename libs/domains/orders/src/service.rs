use axum_helpers::AuthUser;
use domain_catalog::{CatalogRepository, SHOP_ROLE, Variant};
use domain_notifications::{NotificationService, OrderReceipt, ReceiptLine};
use domain_users::ContactRepository;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{OrderError, OrderResult};
use crate::models::{
    AddOrderItemsRequest, CONFIRM_CHOICE, ConfirmOrderRequest, NewOrderItem, Order, OrderDetail,
    OrderItem, OrderItemView, OrderStatus, OrderSummary, ORDER_DT_FORMAT,
};
use crate::repository::OrderRepository;

/// Basket and order engine.
///
/// Every operation takes the calling principal explicitly. Stock lives in
/// the catalog; this service only reads it and applies conditional
/// decrements on confirmation.
pub struct OrderService<R: OrderRepository> {
    repository: Arc<R>,
    catalog: Arc<dyn CatalogRepository>,
    contacts: Arc<dyn ContactRepository>,
    notifications: Option<NotificationService>,
    operator_email: Option<String>,
}

impl<R: OrderRepository> Clone for OrderService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            catalog: Arc::clone(&self.catalog),
            contacts: Arc::clone(&self.contacts),
            notifications: self.notifications.clone(),
            operator_email: self.operator_email.clone(),
        }
    }
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(
        repository: R,
        catalog: Arc<dyn CatalogRepository>,
        contacts: Arc<dyn ContactRepository>,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            catalog,
            contacts,
            notifications: None,
            operator_email: None,
        }
    }

    /// Send receipts on confirmation; `operator_email` gets a copy when set.
    pub fn with_notifications(
        mut self,
        notifications: NotificationService,
        operator_email: Option<String>,
    ) -> Self {
        self.notifications = Some(notifications);
        self.operator_email = operator_email.filter(|e| !e.trim().is_empty());
        self
    }

    /// Add items to the caller's open order for the given contact.
    ///
    /// Items are written one by one. When an item runs short of stock the
    /// earlier items stay in the basket and the error lists them. Each shop
    /// variant of a product gets its own line.
    pub async fn add_order_items(
        &self,
        principal: &AuthUser,
        request: AddOrderItemsRequest,
    ) -> OrderResult<Order> {
        if request.order_items.iter().any(|line| line.quantity < 1) {
            return Err(OrderError::Validation(
                "quantity: Ensure this value is greater than or equal to 1.".to_string(),
            ));
        }

        let contact = self
            .contacts
            .get_by_id(request.contact)
            .await?
            .filter(|c| c.user_id == principal.id)
            .ok_or(OrderError::InvalidContact)?;

        let order = self
            .repository
            .get_or_create_open_order(principal.id, contact.id)
            .await?;

        let mut added: Vec<String> = Vec::new();
        for line in request.order_items {
            let product = self
                .catalog
                .get_product(line.product.id)
                .await?
                .ok_or(OrderError::ProductNotFound(line.product.id))?;
            let variant = self.resolve_variant(product.id, line.shop).await?;

            let existing = self
                .repository
                .find_item(order.id, variant.product_info_id)
                .await?;
            match existing {
                Some(existing) => {
                    let requested = existing.quantity + line.quantity;
                    if variant.quantity < requested {
                        return Err(OrderError::NotEnoughStock {
                            product: product.name,
                            available: variant.quantity - existing.quantity,
                            added,
                        });
                    }
                    self.repository
                        .update_item_quantity(existing.id, requested, variant.price_rrc)
                        .await?;
                }
                None => {
                    if variant.quantity < line.quantity {
                        return Err(OrderError::NotEnoughStock {
                            product: product.name,
                            available: variant.quantity,
                            added,
                        });
                    }
                    self.repository
                        .create_item(NewOrderItem {
                            order_id: order.id,
                            product_id: product.id,
                            shop_id: variant.shop_id,
                            product_info_id: variant.product_info_id,
                            quantity: line.quantity,
                            price: variant.price_rrc,
                        })
                        .await?;
                }
            }
            added.push(product.name);
        }

        tracing::info!(
            order_id = order.id,
            user_id = principal.id,
            items = added.len(),
            "Added items to basket"
        );
        Ok(order)
    }

    /// Items of the caller's open orders, newest first
    pub async fn basket(&self, principal: &AuthUser) -> OrderResult<Vec<OrderItemView>> {
        let items = self.repository.list_open_items(principal.id).await?;
        self.item_views(&items).await
    }

    /// Remove one item from an open order owned by the caller
    pub async fn delete_order_item(&self, principal: &AuthUser, item_id: i64) -> OrderResult<()> {
        let item = self
            .repository
            .get_item(item_id)
            .await?
            .ok_or(OrderError::ItemNotFound(item_id))?;
        let order = self.owned_order(principal, item.order_id).await?;

        if !order.status.is_open() {
            return Err(OrderError::AlreadyProcessed(order.status));
        }

        if !self.repository.delete_item(item_id).await? {
            return Err(OrderError::ItemNotFound(item_id));
        }
        Ok(())
    }

    /// The caller's orders with their totals, newest first
    pub async fn orders(&self, principal: &AuthUser) -> OrderResult<Vec<OrderSummary>> {
        let orders = self.repository.list_orders_with_totals(principal.id).await?;
        Ok(orders
            .iter()
            .map(|(order, total)| OrderSummary::new(order, *total))
            .collect())
    }

    /// Sum of the stored line totals
    pub async fn order_total(&self, order_id: i64) -> OrderResult<i64> {
        let items = self.repository.list_items(order_id).await?;
        Ok(items.iter().map(|i| i.total_price).sum())
    }

    pub async fn order_detail(&self, principal: &AuthUser, order_id: i64) -> OrderResult<OrderDetail> {
        let order = self.owned_order(principal, order_id).await?;
        let items = self.repository.list_items(order.id).await?;
        let total_sum = items.iter().map(|i| i.total_price).sum();

        Ok(OrderDetail {
            id: order.id,
            status: order.status,
            dt: order.dt.format(ORDER_DT_FORMAT).to_string(),
            contact: order.contact_id,
            orderitem_set: self.item_views(&items).await?,
            total_sum,
        })
    }

    /// Confirm an open order: re-check stock, flip the status once, decrement
    /// stock and send receipts.
    pub async fn confirm_order(
        &self,
        principal: &AuthUser,
        order_id: i64,
        request: ConfirmOrderRequest,
    ) -> OrderResult<Order> {
        if request.status != CONFIRM_CHOICE {
            return Err(OrderError::Validation(format!(
                "status: \"{}\" is not a valid choice.",
                request.status
            )));
        }

        let order = self.owned_order(principal, order_id).await?;
        if !order.status.is_open() {
            return Err(OrderError::AlreadyProcessed(order.status));
        }

        let items = self.repository.list_items(order.id).await?;
        let mut variants: HashMap<i64, Variant> = HashMap::with_capacity(items.len());
        for item in &items {
            let variant = self
                .catalog
                .get_variant(item.product_info_id)
                .await?
                .ok_or(OrderError::VariantNotFound {
                    product_id: item.product_id,
                    shop_id: item.shop_id,
                })?;
            if variant.quantity < item.quantity {
                return Err(OrderError::NotEnoughStock {
                    product: variant.product_name,
                    available: variant.quantity,
                    added: Vec::new(),
                });
            }
            variants.insert(item.id, variant);
        }

        if !self
            .repository
            .transition_status(order.id, order.status, OrderStatus::Confirmed)
            .await?
        {
            let current = self
                .repository
                .get_order(order.id)
                .await?
                .map_or(OrderStatus::Confirmed, |o| o.status);
            return Err(OrderError::AlreadyProcessed(current));
        }

        for item in &items {
            if !self
                .catalog
                .decrement_stock(item.product_info_id, item.quantity)
                .await?
            {
                // Stock was taken between the pre-check and the decrement.
                tracing::warn!(
                    order_id = order.id,
                    product_info_id = item.product_info_id,
                    quantity = item.quantity,
                    "Stock decrement skipped: not enough left at confirmation"
                );
            }
        }

        tracing::info!(order_id = order.id, user_id = principal.id, "Order confirmed");

        let lines = items
            .iter()
            .map(|item| {
                let variant = variants.get(&item.id);
                ReceiptLine {
                    product: variant.map(|v| v.product_name.clone()).unwrap_or_default(),
                    shop: variant.map(|v| v.shop_name.clone()).unwrap_or_default(),
                    quantity: item.quantity,
                    price: item.price,
                    total_price: item.total_price,
                }
            })
            .collect();
        self.send_receipts(&OrderReceipt::new(order.id, &principal.email, lines))
            .await;

        Ok(Order {
            status: OrderStatus::Confirmed,
            ..order
        })
    }

    /// Advance a confirmed order on behalf of a shop selling one of its items.
    pub async fn update_status(
        &self,
        principal: &AuthUser,
        order_id: i64,
        next: OrderStatus,
    ) -> OrderResult<Order> {
        if !principal.has_role(SHOP_ROLE) {
            return Err(OrderError::NotShop);
        }

        let order = self
            .repository
            .get_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let shop_ids: HashSet<i64> = self
            .catalog
            .list_shops_by_owner(principal.id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        let items = self.repository.list_items(order.id).await?;
        if !items.iter().any(|i| shop_ids.contains(&i.shop_id)) {
            return Err(OrderError::Forbidden);
        }

        if !order.status.can_advance_to(next) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        if !self
            .repository
            .transition_status(order.id, order.status, next)
            .await?
        {
            let current = self
                .repository
                .get_order(order.id)
                .await?
                .map_or(order.status, |o| o.status);
            return Err(OrderError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        tracing::info!(order_id = order.id, status = %next, shop_user_id = principal.id, "Order status changed");
        Ok(Order {
            status: next,
            ..order
        })
    }

    async fn resolve_variant(&self, product_id: i64, shop_id: i64) -> OrderResult<Variant> {
        self.catalog
            .find_variant(product_id, shop_id)
            .await?
            .ok_or(OrderError::VariantNotFound {
                product_id,
                shop_id,
            })
    }

    async fn owned_order(&self, principal: &AuthUser, order_id: i64) -> OrderResult<Order> {
        let order = self
            .repository
            .get_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if order.user_id != principal.id {
            return Err(OrderError::Forbidden);
        }
        Ok(order)
    }

    async fn item_views(&self, items: &[OrderItem]) -> OrderResult<Vec<OrderItemView>> {
        let mut names: HashMap<i64, String> = HashMap::new();
        let mut views = Vec::with_capacity(items.len());

        for item in items {
            if !names.contains_key(&item.product_id) {
                let name = self
                    .catalog
                    .get_product(item.product_id)
                    .await?
                    .map(|p| p.name)
                    .unwrap_or_default();
                names.insert(item.product_id, name);
            }
            let name = names.get(&item.product_id).cloned().unwrap_or_default();
            views.push(OrderItemView::new(item, name));
        }
        Ok(views)
    }

    async fn send_receipts(&self, receipt: &OrderReceipt) {
        let Some(notifications) = &self.notifications else {
            return;
        };

        let recipients = std::iter::once(receipt.buyer_email.as_str())
            .chain(self.operator_email.as_deref());
        for to in recipients {
            if let Err(e) = notifications.send_order_receipt(to, receipt).await {
                tracing::warn!(order_id = receipt.order_id, to = %to, error = %e, "Failed to send order receipt");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderItemRequest, ProductIdRef};
    use crate::repository::{InMemoryOrderRepository, MockOrderRepository};
    use domain_catalog::{CatalogRepository, InMemoryCatalogRepository, ProductInfoUpsert};
    use domain_notifications::InMemoryEmailProvider;
    use domain_users::{ContactRepository, CreateContact, InMemoryContactRepository};

    struct Fixture {
        service: OrderService<InMemoryOrderRepository>,
        catalog: InMemoryCatalogRepository,
        mailbox: InMemoryEmailProvider,
        buyer: AuthUser,
        contact_id: i64,
        shop_id: i64,
        phone: (i64, i64),
        cable: (i64, i64),
    }

    /// Returns (product id, product info id).
    async fn add_good(
        catalog: &InMemoryCatalogRepository,
        shop_id: i64,
        name: &str,
        quantity: i64,
        price_rrc: i64,
    ) -> (i64, i64) {
        let category = catalog.upsert_category(1, "Misc").await.unwrap();
        let product = catalog.upsert_product(name, category.id).await.unwrap();
        let info = catalog
            .upsert_product_info(ProductInfoUpsert {
                product_id: product.id,
                shop_id,
                external_id: product.id,
                model: name.to_lowercase(),
                quantity,
                price: price_rrc / 2,
                price_rrc,
            })
            .await
            .unwrap();
        (product.id, info.id)
    }

    async fn fixture() -> Fixture {
        let catalog = InMemoryCatalogRepository::new();
        let shop = catalog.upsert_shop("Связной", 100, "https://shop.example").await.unwrap();
        let phone = add_good(&catalog, shop.id, "Phone", 5, 1000).await;
        let cable = add_good(&catalog, shop.id, "Cable", 2, 50).await;

        let contacts = InMemoryContactRepository::new();
        let contact = contacts
            .create(
                1,
                CreateContact {
                    city: "Moscow".to_string(),
                    street: "Arbat".to_string(),
                    phone: "+7000".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let mailbox = InMemoryEmailProvider::new();
        let notifications = NotificationService::new(Arc::new(mailbox.clone())).unwrap();
        let service = OrderService::new(
            InMemoryOrderRepository::new(),
            Arc::new(catalog.clone()),
            Arc::new(contacts),
        )
        .with_notifications(notifications, Some("operator@example.com".to_string()));

        Fixture {
            service,
            catalog,
            mailbox,
            buyer: AuthUser::new(1, "buyer@example.com", vec!["buyer".to_string()]),
            contact_id: contact.id,
            shop_id: shop.id,
            phone,
            cable,
        }
    }

    fn request(contact: i64, lines: &[(i64, i64, i64)]) -> AddOrderItemsRequest {
        AddOrderItemsRequest {
            contact,
            order_items: lines
                .iter()
                .map(|&(product, quantity, shop)| OrderItemRequest {
                    product: ProductIdRef { id: product },
                    quantity,
                    shop,
                })
                .collect(),
        }
    }

    fn confirm() -> ConfirmOrderRequest {
        ConfirmOrderRequest {
            status: "confirm".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_items_creates_basket_and_increments() {
        let f = fixture().await;

        let order = f
            .service
            .add_order_items(&f.buyer, request(f.contact_id, &[(f.phone.0, 1, f.shop_id)]))
            .await
            .unwrap();
        let again = f
            .service
            .add_order_items(&f.buyer, request(f.contact_id, &[(f.phone.0, 2, f.shop_id)]))
            .await
            .unwrap();
        assert_eq!(order.id, again.id);

        let basket = f.service.basket(&f.buyer).await.unwrap();
        assert_eq!(basket.len(), 1);
        assert_eq!(basket[0].quantity, 3);
        assert_eq!(basket[0].total_price, 3000);
        assert_eq!(basket[0].product.name, "Phone");
    }

    #[tokio::test]
    async fn test_add_items_reports_remaining_stock() {
        let f = fixture().await;
        f.service
            .add_order_items(&f.buyer, request(f.contact_id, &[(f.phone.0, 4, f.shop_id)]))
            .await
            .unwrap();

        let err = f
            .service
            .add_order_items(
                &f.buyer,
                request(f.contact_id, &[(f.cable.0, 1, f.shop_id), (f.phone.0, 2, f.shop_id)]),
            )
            .await
            .unwrap_err();

        match err {
            OrderError::NotEnoughStock {
                product,
                available,
                added,
            } => {
                assert_eq!(product, "Phone");
                assert_eq!(available, 1);
                assert_eq!(added, vec!["Cable".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // The cable written before the shortfall stays in the basket.
        assert_eq!(f.service.basket(&f.buyer).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_items_new_item_over_stock() {
        let f = fixture().await;
        let err = f
            .service
            .add_order_items(&f.buyer, request(f.contact_id, &[(f.cable.0, 100, f.shop_id)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotEnoughStock { available: 2, .. }));
        assert!(err.to_string().contains("There are Cable: available 2 pieces"));
    }

    #[tokio::test]
    async fn test_same_product_from_two_shops_gets_separate_lines() {
        let f = fixture().await;
        let other_shop = f.catalog.upsert_shop("DNS", 200, "https://dns.example").await.unwrap();
        let other_phone = f
            .catalog
            .upsert_product_info(ProductInfoUpsert {
                product_id: f.phone.0,
                shop_id: other_shop.id,
                external_id: 900,
                model: "phone".to_string(),
                quantity: 100,
                price: 3,
                price_rrc: 7,
            })
            .await
            .unwrap();

        f.service
            .add_order_items(&f.buyer, request(f.contact_id, &[(f.phone.0, 5, f.shop_id)]))
            .await
            .unwrap();
        let order = f
            .service
            .add_order_items(&f.buyer, request(f.contact_id, &[(f.phone.0, 5, other_shop.id)]))
            .await
            .unwrap();

        let basket = f.service.basket(&f.buyer).await.unwrap();
        assert_eq!(basket.len(), 2);
        let line = |shop: i64| basket.iter().find(|i| i.shop == shop).unwrap();
        assert_eq!((line(f.shop_id).quantity, line(f.shop_id).total_price), (5, 5000));
        assert_eq!((line(other_shop.id).quantity, line(other_shop.id).total_price), (5, 35));

        f.service.confirm_order(&f.buyer, order.id, confirm()).await.unwrap();
        assert_eq!(f.catalog.get_variant(f.phone.1).await.unwrap().unwrap().quantity, 0);
        assert_eq!(f.catalog.get_variant(other_phone.id).await.unwrap().unwrap().quantity, 95);
    }

    #[tokio::test]
    async fn test_zero_quantity_rejects_whole_request() {
        let f = fixture().await;
        let err = f
            .service
            .add_order_items(
                &f.buyer,
                request(f.contact_id, &[(f.cable.0, 1, f.shop_id), (f.phone.0, 0, f.shop_id)]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Validation(_)));
        assert!(f.service.basket(&f.buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_items_rejects_foreign_contact_and_unknown_product() {
        let f = fixture().await;
        let stranger = AuthUser::new(2, "other@example.com", vec!["buyer".to_string()]);

        assert!(matches!(
            f.service
                .add_order_items(&stranger, request(f.contact_id, &[(f.phone.0, 1, f.shop_id)]))
                .await,
            Err(OrderError::InvalidContact)
        ));
        assert!(matches!(
            f.service
                .add_order_items(&f.buyer, request(f.contact_id, &[(9999, 1, f.shop_id)]))
                .await,
            Err(OrderError::ProductNotFound(9999))
        ));
        assert!(matches!(
            f.service
                .add_order_items(&f.buyer, request(f.contact_id, &[(f.phone.0, 1, 9999)]))
                .await,
            Err(OrderError::VariantNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_total_uses_price_captured_at_add_time() {
        let f = fixture().await;
        let order = f
            .service
            .add_order_items(&f.buyer, request(f.contact_id, &[(f.cable.0, 2, f.shop_id)]))
            .await
            .unwrap();

        f.catalog
            .upsert_product_info(ProductInfoUpsert {
                product_id: f.cable.0,
                shop_id: f.shop_id,
                external_id: f.cable.0,
                model: "cable".to_string(),
                quantity: 2,
                price: 1,
                price_rrc: 9999,
            })
            .await
            .unwrap();

        let detail = f.service.order_detail(&f.buyer, order.id).await.unwrap();
        assert_eq!(detail.total_sum, 100);
        let orders = f.service.orders(&f.buyer).await.unwrap();
        assert_eq!(orders[0].total_sum, 100);
    }

    #[tokio::test]
    async fn test_confirm_decrements_once_and_sends_receipts() {
        let f = fixture().await;
        let order = f
            .service
            .add_order_items(&f.buyer, request(f.contact_id, &[(f.phone.0, 2, f.shop_id)]))
            .await
            .unwrap();

        let confirmed = f.service.confirm_order(&f.buyer, order.id, confirm()).await.unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert_eq!(f.catalog.get_variant(f.phone.1).await.unwrap().unwrap().quantity, 3);

        let err = f.service.confirm_order(&f.buyer, order.id, confirm()).await.unwrap_err();
        assert!(matches!(err, OrderError::AlreadyProcessed(OrderStatus::Confirmed)));
        assert_eq!(f.catalog.get_variant(f.phone.1).await.unwrap().unwrap().quantity, 3);

        let buyer_mail = f.mailbox.sent_to("buyer@example.com").await;
        assert_eq!(buyer_mail.len(), 1);
        assert!(buyer_mail[0].text_body.contains("Phone"));
        assert_eq!(f.mailbox.sent_to("operator@example.com").await.len(), 1);

        assert!(f.service.basket(&f.buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_rechecks_stock() {
        let f = fixture().await;
        let order = f
            .service
            .add_order_items(&f.buyer, request(f.contact_id, &[(f.cable.0, 2, f.shop_id)]))
            .await
            .unwrap();
        assert!(f.catalog.decrement_stock(f.cable.1, 1).await.unwrap());

        let err = f.service.confirm_order(&f.buyer, order.id, confirm()).await.unwrap_err();
        assert!(matches!(err, OrderError::NotEnoughStock { available: 1, .. }));
        let detail = f.service.order_detail(&f.buyer, order.id).await.unwrap();
        assert_eq!(detail.status, OrderStatus::New);
    }

    #[tokio::test]
    async fn test_confirm_requires_confirm_choice_and_owner() {
        let f = fixture().await;
        let order = f
            .service
            .add_order_items(&f.buyer, request(f.contact_id, &[(f.cable.0, 1, f.shop_id)]))
            .await
            .unwrap();

        let bad = ConfirmOrderRequest {
            status: "confirmed".to_string(),
        };
        assert!(matches!(
            f.service.confirm_order(&f.buyer, order.id, bad).await,
            Err(OrderError::Validation(_))
        ));

        let stranger = AuthUser::new(2, "other@example.com", vec![]);
        assert!(matches!(
            f.service.confirm_order(&stranger, order.id, confirm()).await,
            Err(OrderError::Forbidden)
        ));
        assert!(matches!(
            f.service.confirm_order(&f.buyer, 999, confirm()).await,
            Err(OrderError::OrderNotFound(999))
        ));
    }

    #[tokio::test]
    async fn test_delete_item_rules() {
        let f = fixture().await;
        let order = f
            .service
            .add_order_items(
                &f.buyer,
                request(f.contact_id, &[(f.phone.0, 1, f.shop_id), (f.cable.0, 1, f.shop_id)]),
            )
            .await
            .unwrap();
        let basket = f.service.basket(&f.buyer).await.unwrap();

        assert!(matches!(
            f.service.delete_order_item(&f.buyer, 999).await,
            Err(OrderError::ItemNotFound(999))
        ));
        let stranger = AuthUser::new(2, "other@example.com", vec![]);
        assert!(matches!(
            f.service.delete_order_item(&stranger, basket[0].id).await,
            Err(OrderError::Forbidden)
        ));

        f.service.delete_order_item(&f.buyer, basket[0].id).await.unwrap();
        f.service.confirm_order(&f.buyer, order.id, confirm()).await.unwrap();

        assert!(matches!(
            f.service.delete_order_item(&f.buyer, basket[1].id).await,
            Err(OrderError::AlreadyProcessed(OrderStatus::Confirmed))
        ));
    }

    #[tokio::test]
    async fn test_shop_advances_confirmed_order() {
        let f = fixture().await;
        let order = f
            .service
            .add_order_items(&f.buyer, request(f.contact_id, &[(f.phone.0, 1, f.shop_id)]))
            .await
            .unwrap();
        let shop_user = AuthUser::new(100, "shop@example.com", vec!["shop".to_string()]);

        assert!(matches!(
            f.service.update_status(&shop_user, order.id, OrderStatus::Sent).await,
            Err(OrderError::InvalidTransition {
                from: OrderStatus::New,
                ..
            })
        ));
        assert!(matches!(
            f.service.update_status(&f.buyer, order.id, OrderStatus::Sent).await,
            Err(OrderError::NotShop)
        ));
        let other_shop = AuthUser::new(200, "other-shop@example.com", vec!["shop".to_string()]);
        assert!(matches!(
            f.service.update_status(&other_shop, order.id, OrderStatus::Sent).await,
            Err(OrderError::Forbidden)
        ));

        f.service.confirm_order(&f.buyer, order.id, confirm()).await.unwrap();
        let sent = f
            .service
            .update_status(&shop_user, order.id, OrderStatus::Sent)
            .await
            .unwrap();
        assert_eq!(sent.status, OrderStatus::Sent);

        assert!(matches!(
            f.service.update_status(&shop_user, order.id, OrderStatus::Delivered).await,
            Err(OrderError::InvalidTransition {
                from: OrderStatus::Sent,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_confirm_lost_race_reports_current_status() {
        let order = Order {
            id: 1,
            user_id: 1,
            contact_id: 1,
            status: OrderStatus::New,
            dt: chrono::Utc::now(),
        };

        let mut repo = MockOrderRepository::new();
        let first = order.clone();
        let second = Order {
            status: OrderStatus::Confirmed,
            ..order.clone()
        };
        let mut calls = 0;
        repo.expect_get_order().times(2).returning(move |_| {
            calls += 1;
            Ok(Some(if calls == 1 { first.clone() } else { second.clone() }))
        });
        repo.expect_list_items().returning(|_| Ok(vec![]));
        repo.expect_transition_status().returning(|_, _, _| Ok(false));

        let service = OrderService::new(
            repo,
            Arc::new(InMemoryCatalogRepository::new()),
            Arc::new(InMemoryContactRepository::new()),
        );
        let buyer = AuthUser::new(1, "buyer@example.com", vec![]);

        let err = service.confirm_order(&buyer, 1, confirm()).await.unwrap_err();
        assert!(matches!(err, OrderError::AlreadyProcessed(OrderStatus::Confirmed)));
    }
}
