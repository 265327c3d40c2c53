use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

/// Format of `dt` in order responses
pub const ORDER_DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Value `PATCH /confirm/{id}` expects in `status`
pub const CONFIRM_CHOICE: &str = "confirm";

/// Order lifecycle.
///
/// `basket`/`new` are open and still editable. `confirmed` is reached once,
/// from an open order; the remaining states are reachable only from
/// `confirmed` and end the lifecycle.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OrderStatus {
    Basket,
    #[default]
    New,
    Confirmed,
    Assembled,
    Sent,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// Items may still be added, removed or confirmed
    pub fn is_open(self) -> bool {
        matches!(self, OrderStatus::Basket | OrderStatus::New)
    }

    /// Transitions a shop may apply to a confirmed order
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        self == OrderStatus::Confirmed
            && matches!(
                next,
                OrderStatus::Assembled
                    | OrderStatus::Sent
                    | OrderStatus::Delivered
                    | OrderStatus::Canceled
            )
    }
}

/// Stored order record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub contact_id: i64,
    pub status: OrderStatus,
    pub dt: DateTime<Utc>,
}

/// Stored order line. `price` is the retail price captured when the line
/// was last written; `total_price` is `quantity * price` at that moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub shop_id: i64,
    pub product_info_id: i64,
    pub quantity: i64,
    pub price: i64,
    pub total_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub order_id: i64,
    pub product_id: i64,
    pub shop_id: i64,
    pub product_info_id: i64,
    pub quantity: i64,
    pub price: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ProductIdRef {
    pub id: i64,
}

/// One requested basket line
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct OrderItemRequest {
    pub product: ProductIdRef,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    #[schema(example = 1)]
    pub quantity: i64,
    /// Shop id
    pub shop: i64,
}

/// `POST /add_order_items` body
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct AddOrderItemsRequest {
    /// Contact id of the caller
    pub contact: i64,
    #[validate(length(min = 1, message = "This list may not be empty."), nested)]
    pub order_items: Vec<OrderItemRequest>,
}

/// `PATCH /confirm/{id}` body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ConfirmOrderRequest {
    #[schema(example = "confirm")]
    pub status: String,
}

/// `PATCH /order/{id}/status` body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
}

/// Order line as returned by `/basket` and `/order/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItemView {
    pub id: i64,
    /// Order id
    pub order: i64,
    pub product: ProductSummary,
    pub quantity: i64,
    /// Shop id
    pub shop: i64,
    pub price: i64,
    pub total_price: i64,
}

impl OrderItemView {
    pub fn new(item: &OrderItem, product_name: String) -> Self {
        Self {
            id: item.id,
            order: item.order_id,
            product: ProductSummary {
                id: item.product_id,
                name: product_name,
            },
            quantity: item.quantity,
            shop: item.shop_id,
            price: item.price,
            total_price: item.total_price,
        }
    }
}

/// Row of `GET /orders`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub id: i64,
    pub status: OrderStatus,
    #[schema(example = "2025-03-01 12:00:00")]
    pub dt: String,
    pub total_sum: i64,
}

impl OrderSummary {
    pub fn new(order: &Order, total_sum: i64) -> Self {
        Self {
            id: order.id,
            status: order.status,
            dt: order.dt.format(ORDER_DT_FORMAT).to_string(),
            total_sum,
        }
    }
}

/// `GET /order/{id}` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    pub id: i64,
    pub status: OrderStatus,
    pub dt: String,
    /// Contact id
    pub contact: i64,
    pub orderitem_set: Vec<OrderItemView>,
    pub total_sum: i64,
}
