//! Orders Domain
//!
//! The basket/order engine. A basket is an order in status `new`, one per
//! (user, contact). Items reference the catalog variant they were priced
//! from; confirming an order decrements that variant's stock and emails a
//! receipt.
//!
//! ```text
//! new ──confirm──► confirmed ──shop──► assembled | sent | delivered | canceled
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{OrderError, OrderResult};
pub use models::{
    AddOrderItemsRequest, ConfirmOrderRequest, NewOrderItem, Order, OrderDetail, OrderItem,
    OrderItemRequest, OrderItemView, OrderStatus, OrderSummary, ProductIdRef, ProductSummary,
    UpdateOrderStatusRequest,
};
pub use postgres::PgOrderRepository;
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use service::OrderService;
