use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_catalog::CatalogError;
use domain_users::UserError;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::models::OrderStatus;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Order item not found: {0}")]
    ItemNotFound(i64),

    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    #[error("Shop {shop_id} does not sell product {product_id}")]
    VariantNotFound { product_id: i64, shop_id: i64 },

    #[error("Invalid contact")]
    InvalidContact,

    #[error("Access denied")]
    Forbidden,

    #[error("Only shops can change order status")]
    NotShop,

    /// `added` lists products written before the shortfall was found.
    #[error("Not enough products in stock. There are {product}: available {available} pieces")]
    NotEnoughStock {
        product: String,
        available: i64,
        added: Vec<String>,
    },

    #[error("Order has already been processed")]
    AlreadyProcessed(OrderStatus),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<UserError> for OrderError {
    fn from(err: UserError) -> Self {
        OrderError::Internal(err.to_string())
    }
}

fn status_details(status: OrderStatus) -> Value {
    json!({ "Order status": status.to_string() })
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::OrderNotFound(id) => AppError::NotFound(format!("Order {} not found", id)),
            OrderError::ItemNotFound(id) => {
                AppError::NotFound(format!("Order item {} not found", id))
            }
            OrderError::ProductNotFound(id) => {
                AppError::NotFound(format!("Product {} not found", id))
            }
            OrderError::VariantNotFound { .. } => AppError::NotFound(message),
            OrderError::InvalidContact => AppError::BadRequest("Invalid contact".to_string()),
            OrderError::Forbidden => AppError::Forbidden(
                "You do not have permission to perform this action.".to_string(),
            ),
            OrderError::NotShop => {
                AppError::Forbidden("Only shops can change order status.".to_string())
            }
            OrderError::NotEnoughStock { added, .. } => {
                let details: Map<String, Value> = added
                    .into_iter()
                    .map(|name| (name, Value::from("added in order")))
                    .collect();
                AppError::business_rule(message, Value::Object(details))
            }
            OrderError::AlreadyProcessed(status) => {
                AppError::business_rule(message, status_details(status))
            }
            OrderError::InvalidTransition { from, .. } => {
                AppError::business_rule(message, status_details(from))
            }
            OrderError::Validation(msg) => AppError::BadRequest(msg),
            OrderError::Catalog(e) => e.into(),
            OrderError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
