use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, AuthUser, ErrorResponse, IdPath, SuccessResponse, ValidatedJson,
    extract_ip_from_headers,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::OrderResult;
use crate::models::{
    AddOrderItemsRequest, ConfirmOrderRequest, OrderDetail, OrderItemRequest, OrderItemView,
    OrderStatus, OrderSummary, ProductIdRef, ProductSummary, UpdateOrderStatusRequest,
};
use crate::repository::OrderRepository;
use crate::service::OrderService;

const ORDERS_TAG: &str = "orders";

/// OpenAPI documentation for the basket and order endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        add_order_items,
        basket,
        delete_order_item,
        list_orders,
        get_order,
        confirm_order,
        update_order_status,
    ),
    components(schemas(
        AddOrderItemsRequest,
        OrderItemRequest,
        ProductIdRef,
        ConfirmOrderRequest,
        UpdateOrderStatusRequest,
        OrderStatus,
        OrderItemView,
        ProductSummary,
        OrderSummary,
        OrderDetail,
        SuccessResponse,
        ErrorResponse,
    )),
    tags((name = ORDERS_TAG, description = "Basket, orders and confirmation"))
)]
pub struct ApiDoc;

/// Create the order router with all HTTP endpoints
pub fn router<R: OrderRepository + 'static>(service: OrderService<R>) -> Router {
    let service = Arc::new(service);

    Router::new()
        .route("/add_order_items", post(add_order_items::<R>))
        .route("/basket", get(basket::<R>))
        .route("/delete_order_item/{id}", delete(delete_order_item::<R>))
        .route("/orders", get(list_orders::<R>))
        .route("/order/{id}", get(get_order::<R>))
        .route("/order/{id}/status", patch(update_order_status::<R>))
        .route("/confirm/{id}", patch(confirm_order::<R>))
        .with_state(service)
}

/// Add items to the caller's basket
///
/// Items are processed in order. On a stock shortfall the items processed
/// before it stay in the basket and are listed in `details`.
#[utoipa::path(
    post,
    path = "/add_order_items",
    tag = ORDERS_TAG,
    request_body = AddOrderItemsRequest,
    responses(
        (status = 201, description = "Items added", body = SuccessResponse),
        (status = 400, description = "Invalid data or contact", body = ErrorResponse),
        (status = 401, description = "Log in required", body = ErrorResponse),
        (status = 403, description = "Not enough products in stock", body = ErrorResponse),
        (status = 404, description = "Unknown product or shop", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
async fn add_order_items<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<AddOrderItemsRequest>,
) -> OrderResult<impl IntoResponse> {
    service.add_order_items(&user, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new("Item(s) added successfully")),
    ))
}

/// Items in the caller's open orders, newest first
#[utoipa::path(
    get,
    path = "/basket",
    tag = ORDERS_TAG,
    responses(
        (status = 200, description = "Basket items", body = Vec<OrderItemView>),
        (status = 401, description = "Log in required", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
async fn basket<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    user: AuthUser,
) -> OrderResult<Json<Vec<OrderItemView>>> {
    Ok(Json(service.basket(&user).await?))
}

/// Remove an item from the caller's open order
#[utoipa::path(
    delete,
    path = "/delete_order_item/{id}",
    tag = ORDERS_TAG,
    params(("id" = i64, Path, description = "Order item ID")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 403, description = "Item of another user or of a processed order", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
async fn delete_order_item<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    user: AuthUser,
    IdPath(id): IdPath,
) -> OrderResult<StatusCode> {
    service.delete_order_item(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's orders with totals, newest first
#[utoipa::path(
    get,
    path = "/orders",
    tag = ORDERS_TAG,
    responses(
        (status = 200, description = "Orders", body = Vec<OrderSummary>),
        (status = 401, description = "Log in required", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
async fn list_orders<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    user: AuthUser,
) -> OrderResult<Json<Vec<OrderSummary>>> {
    Ok(Json(service.orders(&user).await?))
}

#[utoipa::path(
    get,
    path = "/order/{id}",
    tag = ORDERS_TAG,
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with its items", body = OrderDetail),
        (status = 403, description = "Order of another user", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
async fn get_order<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    user: AuthUser,
    IdPath(id): IdPath,
) -> OrderResult<Json<OrderDetail>> {
    Ok(Json(service.order_detail(&user, id).await?))
}

/// Confirm an open order
///
/// Decrements stock and emails receipts to the buyer and the store operator.
#[utoipa::path(
    patch,
    path = "/confirm/{id}",
    tag = ORDERS_TAG,
    params(("id" = i64, Path, description = "Order ID")),
    request_body = ConfirmOrderRequest,
    responses(
        (status = 200, description = "Order confirmed", body = SuccessResponse),
        (status = 400, description = "status is not \"confirm\"", body = ErrorResponse),
        (status = 403, description = "Already processed, not enough stock or not the owner", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
async fn confirm_order<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    user: AuthUser,
    headers: HeaderMap,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<ConfirmOrderRequest>,
) -> OrderResult<Json<SuccessResponse>> {
    let result = service.confirm_order(&user, id, input).await;

    let outcome = match &result {
        Ok(_) => AuditOutcome::Success,
        Err(_) => AuditOutcome::Failure,
    };
    AuditEvent::new(Some(user.id), "order.confirm", Some(format!("order:{}", id)), outcome)
        .with_ip(extract_ip_from_headers(&headers))
        .log();

    result?;
    Ok(Json(SuccessResponse::new("Order confirmed successfully")))
}

/// Advance a confirmed order (shops selling one of its items)
#[utoipa::path(
    patch,
    path = "/order/{id}/status",
    tag = ORDERS_TAG,
    params(("id" = i64, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderSummary),
        (status = 403, description = "Not a shop of this order or invalid transition", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
async fn update_order_status<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    user: AuthUser,
    headers: HeaderMap,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateOrderStatusRequest>,
) -> OrderResult<Json<OrderSummary>> {
    let order = service.update_status(&user, id, input.status).await?;

    AuditEvent::new(
        Some(user.id),
        "order.status",
        Some(format!("order:{}", id)),
        AuditOutcome::Success,
    )
    .with_ip(extract_ip_from_headers(&headers))
    .with_details(json!({ "status": order.status.to_string() }))
    .log();

    let total_sum = service.order_total(order.id).await?;
    Ok(Json(OrderSummary::new(&order, total_sum)))
}
