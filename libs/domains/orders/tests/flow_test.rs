//! End-to-end flow over the identity, catalog and order routers
//!
//! A shop uploads two feeds, a buyer fills a basket, trims it and confirms.
//! Everything runs in memory; feeds are served by the in-memory fetcher.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum_helpers::{JwtAuth, JwtConfig, jwt_auth_middleware};
use domain_catalog::{CatalogRepository, CatalogService, InMemoryCatalogRepository, InMemoryFeedFetcher};
use domain_notifications::{InMemoryEmailProvider, NotificationService};
use domain_orders::{InMemoryOrderRepository, OrderService};
use domain_users::{ContactService, InMemoryContactRepository, InMemoryUserRepository, UserService};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For oneshot()

const SHOP1_FEED_URL: &str = "https://svyaznoy.example/shop1.yaml";
const SHOP2_FEED_URL: &str = "https://euroset.example/shop2.yaml";

struct Stack {
    router: Router,
    mailbox: InMemoryEmailProvider,
    catalog: InMemoryCatalogRepository,
}

async fn stack() -> Stack {
    let mailbox = InMemoryEmailProvider::new();
    let notifications = NotificationService::new(Arc::new(mailbox.clone())).unwrap();
    let jwt = JwtAuth::new(&JwtConfig::new("test-secret-key-that-is-long-enough-123"));

    let contacts = InMemoryContactRepository::new();
    let catalog = InMemoryCatalogRepository::new();
    let fetcher = InMemoryFeedFetcher::new();
    fetcher.insert(SHOP1_FEED_URL, include_str!("fixtures/shop1.yaml")).await;
    fetcher.insert(SHOP2_FEED_URL, include_str!("fixtures/shop2.yaml")).await;

    let users = UserService::new(InMemoryUserRepository::new(), "http://testserver")
        .with_notifications(notifications.clone());
    let catalog_service = CatalogService::new(Arc::new(catalog.clone()), Arc::new(fetcher));
    let orders = OrderService::new(
        InMemoryOrderRepository::new(),
        catalog_service.repository(),
        Arc::new(contacts.clone()),
    )
    .with_notifications(notifications, Some("operator@example.com".to_string()));

    let router = Router::new()
        .merge(domain_users::handlers::router(
            users,
            ContactService::new(contacts),
            jwt.clone(),
        ))
        .merge(domain_catalog::handlers::router(catalog_service))
        .merge(domain_orders::handlers::router(orders))
        .layer(from_fn_with_state(jwt, jwt_auth_middleware));

    Stack {
        router,
        mailbox,
        catalog,
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Registers an account of the given type, follows the emailed link and logs in.
async fn sign_up(stack: &Stack, email: &str, user_type: &str) -> String {
    let (status, _) = send(
        &stack.router,
        "POST",
        "/registration",
        None,
        Some(json!({ "email": email, "password": "secret-pass", "type": user_type })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let mail = stack.mailbox.sent_to(email).await;
    let body = &mail.last().unwrap().text_body;
    let start = body.find("/api/v1/confirm_email/").unwrap() + "/api/v1".len();
    let end = body[start..].find(char::is_whitespace).map_or(body.len(), |i| start + i);
    let (status, _) = send(&stack.router, "GET", &body[start..end], None, None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &stack.router,
        "POST",
        "/login",
        None,
        Some(json!({ "email": email, "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

async fn upload_feeds(stack: &Stack) {
    let shop = sign_up(stack, "shop@example.com", "shop").await;
    for url in [SHOP1_FEED_URL, SHOP2_FEED_URL] {
        let (status, body) = send(&stack.router, "POST", "/upload", Some(&shop), Some(json!({ "url": url }))).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["Success"], "Products uploaded.");
    }
}

/// Buyer with one delivery contact; returns (token, contact id).
async fn buyer_with_contact(stack: &Stack) -> (String, i64) {
    let token = sign_up(stack, "buyer@example.com", "buyer").await;
    let (status, contact) = send(
        &stack.router,
        "POST",
        "/add_contact",
        Some(&token),
        Some(json!({ "city": "Moscow", "street": "Tverskaya", "house": "7", "phone": "+79991234567" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (token, contact["id"].as_i64().unwrap())
}

/// First listed variant whose model matches `search`.
async fn variant(stack: &Stack, search: &str) -> Value {
    let (status, page) = send(&stack.router, "GET", &format!("/products?search={search}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    page["items"][0].clone()
}

fn order_line(variant: &Value, quantity: i64) -> Value {
    json!({
        "product": { "id": variant["product"]["id"] },
        "quantity": quantity,
        "shop": variant["shop"]["id"],
    })
}

#[tokio::test]
async fn test_feed_upload_then_order_lifecycle() {
    let stack = stack().await;
    upload_feeds(&stack).await;

    let stats = stack.catalog.stats().await.unwrap();
    assert_eq!(stats.shops, 2);
    assert_eq!(stats.categories, 3);
    assert_eq!(stats.products, 14);

    let (status, page) = send(&stack.router, "GET", "/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 14);

    let (buyer, contact) = buyer_with_contact(&stack).await;
    let airpods = variant(&stack, "airpods").await;
    let tv = variant(&stack, "sony").await;
    let airpods_stock = airpods["quantity"].as_i64().unwrap();

    let (status, _) = send(
        &stack.router,
        "POST",
        "/add_order_items",
        Some(&buyer),
        Some(json!({ "contact": contact, "order_items": [order_line(&airpods, 1), order_line(&tv, 1)] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, basket) = send(&stack.router, "GET", "/basket", Some(&buyer), None).await;
    let basket = basket.as_array().unwrap().clone();
    assert_eq!(basket.len(), 2);

    let tv_item = basket
        .iter()
        .find(|item| item["product"]["id"] == tv["product"]["id"])
        .unwrap();
    let (status, _) = send(
        &stack.router,
        "DELETE",
        &format!("/delete_order_item/{}", tv_item["id"]),
        Some(&buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let order_id = basket[0]["order"].as_i64().unwrap();
    let (status, body) = send(
        &stack.router,
        "PATCH",
        &format!("/confirm/{order_id}"),
        Some(&buyer),
        Some(json!({ "status": "confirm" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Success"], "Order confirmed successfully");

    let (status, order) = send(&stack.router, "GET", &format!("/order/{order_id}"), Some(&buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "confirmed");
    assert_eq!(order["orderitem_set"].as_array().unwrap().len(), 1);

    let after = stack
        .catalog
        .get_variant(airpods["id"].as_i64().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.quantity, airpods_stock - 1);

    let receipts = stack.mailbox.sent_to("operator@example.com").await;
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].subject, format!("Order #{order_id} confirmed"));
    let buyer_mail = stack.mailbox.sent_to("buyer@example.com").await;
    assert!(buyer_mail.iter().any(|m| m.subject == format!("Order #{order_id} confirmed")));
}

#[tokio::test]
async fn test_order_beyond_stock_is_refused() {
    let stack = stack().await;
    upload_feeds(&stack).await;
    let (buyer, contact) = buyer_with_contact(&stack).await;

    let samsung = variant(&stack, "galaxy").await;
    let stock = samsung["quantity"].as_i64().unwrap();

    let (status, body) = send(
        &stack.router,
        "POST",
        "/add_order_items",
        Some(&buyer),
        Some(json!({ "contact": contact, "order_items": [order_line(&samsung, stock + 1)] })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    let message = body["Error"].as_str().unwrap();
    assert!(message.starts_with("Not enough products in stock."));
    assert!(message.ends_with(&format!("available {stock} pieces")));

    let (_, basket) = send(&stack.router, "GET", "/basket", Some(&buyer), None).await;
    assert!(basket.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_buyer_cannot_upload_feed() {
    let stack = stack().await;
    let (buyer, _) = buyer_with_contact(&stack).await;

    let (status, body) = send(
        &stack.router,
        "POST",
        "/upload",
        Some(&buyer),
        Some(json!({ "url": SHOP1_FEED_URL })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["Error"], "Only shops can upload products.");
    assert_eq!(stack.catalog.stats().await.unwrap().products, 0);
}
