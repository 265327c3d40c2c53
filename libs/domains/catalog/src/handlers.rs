use axum::{
    Json, Router,
    extract::{Query, State},
    http::HeaderMap,
    routing::{get, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, AuthUser, ErrorResponse, SuccessResponse, ValidatedJson,
    extract_ip_from_headers, extract_user_agent,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::CatalogResult;
use crate::models::{
    Category, ParameterValue, ProductListItem, ProductPage, ProductQuery, ProductRef, Shop,
    ShopRef, UploadRequest,
};
use crate::service::CatalogService;

const CATALOG_TAG: &str = "catalog";

/// OpenAPI documentation for the catalog endpoints
#[derive(OpenApi)]
#[openapi(
    paths(upload, list_products, list_shops, list_categories),
    components(schemas(
        UploadRequest,
        ProductPage,
        ProductListItem,
        ProductRef,
        ShopRef,
        ParameterValue,
        Shop,
        Category,
        SuccessResponse,
        ErrorResponse,
    )),
    tags((name = CATALOG_TAG, description = "Shop feed upload and product browsing"))
)]
pub struct ApiDoc;

/// Create the catalog router with all HTTP endpoints
pub fn router(service: CatalogService) -> Router {
    let service = Arc::new(service);

    Router::new()
        .route("/upload", post(upload))
        .route("/products", get(list_products))
        .route("/shops", get(list_shops))
        .route("/categories", get(list_categories))
        .with_state(service)
}

/// Load a shop's YAML feed from a URL
///
/// Only shop accounts may upload. The feed is validated completely before
/// anything is written.
#[utoipa::path(
    post,
    path = "/upload",
    tag = CATALOG_TAG,
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Feed ingested", body = SuccessResponse),
        (status = 400, description = "Missing or malformed URL, invalid feed", body = ErrorResponse),
        (status = 403, description = "Not logged in or not a shop", body = ErrorResponse),
        (status = 502, description = "Feed could not be fetched", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
async fn upload(
    State(service): State<Arc<CatalogService>>,
    principal: Option<AuthUser>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<UploadRequest>,
) -> CatalogResult<Json<SuccessResponse>> {
    let result = service
        .upload(principal.as_ref(), input.url.as_deref())
        .await;

    let outcome = match &result {
        Ok(_) => AuditOutcome::Success,
        Err(_) => AuditOutcome::Failure,
    };
    let mut event = AuditEvent::new(
        principal.as_ref().map(|p| p.id),
        "catalog.upload",
        input.url.clone(),
        outcome,
    )
    .with_ip(extract_ip_from_headers(&headers))
    .with_user_agent(extract_user_agent(&headers));
    if let Ok(summary) = &result {
        event = event.with_details(json!({
            "shop_id": summary.shop_id,
            "categories": summary.categories,
            "goods": summary.goods,
        }));
    }
    event.log();

    result?;
    Ok(Json(SuccessResponse::new("Products uploaded.")))
}

/// List product variants
///
/// Public. Supports case-insensitive search, ordering and pagination.
#[utoipa::path(
    get,
    path = "/products",
    tag = CATALOG_TAG,
    params(ProductQuery),
    responses(
        (status = 200, description = "Page of product variants", body = ProductPage),
    )
)]
async fn list_products(
    State(service): State<Arc<CatalogService>>,
    Query(query): Query<ProductQuery>,
) -> CatalogResult<Json<ProductPage>> {
    Ok(Json(service.list_products(&query).await?))
}

/// List shops ordered by name
#[utoipa::path(
    get,
    path = "/shops",
    tag = CATALOG_TAG,
    responses((status = 200, description = "Shops", body = Vec<Shop>))
)]
async fn list_shops(State(service): State<Arc<CatalogService>>) -> CatalogResult<Json<Vec<Shop>>> {
    Ok(Json(service.list_shops().await?))
}

#[utoipa::path(
    get,
    path = "/categories",
    tag = CATALOG_TAG,
    responses((status = 200, description = "Categories ordered by name", body = Vec<Category>))
)]
async fn list_categories(
    State(service): State<Arc<CatalogService>>,
) -> CatalogResult<Json<Vec<Category>>> {
    Ok(Json(service.list_categories().await?))
}
