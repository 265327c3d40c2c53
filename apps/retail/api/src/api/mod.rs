use axum::Router;
use axum::middleware::from_fn_with_state;
use axum_helpers::jwt_auth_middleware;
use std::sync::Arc;

use domain_catalog::{CatalogService, HttpFeedFetcher, PgCatalogRepository};
use domain_orders::{OrderService, PgOrderRepository};
use domain_users::{ContactService, PgContactRepository, PgUserRepository, UserService};

pub mod health;

/// API routes without the `/api` prefix; `create_router` adds it.
///
/// Every domain router is mounted under `/v1` behind the JWT middleware, so
/// handlers see the caller through `AuthUser`.
pub fn routes(state: &crate::state::AppState) -> eyre::Result<Router> {
    let retail = &state.config.retail;

    let users = UserService::new(
        PgUserRepository::new(state.db.clone()),
        retail.public_base_url.clone(),
    )
    .with_notifications(state.notifications.clone());
    let contacts = ContactService::new(PgContactRepository::new(state.db.clone()));

    let fetcher = HttpFeedFetcher::new(retail.feed_timeout)
        .map_err(|e| eyre::eyre!("Failed to build feed fetcher: {}", e))?;
    let catalog = CatalogService::new(
        Arc::new(PgCatalogRepository::new(state.db.clone())),
        Arc::new(fetcher),
    );

    let orders = OrderService::new(
        PgOrderRepository::new(state.db.clone()),
        catalog.repository(),
        Arc::new(PgContactRepository::new(state.db.clone())),
    )
    .with_notifications(state.notifications.clone(), retail.operator_email.clone());

    let v1 = Router::new()
        .merge(domain_users::handlers::router(users, contacts, state.jwt.clone()))
        .merge(domain_catalog::handlers::router(catalog))
        .merge(domain_orders::handlers::router(orders))
        .layer(from_fn_with_state(state.jwt.clone(), jwt_auth_middleware));

    Ok(Router::new().nest("/v1", v1))
}

/// `/ready` with real dependency checks; merged next to the stateless app router.
pub fn ready_router(state: crate::state::AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
