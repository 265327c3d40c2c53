use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the `bearer_auth` scheme referenced by the protected endpoints
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse, axum_helpers::SuccessResponse)
    ),
    info(
        title = "Retail API",
        version = "0.1.0",
        description = "Catalog ingestion from supplier feeds, baskets and orders for a multi-shop retail site"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/v1", api = domain_users::handlers::ApiDoc),
        (path = "/v1", api = domain_catalog::handlers::ApiDoc),
        (path = "/v1", api = domain_orders::handlers::ApiDoc)
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;
