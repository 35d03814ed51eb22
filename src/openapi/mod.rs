use axum::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "1.0.0",
        description = r#"
# Storefront Catalog API

Product catalog for a small boutique: public browsing, trending picks,
category management and admin-only maintenance.

## Authentication

Read endpoints are public. Mutations and dashboard statistics require a
session token issued by the identity provider, belonging to a profile with
the `admin` role:

```
Authorization: Bearer <session-token>
```

## Error Handling

Failures share one body shape:

```json
{
  "error": "Conflict",
  "message": "Conflict: a category named 'Vestes' already exists",
  "request_id": "4f0c...",
  "timestamp": "2026-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Products", description = "Catalog browsing and maintenance"),
        (name = "Categories", description = "Category management"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::list_trending,
        crate::handlers::products::get_product,
        crate::handlers::products::list_category_labels,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::toggle_trending,
        crate::handlers::products::upload_image,
        crate::handlers::products::get_stats,
        crate::handlers::products::checkout_link,

        // Categories
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,

        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::dto::catalog::CreateProductInput,
            crate::dto::catalog::UpdateProductInput,
            crate::dto::catalog::CreateCategoryInput,
            crate::dto::catalog::UpdateCategoryInput,
            crate::handlers::products::ProductResponse,
            crate::handlers::products::ProductImageResponse,
            crate::handlers::products::CategorySummary,
            crate::handlers::products::TrendingStateResponse,
            crate::handlers::products::StatsResponse,
            crate::handlers::products::UploadImageRequest,
            crate::handlers::products::UploadImageResponse,
            crate::handlers::categories::CategoryResponse,
            crate::handlers::common::SuccessResponse,
            crate::handlers::health::HealthResponse,
            crate::services::checkout_link_service::CheckoutLink,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Serves the generated document at `/api-docs/openapi.json`
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDocV1::openapi())
}
