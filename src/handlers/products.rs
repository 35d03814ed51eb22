use super::common::{created_response, json_body, success_response, SuccessResponse};
use crate::{
    auth::AdminContext,
    dto::catalog::{CreateProductInput, ProductFilter, UpdateProductInput},
    entities::{product_category, product_image},
    errors::{ApiError, ErrorResponse},
    services::{
        catalog::{CatalogStats, ProductWithImages, TrendingState, TRENDING_LIMIT},
        checkout_link_service::CheckoutLink,
        media::ImageUpload,
    },
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: Option<String>,
}

impl From<product_category::Model> for CategorySummary {
    fn from(model: product_category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductImageResponse {
    pub id: Uuid,
    pub url: String,
    pub order_index: i32,
}

impl From<product_image::Model> for ProductImageResponse {
    fn from(model: product_image::Model) -> Self {
        Self {
            id: model.id,
            url: model.url,
            order_index: model.order_index,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Always two fraction digits, e.g. `"15000.00"`
    #[schema(value_type = String, example = "15000.00")]
    pub price: Decimal,
    pub is_trending: bool,
    pub stock: i32,
    pub category_id: Option<Uuid>,
    pub category: Option<CategorySummary>,
    /// Ordered by `order_index`
    pub images: Vec<ProductImageResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductWithImages> for ProductResponse {
    fn from(aggregate: ProductWithImages) -> Self {
        let ProductWithImages {
            product,
            category,
            images,
        } = aggregate;
        let mut price = product.price;
        price.rescale(2);
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price,
            is_trending: product.is_trending,
            stock: product.stock,
            category_id: product.category_id,
            category: category.map(Into::into),
            images: images.into_iter().map(Into::into).collect(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

fn to_responses(products: Vec<ProductWithImages>) -> Vec<ProductResponse> {
    products.into_iter().map(Into::into).collect()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrendingStateResponse {
    pub id: Uuid,
    pub is_trending: bool,
}

impl From<TrendingState> for TrendingStateResponse {
    fn from(state: TrendingState) -> Self {
        Self {
            id: state.id,
            is_trending: state.is_trending,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_products: u64,
    pub trending_products: u64,
    pub out_of_stock: u64,
}

impl From<CatalogStats> for StatsResponse {
    fn from(stats: CatalogStats) -> Self {
        Self {
            total_products: stats.total_products,
            trending_products: stats.trending_products,
            out_of_stock: stats.out_of_stock,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageRequest {
    #[schema(example = "veste-rouge.jpg")]
    pub file_name: String,
    /// Raw base64 or a `data:` URL
    pub file_base64: String,
    #[schema(example = "image/jpeg")]
    pub content_type: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadImageResponse {
    pub url: String,
}

pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/trending", get(list_trending))
        .route("/categories", get(list_category_labels))
        .route("/stats", get(get_stats))
        .route("/images", post(upload_image))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/toggle-trending", post(toggle_trending))
        .route("/:id/checkout-link", get(checkout_link))
}

/// List products, newest first
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductFilter),
    responses(
        (status = 200, description = "Products", body = [ProductResponse])
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state.services.product_catalog.list_products(&filter).await?;
    Ok(success_response(to_responses(products)))
}

/// Up to six trending products, newest first
#[utoipa::path(
    get,
    path = "/api/v1/products/trending",
    responses((status = 200, description = "Trending products", body = [ProductResponse])),
    tag = "Products"
)]
pub async fn list_trending(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .product_catalog
        .list_trending(TRENDING_LIMIT)
        .await?;
    Ok(success_response(to_responses(products)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.product_catalog.get_product(id).await?;
    Ok(success_response(ProductResponse::from(product)))
}

/// Names of categories currently assigned to at least one product, sorted
#[utoipa::path(
    get,
    path = "/api/v1/products/categories",
    responses((status = 200, description = "Category names in use", body = [String])),
    tag = "Products"
)]
pub async fn list_category_labels(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let labels = state.services.product_catalog.list_category_labels().await?;
    Ok(success_response(labels))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn create_product(
    AdminContext(admin): AdminContext,
    State(state): State<AppState>,
    payload: Result<Json<CreateProductInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = json_body(payload)?;
    let product = state.services.product_catalog.create_product(input).await?;
    info!(product_id = %product.product.id, admin_id = %admin.id, "Product created");
    Ok(created_response(ProductResponse::from(product)))
}

/// Partial update; `image_urls`, when present, replaces the whole image set
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductInput,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn update_product(
    AdminContext(admin): AdminContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateProductInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = json_body(payload)?;
    let product = state
        .services
        .product_catalog
        .update_product(id, input)
        .await?;
    info!(product_id = %id, admin_id = %admin.id, "Product updated");
    Ok(success_response(ProductResponse::from(product)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = SuccessResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    AdminContext(admin): AdminContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.product_catalog.delete_product(id).await?;
    info!(product_id = %id, admin_id = %admin.id, "Product deleted");
    Ok(success_response(SuccessResponse::ok()))
}

#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/toggle-trending",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "New trending flag", body = TrendingStateResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn toggle_trending(
    _admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let trending = state.services.product_catalog.toggle_trending(id).await?;
    Ok(success_response(TrendingStateResponse::from(trending)))
}

#[utoipa::path(
    post,
    path = "/api/v1/products/images",
    request_body = UploadImageRequest,
    responses(
        (status = 200, description = "Public URL of the stored image", body = UploadImageResponse),
        (status = 400, description = "Invalid image", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 502, description = "Storage backend failed", body = ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn upload_image(
    _admin: AdminContext,
    State(state): State<AppState>,
    payload: Result<Json<UploadImageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    let url = state
        .services
        .images
        .upload_image(ImageUpload {
            file_name: request.file_name,
            file_base64: request.file_base64,
            content_type: request.content_type,
        })
        .await?;
    Ok(success_response(UploadImageResponse { url }))
}

/// Dashboard counters
#[utoipa::path(
    get,
    path = "/api/v1/products/stats",
    responses(
        (status = 200, description = "Catalog counters", body = StatsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn get_stats(
    _admin: AdminContext,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.services.product_catalog.get_stats().await?;
    Ok(success_response(StatsResponse::from(stats)))
}

/// Chat link pre-filled with an order message for the product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/checkout-link",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Checkout link", body = CheckoutLink),
        (status = 404, description = "Product not found or checkout disabled", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn checkout_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let link = state.services.checkout.checkout_link(id).await?;
    Ok(success_response(link))
}
