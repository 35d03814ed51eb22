use super::common::{created_response, json_body, success_response, SuccessResponse};
use crate::{
    auth::AdminContext,
    dto::catalog::{CreateCategoryInput, UpdateCategoryInput},
    entities::product_category,
    errors::{ApiError, ErrorResponse},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<product_category::Model> for CategoryResponse {
    fn from(model: product_category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub fn categories_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

/// All categories ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses((status = 200, description = "Categories", body = [CategoryResponse])),
    tag = "Categories"
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let categories = state.services.categories.list_categories().await?;
    Ok(success_response(
        categories
            .into_iter()
            .map(CategoryResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.services.categories.get_category(id).await?;
    Ok(success_response(CategoryResponse::from(category)))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryInput,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 409, description = "Name already used", body = ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    AdminContext(admin): AdminContext,
    State(state): State<AppState>,
    payload: Result<Json<CreateCategoryInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = json_body(payload)?;
    let category = state.services.categories.create_category(input).await?;
    info!(category_id = %category.id, admin_id = %admin.id, "Category created");
    Ok(created_response(CategoryResponse::from(category)))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryInput,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Name already used", body = ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn update_category(
    _admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateCategoryInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = json_body(payload)?;
    let category = state.services.categories.update_category(id, input).await?;
    Ok(success_response(CategoryResponse::from(category)))
}

/// Refused with 409 while products still reference the category
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = SuccessResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category in use", body = ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn delete_category(
    _admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.categories.delete_category(id).await?;
    Ok(success_response(SuccessResponse::ok()))
}
