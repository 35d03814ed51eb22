use super::slug::{slugify, with_suffix};
use crate::{
    dto::catalog::{CreateCategoryInput, UpdateCategoryInput},
    entities::{product, product_category, Product, ProductCategory},
    errors::ServiceError,
};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Product categories with unique names and unique, derived slugs.
///
/// Name and slug checks are reads followed by a write; the unique indexes
/// on both columns turn a lost race into `Conflict` instead of a duplicate.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<product_category::Model>, ServiceError> {
        Ok(ProductCategory::find()
            .order_by_asc(product_category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: Uuid) -> Result<product_category::Model, ServiceError> {
        ProductCategory::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))
    }

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<product_category::Model, ServiceError> {
        input.validate()?;
        let name = input.name.trim().to_string();

        ensure_name_available(&*self.db, &name, None).await?;

        let requested = input
            .slug
            .as_deref()
            .map(slugify)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&name));
        let slug = unique_slug(&*self.db, &requested, None).await?;

        let category = product_category::ActiveModel {
            name: Set(name),
            slug: Set(slug),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        counter!("storefront.categories.created", 1);
        info!(category_id = %category.id, slug = ?category.slug, "Created category");
        Ok(category)
    }

    /// A new slug is derived only when the name actually changes and no
    /// slug is given; an explicit slug is normalized and de-duplicated.
    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<product_category::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_category(id).await?;

        let new_name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| *name != existing.name)
            .map(str::to_string);

        if let Some(name) = &new_name {
            ensure_name_available(&*self.db, name, Some(id)).await?;
        }

        let explicit_slug = input
            .slug
            .as_deref()
            .map(slugify)
            .filter(|s| !s.is_empty());

        let new_slug = match (explicit_slug, &new_name) {
            (Some(slug), _) => Some(unique_slug(&*self.db, &slug, Some(id)).await?),
            (None, Some(name)) => Some(unique_slug(&*self.db, &slugify(name), Some(id)).await?),
            (None, None) => None,
        };

        let mut active: product_category::ActiveModel = existing.into();
        if let Some(name) = new_name {
            active.name = Set(name);
        }
        if let Some(slug) = new_slug {
            active.slug = Set(slug);
        }
        let category = active.update(&*self.db).await?;

        info!(category_id = %id, slug = ?category.slug, "Updated category");
        Ok(category)
    }

    /// Refused while any product still points at the category.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let category = self.get_category(id).await?;

        let in_use = Product::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(&*self.db)
            .await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(format!(
                "category '{}' is used by {} product(s) and cannot be deleted",
                category.name, in_use
            )));
        }

        ProductCategory::delete_by_id(id).exec(&*self.db).await?;
        counter!("storefront.categories.deleted", 1);
        info!(category_id = %id, "Deleted category");
        Ok(())
    }
}

/// Names collide case-insensitively. Folding happens here rather than in
/// SQL because SQLite's `LOWER` only folds ASCII.
/// Case folding used wherever category names are compared. Done in Rust
/// because SQLite's `LOWER` only folds ASCII.
pub(crate) fn fold_name(name: &str) -> String {
    name.trim().to_lowercase()
}

async fn ensure_name_available<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    exclude: Option<Uuid>,
) -> Result<(), ServiceError> {
    let folded = fold_name(name);
    let taken = ProductCategory::find()
        .all(conn)
        .await?
        .into_iter()
        .filter(|c| Some(c.id) != exclude)
        .any(|c| fold_name(&c.name) == folded);
    if taken {
        return Err(ServiceError::Conflict(format!(
            "a category named '{}' already exists",
            name
        )));
    }
    Ok(())
}

/// First free slug among `base`, `base-1`, `base-2`, ... ignoring `exclude`.
/// An empty base yields no slug.
pub(crate) async fn unique_slug<C: ConnectionTrait>(
    conn: &C,
    base: &str,
    exclude: Option<Uuid>,
) -> Result<Option<String>, ServiceError> {
    if base.is_empty() {
        return Ok(None);
    }

    let mut counter = 0;
    loop {
        let candidate = with_suffix(base, counter);
        let mut query =
            ProductCategory::find().filter(product_category::Column::Slug.eq(candidate.as_str()));
        if let Some(id) = exclude {
            query = query.filter(product_category::Column::Id.ne(id));
        }
        if query.one(conn).await?.is_none() {
            if counter > 0 {
                debug!(base, slug = %candidate, "slug collision resolved with suffix");
            }
            return Ok(Some(candidate));
        }
        counter += 1;
    }
}
