use super::category_service::fold_name;
use super::{CatalogStats, ProductWithImages, TrendingState};
use crate::{
    db,
    dto::catalog::{CreateProductInput, ProductFilter, UpdateProductInput},
    entities::{product, product_category, product_image, Product, ProductCategory, ProductImage},
    errors::ServiceError,
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub const TRENDING_LIMIT: u64 = 6;

/// Products and their image sets.
#[derive(Clone)]
pub struct ProductCatalogService {
    db: Arc<DatabaseConnection>,
}

impl ProductCatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Newest first, optionally narrowed by category and a name substring.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductWithImages>, ServiceError> {
        let mut query = Product::find();

        if let Some(category) = filter.category() {
            let category_ids = resolve_category_filter(&*self.db, category).await?;
            if category_ids.is_empty() {
                debug!(category, "category filter matched nothing");
                return Ok(Vec::new());
            }
            query = query.filter(product::Column::CategoryId.is_in(category_ids));
        }

        // SQLite's LOWER only folds ASCII, so accented names are matched here.
        let fold_in_process = self.db.get_database_backend() == DbBackend::Sqlite;
        let search = filter.search();
        if let Some(search) = search.filter(|_| !fold_in_process) {
            query = query.filter(name_contains(search));
        }

        let mut products = newest_first(query).all(&*self.db).await?;
        if let Some(search) = search.filter(|_| fold_in_process) {
            products.retain(|p| name_matches(&p.name, search));
        }
        attach_relations(&*self.db, products).await
    }

    /// At most `limit` trending products, newest first.
    #[instrument(skip(self))]
    pub async fn list_trending(&self, limit: u64) -> Result<Vec<ProductWithImages>, ServiceError> {
        let products = newest_first(Product::find().filter(product::Column::IsTrending.eq(true)))
            .limit(limit)
            .all(&*self.db)
            .await?;
        attach_relations(&*self.db, products).await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<ProductWithImages, ServiceError> {
        load_aggregate(&*self.db, id).await
    }

    /// Names of the categories that at least one product uses, by name.
    #[instrument(skip(self))]
    pub async fn list_category_labels(&self) -> Result<Vec<String>, ServiceError> {
        let used: Vec<Uuid> = Product::find()
            .select_only()
            .column(product::Column::CategoryId)
            .filter(product::Column::CategoryId.is_not_null())
            .distinct()
            .into_tuple::<Option<Uuid>>()
            .all(&*self.db)
            .await?
            .into_iter()
            .flatten()
            .collect();

        if used.is_empty() {
            return Ok(Vec::new());
        }

        let labels: BTreeSet<String> = ProductCategory::find()
            .filter(product_category::Column::Id.is_in(used))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|c| c.name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        Ok(labels.into_iter().collect())
    }

    /// Inserts the product and its images, then reloads it, as one transaction.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductWithImages, ServiceError> {
        validator::Validate::validate(&input)?;

        let created = db::transaction(&self.db, move |txn| {
            Box::pin(async move {
                if let Some(category_id) = input.category_id {
                    ensure_category_exists(txn, category_id).await?;
                }

                let model = product::ActiveModel {
                    name: Set(input.name.trim().to_string()),
                    description: Set(input.description),
                    price: Set(input.price.round_dp(2)),
                    is_trending: Set(input.is_trending),
                    stock: Set(input.stock),
                    category_id: Set(input.category_id),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                if let Some(urls) = input.image_urls {
                    insert_images(txn, model.id, &urls).await?;
                }

                load_aggregate(txn, model.id).await
            })
        })
        .await?;

        counter!("storefront.products.created", 1);
        info!(product_id = %created.product.id, images = created.images.len(), "Created product");
        Ok(created)
    }

    /// Applies the supplied fields. A supplied `image_urls` list, even an
    /// empty one, replaces every existing image in the same transaction.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductWithImages, ServiceError> {
        validator::Validate::validate(&input)?;

        let updated = db::transaction(&self.db, move |txn| {
            Box::pin(async move {
                let existing = Product::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Product", id))?;

                if let Some(Some(category_id)) = input.category_id {
                    ensure_category_exists(txn, category_id).await?;
                }

                let mut active: product::ActiveModel = existing.into();
                if let Some(name) = input.name {
                    active.name = Set(name.trim().to_string());
                }
                if let Some(description) = input.description {
                    active.description = Set(description);
                }
                if let Some(price) = input.price {
                    active.price = Set(price.round_dp(2));
                }
                if let Some(is_trending) = input.is_trending {
                    active.is_trending = Set(is_trending);
                }
                if let Some(stock) = input.stock {
                    active.stock = Set(stock);
                }
                if let Some(category_id) = input.category_id {
                    active.category_id = Set(category_id);
                }
                active.update(txn).await?;

                if let Some(urls) = input.image_urls {
                    let removed = ProductImage::delete_many()
                        .filter(product_image::Column::ProductId.eq(id))
                        .exec(txn)
                        .await?;
                    debug!(product_id = %id, removed = removed.rows_affected, "Cleared image set");
                    insert_images(txn, id, &urls).await?;
                }

                load_aggregate(txn, id).await
            })
        })
        .await?;

        counter!("storefront.products.updated", 1);
        info!(product_id = %id, "Updated product");
        Ok(updated)
    }

    /// Deletes the product and its images together.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        db::transaction(&self.db, move |txn| {
            Box::pin(async move {
                Product::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Product", id))?;

                ProductImage::delete_many()
                    .filter(product_image::Column::ProductId.eq(id))
                    .exec(txn)
                    .await?;
                Product::delete_by_id(id).exec(txn).await?;
                Ok::<_, ServiceError>(())
            })
        })
        .await?;

        counter!("storefront.products.deleted", 1);
        info!(product_id = %id, "Deleted product");
        Ok(())
    }

    /// Reads the flag, writes its negation and returns the stored value.
    /// Two concurrent toggles may both flip from the same starting state.
    #[instrument(skip(self))]
    pub async fn toggle_trending(&self, id: Uuid) -> Result<TrendingState, ServiceError> {
        let existing = Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;

        let mut active: product::ActiveModel = existing.clone().into();
        active.is_trending = Set(!existing.is_trending);
        let saved = active.update(&*self.db).await?;

        info!(product_id = %id, is_trending = saved.is_trending, "Toggled trending flag");
        Ok(TrendingState {
            id: saved.id,
            is_trending: saved.is_trending,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<CatalogStats, ServiceError> {
        let total_products = Product::find().count(&*self.db).await?;
        let trending_products = Product::find()
            .filter(product::Column::IsTrending.eq(true))
            .count(&*self.db)
            .await?;
        let out_of_stock = Product::find()
            .filter(product::Column::Stock.lte(0))
            .count(&*self.db)
            .await?;

        Ok(CatalogStats {
            total_products,
            trending_products,
            out_of_stock,
        })
    }
}

fn newest_first(query: Select<Product>) -> Select<Product> {
    query
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
}

/// Case-insensitive substring match on the product name. `%`, `_` and `\`
/// in the search text match literally.
fn name_contains(search: &str) -> sea_orm::sea_query::SimpleExpr {
    let escaped = search
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Expr::expr(Func::lower(Expr::col((
        product::Entity,
        product::Column::Name,
    ))))
    .like(LikeExpr::new(format!("%{}%", escaped)).escape('\\'))
}

fn name_matches(name: &str, search: &str) -> bool {
    fold_name(name).contains(&fold_name(search))
}

/// A category filter is either a category id, a category name (any case)
/// or a slug.
async fn resolve_category_filter<C: ConnectionTrait>(
    conn: &C,
    category: &str,
) -> Result<Vec<Uuid>, ServiceError> {
    if let Ok(id) = Uuid::parse_str(category) {
        return Ok(vec![id]);
    }

    let folded = fold_name(category);
    let ids = ProductCategory::find()
        .all(conn)
        .await?
        .into_iter()
        .filter(|c| fold_name(&c.name) == folded || c.slug.as_deref() == Some(category))
        .map(|c| c.id)
        .collect();
    Ok(ids)
}

async fn ensure_category_exists<C: ConnectionTrait>(
    conn: &C,
    category_id: Uuid,
) -> Result<(), ServiceError> {
    match ProductCategory::find_by_id(category_id).one(conn).await? {
        Some(_) => Ok(()),
        None => Err(ServiceError::ValidationError(format!(
            "category {} does not exist",
            category_id
        ))),
    }
}

/// One row per URL, `order_index` = position in `urls`.
async fn insert_images<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    urls: &[String],
) -> Result<(), ServiceError> {
    if urls.is_empty() {
        return Ok(());
    }

    let now = Utc::now();
    let rows = urls
        .iter()
        .enumerate()
        .map(|(position, url)| {
            let order_index = i32::try_from(position).map_err(|_| {
                ServiceError::ValidationError("too many images for one product".to_string())
            })?;
            Ok(product_image::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product_id),
                url: Set(url.trim().to_string()),
                order_index: Set(order_index),
                created_at: Set(now),
            })
        })
        .collect::<Result<Vec<_>, ServiceError>>()?;

    ProductImage::insert_many(rows).exec(conn).await?;
    Ok(())
}

pub(crate) async fn load_aggregate<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<ProductWithImages, ServiceError> {
    let product = Product::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Product", id))?;

    let mut loaded = attach_relations(conn, vec![product]).await?;
    loaded
        .pop()
        .ok_or_else(|| ServiceError::InternalError(format!("product {} vanished on reload", id)))
}

/// Batch-loads images and categories for `products`, keeping their order.
async fn attach_relations<C: ConnectionTrait>(
    conn: &C,
    products: Vec<product::Model>,
) -> Result<Vec<ProductWithImages>, ServiceError> {
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let mut images_by_product: HashMap<Uuid, Vec<product_image::Model>> = HashMap::new();
    for image in ProductImage::find()
        .filter(product_image::Column::ProductId.is_in(product_ids))
        .order_by_asc(product_image::Column::ProductId)
        .order_by_asc(product_image::Column::OrderIndex)
        .all(conn)
        .await?
    {
        images_by_product
            .entry(image.product_id)
            .or_default()
            .push(image);
    }

    let category_ids: BTreeSet<Uuid> = products.iter().filter_map(|p| p.category_id).collect();
    let categories: HashMap<Uuid, product_category::Model> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        ProductCategory::find()
            .filter(product_category::Column::Id.is_in(category_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    };

    Ok(products
        .into_iter()
        .map(|product| {
            let mut images = images_by_product.remove(&product.id).unwrap_or_default();
            images.sort_by_key(|image| image.order_index);
            let category = product
                .category_id
                .and_then(|category_id| categories.get(&category_id).cloned());
            ProductWithImages {
                product,
                category,
                images,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::QueryTrait;

    #[test]
    fn search_is_lowercased_and_escaped() {
        let sql = Product::find()
            .filter(name_contains("50%_Off"))
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains("LOWER(\"products\".\"name\") LIKE"));
        assert!(sql.contains("ESCAPE"));
    }

    #[test]
    fn in_process_name_match_folds_accented_capitals() {
        assert!(name_matches("Écharpe laine", "écharpe"));
        assert!(name_matches("écharpe laine", "ÉCHARPE"));
        assert!(name_matches("Remise 50%_Off", "50%_off"));
        assert!(!name_matches("Écharpe laine", "echarpe"));
    }

    #[test]
    fn listing_orders_newest_first() {
        let sql = newest_first(Product::find())
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains("ORDER BY \"products\".\"created_at\" DESC"));
    }
}
