//! One-time migration from the legacy free-text `products.category` column
//! to `product_categories` rows referenced through `products.category_id`.

use super::category_service::{fold_name, unique_slug};
use super::slug::slugify;
use crate::entities::{product_category, ProductCategory};
use crate::errors::ServiceError;
use sea_orm::{
    sea_query::{Alias, Expr, Func, Query, Table},
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set, Statement,
};
use sea_orm_migration::SchemaManager;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, instrument, warn};

const PRODUCTS_TABLE: &str = "products";
const LEGACY_COLUMN: &str = "category";

#[derive(Debug, Clone, Copy, Default)]
pub struct BackfillOptions {
    /// Report what would happen without writing anything
    pub dry_run: bool,
    /// Remove `products.category` once every label is linked
    pub drop_legacy_column: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub legacy_column_present: bool,
    pub labels: Vec<String>,
    pub categories_created: usize,
    pub categories_reused: usize,
    pub products_linked: u64,
    pub legacy_column_dropped: bool,
}

/// Creates or reuses one category per distinct legacy label and links the
/// products carrying it. Labels differing only in case share a category.
/// Re-running is harmless: categories are matched by case-folded name and
/// already linked products are left alone.
#[instrument(skip(db))]
pub async fn backfill_categories(
    db: &DatabaseConnection,
    options: BackfillOptions,
) -> Result<BackfillReport, ServiceError> {
    let manager = SchemaManager::new(db);
    let mut report = BackfillReport::default();

    if !manager.has_column(PRODUCTS_TABLE, LEGACY_COLUMN).await? {
        info!("products.category not found; nothing to backfill");
        return Ok(report);
    }
    report.legacy_column_present = true;
    let groups = legacy_label_groups(db).await?;
    report.labels = groups
        .values()
        .filter_map(|variants| variants.iter().next().cloned())
        .collect();
    info!(count = report.labels.len(), "Found legacy category labels");

    let known: HashMap<String, product_category::Model> = ProductCategory::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (fold_name(&c.name), c))
        .collect();

    for (folded, variants) in &groups {
        let Some(label) = variants.iter().next() else {
            continue;
        };
        let existing = known.get(folded).cloned();

        if options.dry_run {
            match existing {
                Some(_) => report.categories_reused += 1,
                None => report.categories_created += 1,
            }
            continue;
        }

        let category = match existing {
            Some(category) => {
                report.categories_reused += 1;
                category
            }
            None => {
                let slug = unique_slug(db, &slugify(label), None).await?;
                report.categories_created += 1;
                product_category::ActiveModel {
                    name: Set(label.clone()),
                    slug: Set(slug),
                    ..Default::default()
                }
                .insert(db)
                .await?
            }
        };

        let mut linked = 0;
        for variant in variants {
            linked += link_products(db, variant, category.id).await?;
        }
        info!(label = %label, category_id = %category.id, linked, "Linked products");
        report.products_linked += linked;
    }

    if options.drop_legacy_column {
        if options.dry_run {
            info!("dry run: legacy column would be dropped");
        } else {
            manager
                .alter_table(
                    Table::alter()
                        .table(Alias::new(PRODUCTS_TABLE))
                        .drop_column(Alias::new(LEGACY_COLUMN))
                        .to_owned(),
                )
                .await?;
            report.legacy_column_dropped = true;
            warn!("Dropped legacy column products.category");
        }
    }

    Ok(report)
}

/// Distinct non-blank trimmed labels, grouped by their case-folded form.
/// The first spelling of each group (in sort order) names the category.
async fn legacy_label_groups(
    db: &DatabaseConnection,
) -> Result<BTreeMap<String, BTreeSet<String>>, ServiceError> {
    let backend = db.get_database_backend();
    let select = Query::select()
        .distinct()
        .column(Alias::new(LEGACY_COLUMN))
        .from(Alias::new(PRODUCTS_TABLE))
        .and_where(Expr::col(Alias::new(LEGACY_COLUMN)).is_not_null())
        .to_owned();

    let rows = db.query_all(backend.build(&select)).await?;
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for row in rows {
        let raw: Option<String> = row.try_get("", LEGACY_COLUMN)?;
        if let Some(label) = raw.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()) {
            groups.entry(fold_name(&label)).or_default().insert(label);
        }
    }
    Ok(groups)
}

async fn link_products(
    db: &DatabaseConnection,
    label: &str,
    category_id: uuid::Uuid,
) -> Result<u64, ServiceError> {
    let update = Query::update()
        .table(Alias::new(PRODUCTS_TABLE))
        .value(Alias::new("category_id"), category_id)
        .and_where(
            Expr::expr(Func::cust(Alias::new("TRIM")).arg(Expr::col(Alias::new(LEGACY_COLUMN))))
                .eq(label),
        )
        .and_where(Expr::col(Alias::new("category_id")).is_null())
        .to_owned();

    let statement: Statement = db.get_database_backend().build(&update);
    Ok(db.execute(statement).await?.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use crate::entities::{product, Product};
    use rust_decimal_macros::dec;
    use sea_orm::sea_query::ColumnDef;
    use sea_orm::{ColumnTrait, QueryFilter};

    async fn legacy_db() -> DatabaseConnection {
        let db = establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .unwrap();
        run_migrations(&db).await.unwrap();
        SchemaManager::new(&db)
            .alter_table(
                Table::alter()
                    .table(Alias::new(PRODUCTS_TABLE))
                    .add_column(ColumnDef::new(Alias::new(LEGACY_COLUMN)).string().null())
                    .to_owned(),
            )
            .await
            .unwrap();
        db
    }

    async fn legacy_product(db: &DatabaseConnection, name: &str, label: Option<&str>) -> uuid::Uuid {
        let model = product::ActiveModel {
            name: Set(name.to_string()),
            price: Set(dec!(10000)),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();

        let update = Query::update()
            .table(Alias::new(PRODUCTS_TABLE))
            .value(Alias::new(LEGACY_COLUMN), label.map(str::to_string))
            .and_where(Expr::col(Alias::new("id")).eq(model.id))
            .to_owned();
        db.execute(db.get_database_backend().build(&update))
            .await
            .unwrap();
        model.id
    }

    #[tokio::test]
    async fn links_products_and_is_idempotent() {
        let db = legacy_db().await;
        let robe = legacy_product(&db, "Robe wax", Some("Robes")).await;
        let jupe = legacy_product(&db, "Jupe plissée", Some(" Robes ")).await;
        let sac = legacy_product(&db, "Sac cuir", Some("Sacs & Pochettes")).await;
        let none = legacy_product(&db, "Sans catégorie", Some("   ")).await;

        let report = backfill_categories(&db, BackfillOptions::default()).await.unwrap();
        assert_eq!(report.labels, vec!["Robes", "Sacs & Pochettes"]);
        assert_eq!(report.categories_created, 2);
        assert_eq!(report.products_linked, 3);

        let sacs = ProductCategory::find()
            .filter(product_category::Column::Name.eq("Sacs & Pochettes"))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sacs.slug.as_deref(), Some("sacs-pochettes"));

        let category_of = |id| {
            let db = &db;
            async move { Product::find_by_id(id).one(db).await.unwrap().unwrap().category_id }
        };
        assert_eq!(category_of(robe).await, category_of(jupe).await);
        assert_eq!(category_of(sac).await, Some(sacs.id));
        assert_eq!(category_of(none).await, None);

        let again = backfill_categories(&db, BackfillOptions::default()).await.unwrap();
        assert_eq!(again.categories_created, 0);
        assert_eq!(again.categories_reused, 2);
        assert_eq!(again.products_linked, 0);
    }

    #[tokio::test]
    async fn labels_differing_in_case_share_one_category() {
        let db = legacy_db().await;
        let upper = legacy_product(&db, "Veste lin", Some("Vestes")).await;
        let lower = legacy_product(&db, "Veste jean", Some("vestes")).await;
        let echarpe = legacy_product(&db, "Écharpe laine", Some("ÉCHARPES")).await;

        let existing = product_category::ActiveModel {
            name: Set("Écharpes".to_string()),
            slug: Set(Some("echarpes".to_string())),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let report = backfill_categories(&db, BackfillOptions::default()).await.unwrap();
        assert_eq!(report.labels, vec!["Vestes", "ÉCHARPES"]);
        assert_eq!(report.categories_created, 1);
        assert_eq!(report.categories_reused, 1);
        assert_eq!(report.products_linked, 3);

        let categories = ProductCategory::find().all(&db).await.unwrap();
        assert_eq!(categories.len(), 2);

        let category_of = |id| {
            let db = &db;
            async move { Product::find_by_id(id).one(db).await.unwrap().unwrap().category_id }
        };
        let vestes = category_of(upper).await;
        assert!(vestes.is_some());
        assert_eq!(category_of(lower).await, vestes);
        assert_eq!(category_of(echarpe).await, Some(existing.id));
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let db = legacy_db().await;
        legacy_product(&db, "Robe wax", Some("Robes")).await;

        let report = backfill_categories(
            &db,
            BackfillOptions {
                dry_run: true,
                drop_legacy_column: true,
            },
        )
        .await
        .unwrap();

        assert_eq!(report.categories_created, 1);
        assert!(!report.legacy_column_dropped);
        assert!(ProductCategory::find().all(&db).await.unwrap().is_empty());
        assert!(SchemaManager::new(&db)
            .has_column(PRODUCTS_TABLE, LEGACY_COLUMN)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn drops_legacy_column_and_tolerates_missing_column() {
        let db = legacy_db().await;
        legacy_product(&db, "Robe wax", Some("Robes")).await;

        let report = backfill_categories(
            &db,
            BackfillOptions {
                dry_run: false,
                drop_legacy_column: true,
            },
        )
        .await
        .unwrap();
        assert!(report.legacy_column_dropped);

        let rerun = backfill_categories(&db, BackfillOptions::default()).await.unwrap();
        assert!(!rerun.legacy_column_present);
        assert_eq!(rerun, BackfillReport::default());
    }
}
