pub mod category_backfill;
pub mod category_service;
pub mod product_catalog_service;
pub mod slug;

use crate::entities::{product, product_category, product_image};
use serde::Serialize;
use uuid::Uuid;

pub use category_service::CategoryService;
pub use product_catalog_service::{ProductCatalogService, TRENDING_LIMIT};

/// A product together with everything it owns or points at. Images are
/// always sorted by `order_index` ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductWithImages {
    pub product: product::Model,
    pub category: Option<product_category::Model>,
    pub images: Vec<product_image::Model>,
}

/// Outcome of a trending toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendingState {
    pub id: Uuid,
    pub is_trending: bool,
}

/// Dashboard counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total_products: u64,
    pub trending_products: u64,
    pub out_of_stock: u64,
}
