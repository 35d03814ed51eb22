pub mod categories;
pub mod common;
pub mod health;
pub mod products;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        catalog::{CategoryService, ProductCatalogService},
        checkout_link_service::CheckoutLinkService,
        media::{ImageUploadService, ObjectStorage},
    },
};
use std::sync::Arc;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub product_catalog: Arc<ProductCatalogService>,
    pub categories: Arc<CategoryService>,
    pub images: Arc<ImageUploadService>,
    pub checkout: Arc<CheckoutLinkService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, storage: Arc<dyn ObjectStorage>, config: &AppConfig) -> Self {
        let product_catalog = ProductCatalogService::new(db_pool.clone());
        let checkout = CheckoutLinkService::new(product_catalog.clone(), config.checkout.clone());

        Self {
            product_catalog: Arc::new(product_catalog),
            categories: Arc::new(CategoryService::new(db_pool)),
            images: Arc::new(ImageUploadService::new(
                storage,
                config.storage.max_upload_bytes,
            )),
            checkout: Arc::new(checkout),
        }
    }
}
