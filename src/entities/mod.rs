//! SeaORM entities for the storefront catalog.

pub mod product;
pub mod product_category;
pub mod product_image;
pub mod profile;

pub use product::Entity as Product;
pub use product_category::Entity as ProductCategory;
pub use product_image::Entity as ProductImage;
pub use profile::Entity as Profile;
