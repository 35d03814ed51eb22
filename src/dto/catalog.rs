//! Write payloads for products and categories, with their field rules.
//!
//! Create payloads use the `validator` derive; the partial product update
//! carries nullable fields as `Option<Option<T>>` and is validated by hand
//! with the same per-field rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

pub const PRODUCT_NAME_MIN: usize = 3;
pub const PRODUCT_NAME_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 1000;
pub const CATEGORY_NAME_MIN: usize = 2;
pub const CATEGORY_NAME_MAX: usize = 100;

/// Largest value that fits `decimal(10, 2)`
fn max_price() -> Decimal {
    Decimal::new(99_999_999_99, 2)
}

fn field_error(code: &'static str, message: impl Into<String>) -> ValidationError {
    let message: String = message.into();
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

pub fn validate_product_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if (PRODUCT_NAME_MIN..=PRODUCT_NAME_MAX).contains(&len) {
        Ok(())
    } else {
        Err(field_error(
            "length",
            format!(
                "Product name must be between {} and {} characters",
                PRODUCT_NAME_MIN, PRODUCT_NAME_MAX
            ),
        ))
    }
}

pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() <= DESCRIPTION_MAX {
        Ok(())
    } else {
        Err(field_error(
            "length",
            format!("Description cannot exceed {} characters", DESCRIPTION_MAX),
        ))
    }
}

pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO || price.round_dp(2) <= Decimal::ZERO {
        return Err(field_error("range", "Price must be greater than 0"));
    }
    if price.round_dp(2) > max_price() {
        return Err(field_error("range", "Price cannot exceed 99999999.99"));
    }
    Ok(())
}

pub fn validate_stock(stock: i32) -> Result<(), ValidationError> {
    if stock >= 0 {
        Ok(())
    } else {
        Err(field_error("range", "Stock cannot be negative"))
    }
}

/// Every entry must be an absolute http(s) URL.
pub fn validate_image_urls(urls: &[String]) -> Result<(), ValidationError> {
    for (index, raw) in urls.iter().enumerate() {
        let ok = url::Url::parse(raw.trim())
            .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
            .unwrap_or(false);
        if !ok {
            return Err(field_error(
                "url",
                format!("Image URL at position {} is not a valid URL", index),
            ));
        }
    }
    Ok(())
}

pub fn validate_category_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if len < CATEGORY_NAME_MIN {
        Err(field_error(
            "length",
            format!(
                "Category name must contain at least {} characters",
                CATEGORY_NAME_MIN
            ),
        ))
    } else if len > CATEGORY_NAME_MAX {
        Err(field_error(
            "length",
            format!("Category name cannot exceed {} characters", CATEGORY_NAME_MAX),
        ))
    } else {
        Ok(())
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(custom = "validate_product_name")]
    #[schema(example = "Jacket FO2")]
    pub name: String,

    #[validate(custom = "validate_description")]
    #[serde(default)]
    pub description: Option<String>,

    #[validate(custom = "validate_price")]
    #[schema(value_type = String, example = "15000")]
    pub price: Decimal,

    #[serde(default)]
    pub is_trending: bool,

    #[serde(default)]
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,

    #[serde(default)]
    pub category_id: Option<Uuid>,

    /// Display order follows list order
    #[validate(custom = "validate_image_urls")]
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
}

/// Partial product update. `image_urls`, when present (even empty),
/// replaces the whole image set.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateProductInput {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,

    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,

    #[serde(default)]
    pub is_trending: Option<bool>,

    #[serde(default)]
    pub stock: Option<i32>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub category_id: Option<Option<Uuid>>,

    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
}

impl Validate for UpdateProductInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(name) = &self.name {
            if let Err(e) = validate_product_name(name) {
                errors.add("name", e);
            }
        }
        if let Some(Some(description)) = &self.description {
            if let Err(e) = validate_description(description) {
                errors.add("description", e);
            }
        }
        if let Some(price) = &self.price {
            if let Err(e) = validate_price(price) {
                errors.add("price", e);
            }
        }
        if let Some(stock) = self.stock {
            if let Err(e) = validate_stock(stock) {
                errors.add("stock", e);
            }
        }
        if let Some(urls) = &self.image_urls {
            if let Err(e) = validate_image_urls(urls) {
                errors.add("image_urls", e);
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Query filters for the public product listing
#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Category id, name or slug
    pub category: Option<String>,
    /// Case-insensitive substring of the product name
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateCategoryInput {
    #[validate(custom = "validate_category_name")]
    #[schema(example = "Écharpes & Gants")]
    pub name: String,

    /// Derived from the name when omitted
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCategoryInput {
    #[validate(custom = "validate_category_name")]
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub slug: Option<String>,
}
