use crate::config::CheckoutConfig;
use crate::errors::ServiceError;
use crate::services::catalog::ProductCatalogService;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

const CHAT_BASE_URL: &str = "https://wa.me";
const GROUP_SEPARATOR: char = '\u{202F}';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CheckoutLink {
    pub url: String,
}

/// Builds pre-filled chat links so a shopper can order a product.
#[derive(Clone)]
pub struct CheckoutLinkService {
    catalog: ProductCatalogService,
    config: CheckoutConfig,
}

impl CheckoutLinkService {
    pub fn new(catalog: ProductCatalogService, config: CheckoutConfig) -> Self {
        Self { catalog, config }
    }

    #[instrument(skip(self))]
    pub async fn checkout_link(&self, product_id: Uuid) -> Result<CheckoutLink, ServiceError> {
        let number = self
            .config
            .whatsapp_number
            .as_deref()
            .ok_or_else(|| ServiceError::NotFound("checkout contact is not configured".into()))?;
        let product = self.catalog.get_product(product_id).await?.product;

        Ok(CheckoutLink {
            url: build_link(
                number,
                &product.name,
                product.price,
                &self.config.currency_label,
            ),
        })
    }
}

pub fn build_link(number: &str, product_name: &str, price: Decimal, currency: &str) -> String {
    let message = format!(
        "Bonjour, je suis intéressé(e) par {} au prix de {} {}",
        product_name,
        format_price_fr(price),
        currency
    );
    let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("{}/{}?text={}", CHAT_BASE_URL, number, encoded)
}

/// French number formatting: narrow no-break space between thousands,
/// decimal comma, at most two decimals and no trailing zeros.
pub fn format_price_fr(price: Decimal) -> String {
    let rounded = price
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(*digit);
    }

    let mut out = String::new();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}
