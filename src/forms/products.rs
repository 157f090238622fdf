use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::product::NewProduct;
use crate::domain::types::{
    AffiliateLink, CategorySlug, ExternalId, ImageUrl, Price, ProductSource, ProductTitle,
    TypeConstraintError,
};
use crate::scraping::price::discount_pct;

/// Manually entered offer.
#[derive(Debug, Deserialize, Validate)]
pub struct ManualProductForm {
    #[validate(length(min = 1))]
    pub title: String,
    pub price: Decimal,
    pub previous_price: Option<Decimal>,
    #[validate(url)]
    pub affiliate_link: String,
    #[validate(url)]
    pub image_url: Option<String>,
    pub installments: Option<String>,
    pub external_id: Option<String>,
    /// Explicit category; the title is categorized when absent.
    pub category_slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManualProductFormPayload {
    /// Product without a category yet.
    pub product: NewProduct,
    pub category_slug: Option<CategorySlug>,
}

#[derive(Debug, Error)]
pub enum ManualProductFormError {
    #[error("Manual product form validation failed: {0}")]
    Validation(String),
    #[error("Manual product form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for ManualProductFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for ManualProductFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<ManualProductForm> for ManualProductFormPayload {
    type Error = ManualProductFormError;

    fn try_from(value: ManualProductForm) -> Result<Self, Self::Error> {
        value.validate()?;

        let price = Price::new(value.price)?;
        // A list price not above the current price is dropped, not rejected.
        let previous_price = value
            .previous_price
            .filter(|p| *p > price.get())
            .map(Price::new)
            .transpose()?;

        let product = NewProduct {
            category_id: None,
            external_id: non_blank(value.external_id)
                .map(ExternalId::new)
                .transpose()?,
            source: ProductSource::Manual,
            title: ProductTitle::new(value.title)?,
            price,
            previous_price,
            discount_pct: previous_price.and_then(|prev| discount_pct(prev.get(), price.get())),
            image_url: non_blank(value.image_url).map(ImageUrl::new).transpose()?,
            installments: non_blank(value.installments),
            affiliate_link: AffiliateLink::new(value.affiliate_link)?,
            raw_url: None,
        };

        Ok(Self {
            product,
            category_slug: non_blank(value.category_slug)
                .map(CategorySlug::new)
                .transpose()?,
        })
    }
}
