use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    AffiliateLink, CategoryId, DiscountPct, ExternalId, ImageUrl, Price, ProductId, ProductSource,
    ProductStatus, ProductTitle, ProductUrl, SourceSite,
};

/// Product fields extracted from a single marketplace page.
///
/// Ephemeral: produced by the field extractor and either persisted as a
/// [`NewProduct`] or returned to the caller as a preview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapedProduct {
    pub title: ProductTitle,
    pub price: Price,
    /// Struck-through list price, only kept when greater than `price`.
    pub previous_price: Option<Price>,
    pub discount_pct: Option<DiscountPct>,
    pub image_url: Option<ImageUrl>,
    pub installments: Option<String>,
    pub affiliate_link: AffiliateLink,
    pub raw_url: ProductUrl,
    pub source_site: SourceSite,
    pub external_id: Option<ExternalId>,
}

/// A persisted offer awaiting moderation or dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub external_id: Option<ExternalId>,
    pub source: ProductSource,
    pub title: ProductTitle,
    pub price: Price,
    pub previous_price: Option<Price>,
    pub discount_pct: Option<DiscountPct>,
    pub image_url: Option<ImageUrl>,
    pub installments: Option<String>,
    pub affiliate_link: AffiliateLink,
    pub raw_url: Option<ProductUrl>,
    pub status: ProductStatus,
    pub approved_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Information required to create a new [`Product`].
///
/// New products always start in [`ProductStatus::Pending`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProduct {
    pub category_id: Option<CategoryId>,
    pub external_id: Option<ExternalId>,
    pub source: ProductSource,
    pub title: ProductTitle,
    pub price: Price,
    pub previous_price: Option<Price>,
    pub discount_pct: Option<DiscountPct>,
    pub image_url: Option<ImageUrl>,
    pub installments: Option<String>,
    pub affiliate_link: AffiliateLink,
    pub raw_url: Option<ProductUrl>,
}

impl NewProduct {
    /// Converts an extraction result into an insertable product.
    pub fn from_scraped(scraped: ScrapedProduct, category_id: Option<CategoryId>) -> Self {
        Self {
            category_id,
            external_id: scraped.external_id,
            source: scraped.source_site.into(),
            title: scraped.title,
            price: scraped.price,
            previous_price: scraped.previous_price,
            discount_pct: scraped.discount_pct,
            image_url: scraped.image_url,
            installments: scraped.installments,
            affiliate_link: scraped.affiliate_link,
            raw_url: Some(scraped.raw_url),
        }
    }
}
