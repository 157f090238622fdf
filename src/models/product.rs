use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::product::{NewProduct as DomainNewProduct, Product as DomainProduct};
use crate::domain::types::{
    AffiliateLink, DiscountPct, ExternalId, ImageUrl, Price, ProductSource, ProductStatus,
    ProductTitle, ProductUrl, TypeConstraintError,
};

/// Diesel model representing the `products` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub id: i32,
    pub category_id: Option<i32>,
    pub external_id: Option<String>,
    pub source: String,
    pub title: String,
    pub price_cents: i64,
    pub previous_price_cents: Option<i64>,
    pub discount_pct: Option<i32>,
    pub image_url: Option<String>,
    pub installments: Option<String>,
    pub affiliate_link: String,
    pub raw_url: Option<String>,
    pub status: String,
    pub approved_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct {
    pub category_id: Option<i32>,
    pub external_id: Option<String>,
    pub source: String,
    pub title: String,
    pub price_cents: i64,
    pub previous_price_cents: Option<i64>,
    pub discount_pct: Option<i32>,
    pub image_url: Option<String>,
    pub installments: Option<String>,
    pub affiliate_link: String,
    pub raw_url: Option<String>,
    pub status: String,
}

impl TryFrom<Product> for DomainProduct {
    type Error = TypeConstraintError;

    fn try_from(product: Product) -> Result<Self, Self::Error> {
        Ok(Self {
            id: product.id.try_into()?,
            category_id: product.category_id.map(TryInto::try_into).transpose()?,
            external_id: product.external_id.map(ExternalId::new).transpose()?,
            source: ProductSource::try_from(product.source)?,
            title: ProductTitle::new(product.title)?,
            price: Price::from_cents(product.price_cents)?,
            previous_price: product
                .previous_price_cents
                .map(Price::from_cents)
                .transpose()?,
            discount_pct: product.discount_pct.map(DiscountPct::new).transpose()?,
            image_url: product.image_url.map(ImageUrl::new).transpose()?,
            installments: product.installments,
            affiliate_link: AffiliateLink::new(product.affiliate_link)?,
            raw_url: product.raw_url.map(ProductUrl::new).transpose()?,
            status: ProductStatus::try_from(product.status)?,
            approved_at: product.approved_at,
            created_at: product.created_at,
            updated_at: product.updated_at,
        })
    }
}

impl From<DomainNewProduct> for NewProduct {
    fn from(product: DomainNewProduct) -> Self {
        Self {
            category_id: product.category_id.map(|id| id.get()),
            external_id: product.external_id.map(ExternalId::into_inner),
            source: product.source.into(),
            title: product.title.into_inner(),
            price_cents: product.price.to_cents(),
            previous_price_cents: product.previous_price.map(Price::to_cents),
            discount_pct: product.discount_pct.map(|d| i32::from(d.get())),
            image_url: product.image_url.map(ImageUrl::into_inner),
            installments: product.installments,
            affiliate_link: product.affiliate_link.into_inner(),
            raw_url: product.raw_url.map(ProductUrl::into_inner),
            status: ProductStatus::Pending.into(),
        }
    }
}
