//! WhatsApp offer copy.
//!
//! All functions here are pure: the same offer and options always render the
//! same text.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::product::{Product, ScrapedProduct};
use crate::scraping::price::format_brl;

const HEADLINE: &str = "🔥 OFERTA DO DIA";
const URGENT_HEADLINE: &str = "🔥 OFERTA DO DIA 🔥";
const URGENCY_LINE: &str = "⏰ Oferta por tempo limitado. Aproveite!";

/// The product fields an offer message is rendered from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offer<'a> {
    pub title: &'a str,
    pub price: Decimal,
    pub previous_price: Option<Decimal>,
    pub discount_pct: Option<u8>,
    pub installments: Option<&'a str>,
    pub affiliate_link: &'a str,
    pub image_url: Option<&'a str>,
}

impl<'a> From<&'a Product> for Offer<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            title: product.title.as_str(),
            price: product.price.get(),
            previous_price: product.previous_price.map(|p| p.get()),
            discount_pct: product.discount_pct.map(|d| d.get()),
            installments: product.installments.as_deref(),
            affiliate_link: product.affiliate_link.as_str(),
            image_url: product.image_url.as_ref().map(|i| i.as_str()),
        }
    }
}

impl<'a> From<&'a ScrapedProduct> for Offer<'a> {
    fn from(product: &'a ScrapedProduct) -> Self {
        Self {
            title: product.title.as_str(),
            price: product.price.get(),
            previous_price: product.previous_price.map(|p| p.get()),
            discount_pct: product.discount_pct.map(|d| d.get()),
            installments: product.installments.as_deref(),
            affiliate_link: product.affiliate_link.as_str(),
            image_url: product.image_url.as_ref().map(|i| i.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeOptions {
    pub coupon: Option<String>,
    /// Replaces the affiliate link in the last line.
    pub short_link: Option<String>,
}

/// Text and image of a channel post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostContent {
    pub text: String,
    pub image_url: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Render the standard offer message.
pub fn compose_offer_message(offer: &Offer<'_>, options: &ComposeOptions) -> String {
    let link = non_blank(options.short_link.as_deref()).unwrap_or(offer.affiliate_link);
    let mut lines: Vec<String> = vec![HEADLINE.into(), String::new(), offer.title.into(), String::new()];

    match offer.previous_price {
        Some(previous) if previous > offer.price => {
            lines.push(format!(
                "💰 De: {} por {}",
                format_brl(previous),
                format_brl(offer.price)
            ));
            if let Some(pct) = offer.discount_pct.filter(|p| *p > 0) {
                lines.push(format!("🏷️ {pct}% OFF"));
            }
        }
        _ => lines.push(format!("💰 {}", format_brl(offer.price))),
    }
    if let Some(installments) = non_blank(offer.installments) {
        lines.push(format!("💳 Ou {installments}"));
    }
    if let Some(coupon) = non_blank(options.coupon.as_deref()) {
        lines.push(format!("🎟️ Cupom: {coupon}"));
    }

    lines.push(String::new());
    lines.push(URGENCY_LINE.into());
    lines.push(String::new());
    lines.push(format!("👉 {link}"));
    lines.join("\n")
}

/// Broadcast variant with a louder headline.
pub fn compose_urgent_offer_message(offer: &Offer<'_>, options: &ComposeOptions) -> String {
    let base = compose_offer_message(offer, options);
    let body = base.strip_prefix(HEADLINE).unwrap_or(&base).trim();
    format!("{URGENT_HEADLINE}\n{body}")
}

/// Post text plus the image to attach to it.
pub fn compose_post_content(offer: &Offer<'_>, options: &ComposeOptions) -> PostContent {
    PostContent {
        text: compose_offer_message(offer, options),
        image_url: offer.image_url.map(str::to_string),
    }
}
