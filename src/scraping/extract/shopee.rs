//! Shopee product page rules.
//!
//! Shopee renders client side, so structured data and the inline item state
//! carry most of the fields.

use super::SiteRules;
use super::strategy::{JsonLdField, StateKey, Strategy};

pub const RULES: SiteRules = SiteRules {
    title: &[
        Strategy::JsonLd(JsonLdField::Name),
        Strategy::Meta("og:title"),
        Strategy::css("h1"),
    ],
    price: &[
        Strategy::JsonLd(JsonLdField::Price),
        Strategy::PageState(StateKey::PriceMin),
        Strategy::PageState(StateKey::PriceMax),
        Strategy::PageState(StateKey::Price),
        Strategy::CurrencyPattern,
    ],
    list_price: &[Strategy::PageState(StateKey::PriceBeforeDiscount)],
    image: &[
        Strategy::Meta("og:image"),
        Strategy::JsonLd(JsonLdField::Image),
    ],
    installments: &[Strategy::InstallmentPattern],
    per_unit_filter: false,
};
