//! Mercado Livre product page rules.

use super::SiteRules;
use super::strategy::{JsonLdField, StateKey, Strategy};

pub const RULES: SiteRules = SiteRules {
    title: &[
        Strategy::css(".ui-pdp-title"),
        Strategy::css(r#"[data-testid="product-title"]"#),
        Strategy::css("h1"),
        Strategy::Meta("og:title"),
        Strategy::JsonLd(JsonLdField::Name),
    ],
    price: &[
        Strategy::css(".ui-pdp-price__main-container"),
        Strategy::css(".ui-pdp-price .andes-money-amount"),
        Strategy::css(".ui-pdp-price"),
        Strategy::css(r#"[data-testid="price"]"#),
        Strategy::css(".andes-money-amount--cents-superscript"),
        Strategy::css(".price-tag"),
        Strategy::JsonLd(JsonLdField::Price),
        Strategy::PageState(StateKey::Price),
        Strategy::PageState(StateKey::Amount),
        Strategy::CurrencyPattern,
    ],
    list_price: &[
        Strategy::css(".ui-pdp-price--original .andes-money-amount__fraction"),
        Strategy::css(".andes-money-amount--previous .andes-money-amount__fraction"),
        Strategy::css(".andes-money-amount--previous"),
        Strategy::css(".ui-pdp-price__original-value"),
        Strategy::css(r#"[data-testid="original-price"] .andes-money-amount__fraction"#),
        Strategy::PageState(StateKey::OriginalPrice),
        Strategy::PageState(StateKey::ListPrice),
    ],
    image: &[
        Strategy::attr(r#".ui-pdp-image img[src*="http"]"#, "src"),
        Strategy::attr("[data-zoom]", "data-zoom"),
        Strategy::attr(".ui-pdp-image__source", "src"),
        Strategy::Meta("og:image"),
        Strategy::JsonLd(JsonLdField::Image),
    ],
    installments: &[
        Strategy::css(".ui-pdp-payment__title"),
        Strategy::css(".ui-pdp-installments"),
        Strategy::css("[data-testid='installment-option']"),
        Strategy::css(".cf-installments"),
    ],
    per_unit_filter: false,
};
