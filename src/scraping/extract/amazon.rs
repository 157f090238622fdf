//! Amazon product page rules.

use super::SiteRules;
use super::strategy::{JsonLdField, StateKey, Strategy};

pub const RULES: SiteRules = SiteRules {
    title: &[
        Strategy::css("#productTitle"),
        Strategy::css("#title"),
        Strategy::Meta("og:title"),
        Strategy::css("h1#title"),
        Strategy::JsonLd(JsonLdField::Name),
    ],
    price: &[
        Strategy::css("#corePrice_feature_div .a-offscreen"),
        Strategy::css("#corePriceDisplay_desktop_feature_div .a-offscreen"),
        Strategy::css(".priceToPay .a-offscreen"),
        Strategy::css(".a-price .a-offscreen"),
        Strategy::css("span.a-price .a-offscreen"),
        Strategy::css("#priceblock_ourprice"),
        Strategy::css("#priceblock_dealprice"),
        Strategy::css("#priceblock_saleprice"),
        Strategy::css(r#"[data-a-color="price"] .a-offscreen"#),
        Strategy::css("#apex_desktop .a-offscreen"),
        Strategy::JsonLd(JsonLdField::Price),
        Strategy::PageState(StateKey::PriceToPay),
        Strategy::PageState(StateKey::Amount),
        Strategy::CurrencyPattern,
    ],
    list_price: &[
        Strategy::css(".a-price.a-text-price .a-offscreen"),
        Strategy::css("#priceblock_retailprice"),
        Strategy::css(".basisPrice .a-offscreen"),
        Strategy::css(".a-text-price.a-offscreen"),
        Strategy::PageState(StateKey::BasisPrice),
    ],
    image: &[
        Strategy::Meta("og:image"),
        Strategy::attr("#landingImage", "src"),
        Strategy::attr("#imgBlkFront", "src"),
        Strategy::JsonLd(JsonLdField::Image),
    ],
    installments: &[
        Strategy::css("#installmentCalculatorFeature .a-text-bold"),
        Strategy::css(".installmentPrice"),
        Strategy::css("[data-cel-widget*='installment']"),
        Strategy::css(".a-section .a-size-base.a-color-secondary"),
        Strategy::InstallmentPattern,
    ],
    per_unit_filter: true,
};
