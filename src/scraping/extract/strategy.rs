//! Ordered extraction strategies and their evaluation against a page.

use std::cell::OnceCell;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::jsonld;
use super::per_unit::PerUnitPriceFilter;
use crate::scraping::price::{is_plausible, parse_brl, parse_json_number};

/// Shopee page state stores prices multiplied by this factor.
const SHOPEE_PRICE_SCALE: u32 = 100_000;

static PRICE_TO_PAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"priceToPay["\s]*:["\s]*\{[^}]*"amount"["\s]*:["\s]*([\d.]+)"#)
        .expect("valid regex")
});
static BASIS_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"basisPrice["\s]*:["\s]*\{[^}]*"amount"["\s]*:["\s]*([\d.]+)"#)
        .expect("valid regex")
});
static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""amount"\s*:\s*([\d.]+)"#).expect("valid regex"));
static PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""price"\s*:\s*"?([\d.]+)"#).expect("valid regex"));
static ORIGINAL_PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""original_price"\s*:\s*([\d.]+)"#).expect("valid regex"));
static LIST_PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""list_price"\s*:\s*([\d.]+)"#).expect("valid regex"));
static PRICE_MIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""price_min"\s*:\s*([\d.]+)"#).expect("valid regex"));
static PRICE_MAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""price_max"\s*:\s*([\d.]+)"#).expect("valid regex"));
static PRICE_BEFORE_DISCOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""price_before_discount"\s*:\s*([\d.]+)"#).expect("valid regex")
});
static CURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"R\$\s*[\d.,]+").expect("valid regex"));
static INSTALLMENT_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)em\s*\d+x\s*(?:de\s*)?R\$\s*[\d.,]+(?:\s*sem\s*juros)?").expect("valid regex")
});
static INSTALLMENT_SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+x\s*de\s*R\$\s*[\d.,]+").expect("valid regex"));
static INSTALLMENT_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:em\s*)?\d+x\s*de\s*R\$\s*[\d.,]+(?:\s*sem\s*juros)?").expect("valid regex")
});

/// Field of a JSON-LD `Product` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonLdField {
    Name,
    Image,
    Price,
}

/// Key searched in inline page-state JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKey {
    /// Amazon `priceToPay.amount`, the price actually charged.
    PriceToPay,
    /// Amazon `basisPrice.amount`, the struck-through price.
    BasisPrice,
    Amount,
    Price,
    OriginalPrice,
    ListPrice,
    PriceMin,
    PriceMax,
    PriceBeforeDiscount,
}

impl StateKey {
    fn pattern(self) -> &'static Regex {
        match self {
            Self::PriceToPay => &PRICE_TO_PAY,
            Self::BasisPrice => &BASIS_PRICE,
            Self::Amount => &AMOUNT,
            Self::Price => &PRICE,
            Self::OriginalPrice => &ORIGINAL_PRICE,
            Self::ListPrice => &LIST_PRICE,
            Self::PriceMin => &PRICE_MIN,
            Self::PriceMax => &PRICE_MAX,
            Self::PriceBeforeDiscount => &PRICE_BEFORE_DISCOUNT,
        }
    }

    fn is_scaled(self) -> bool {
        matches!(
            self,
            Self::PriceMin | Self::PriceMax | Self::PriceBeforeDiscount
        )
    }

    /// Decode a captured number, undoing Shopee's integer price scaling.
    fn decode(self, raw: &str) -> Option<Decimal> {
        let value = parse_json_number(raw)?;
        if self.is_scaled() && !raw.contains('.') && value >= Decimal::from(SHOPEE_PRICE_SCALE) {
            Some(value / Decimal::from(SHOPEE_PRICE_SCALE))
        } else {
            Some(value)
        }
    }
}

/// One way of locating a field value, tried in order until one succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// First element matching `css`; its text, or `attr` when given.
    Selector {
        css: &'static str,
        attr: Option<&'static str>,
    },
    /// `<meta property=... content=...>` (OpenGraph).
    Meta(&'static str),
    /// Embedded JSON-LD `Product` block.
    JsonLd(JsonLdField),
    /// Regex scan of inline page-state JSON.
    PageState(StateKey),
    /// First plausible `R$ 1.234,56` anywhere in the raw HTML.
    CurrencyPattern,
    /// First installment phrase anywhere in the raw HTML.
    InstallmentPattern,
}

impl Strategy {
    pub const fn css(css: &'static str) -> Self {
        Self::Selector { css, attr: None }
    }

    pub const fn attr(css: &'static str, attr: &'static str) -> Self {
        Self::Selector {
            css,
            attr: Some(attr),
        }
    }
}

/// Text field post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Image,
    Installments,
}

/// Parsed page shared by every strategy.
pub struct Page<'a> {
    raw: &'a str,
    document: Html,
    jsonld: OnceCell<Vec<Value>>,
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Installment phrase inside a selector's text (`em 12x de R$ 25,00 sem juros`).
fn installment_phrase(text: &str) -> Option<String> {
    INSTALLMENT_PHRASE
        .find(text)
        .or_else(|| INSTALLMENT_SHORT.find(text))
        .map(|m| collapse_whitespace(m.as_str()))
        .filter(|m| m.len() > 5)
}

impl<'a> Page<'a> {
    pub fn parse(raw: &'a str) -> Self {
        Self {
            raw,
            document: Html::parse_document(raw),
            jsonld: OnceCell::new(),
        }
    }

    fn jsonld_product(&self) -> Option<&Value> {
        let blocks = self.jsonld.get_or_init(|| jsonld::blocks(&self.document));
        jsonld::find_product(blocks)
    }

    fn first_element(&self, css: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(css).ok()?;
        self.document.select(&selector).next()
    }

    fn meta(&self, property: &str) -> Option<String> {
        let css = format!(r#"meta[property="{property}"]"#);
        self.first_element(&css)?
            .value()
            .attr("content")
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }

    /// Evaluate `strategy` for a text field.
    pub fn text(&self, strategy: &Strategy, field: TextField) -> Option<String> {
        let value = match *strategy {
            Strategy::Selector { css, attr } => {
                let element = self.first_element(css)?;
                match attr {
                    Some(attr) => element.value().attr(attr).map(str::to_string),
                    None => Some(element.text().collect::<String>()),
                }
            }
            Strategy::Meta(property) => self.meta(property),
            Strategy::JsonLd(JsonLdField::Name) => jsonld::name(self.jsonld_product()?),
            Strategy::JsonLd(JsonLdField::Image) => jsonld::image(self.jsonld_product()?),
            Strategy::InstallmentPattern => {
                let phrase = collapse_whitespace(INSTALLMENT_PAGE.find(self.raw)?.as_str());
                return Some(if phrase.to_lowercase().starts_with("em") {
                    phrase
                } else {
                    format!("em {phrase}")
                });
            }
            Strategy::JsonLd(JsonLdField::Price)
            | Strategy::PageState(_)
            | Strategy::CurrencyPattern => None,
        }?;

        match field {
            TextField::Title => Some(collapse_whitespace(&value)).filter(|t| !t.is_empty()),
            TextField::Image => {
                let value = value.trim();
                (!value.is_empty()).then(|| value.to_string())
            }
            TextField::Installments => installment_phrase(&value),
        }
    }

    /// Evaluate `strategy` for a price field; only values passing `accept` count.
    pub fn price(
        &self,
        strategy: &Strategy,
        filter: Option<&PerUnitPriceFilter>,
        accept: impl Fn(Decimal) -> bool,
    ) -> Option<Decimal> {
        let accept = |p: Decimal| is_plausible(p) && accept(p);
        match *strategy {
            Strategy::Selector { css, attr } => {
                let element = self.first_element(css)?;
                if filter.is_some_and(|f| f.excludes(element)) {
                    return None;
                }
                let text = match attr {
                    Some(attr) => element.value().attr(attr)?.to_string(),
                    None => element.text().collect::<String>(),
                };
                parse_brl(&text).filter(|p| accept(*p))
            }
            Strategy::Meta(property) => {
                let content = self.meta(property)?;
                parse_json_number(&content)
                    .or_else(|| parse_brl(&content))
                    .filter(|p| accept(*p))
            }
            Strategy::JsonLd(JsonLdField::Price) => {
                let raw = jsonld::offer_price(self.jsonld_product()?)?;
                parse_json_number(&raw).filter(|p| accept(*p))
            }
            Strategy::PageState(key) => key
                .pattern()
                .captures_iter(self.raw)
                .filter_map(|c| key.decode(&c[1]))
                .find(|p| accept(*p)),
            Strategy::CurrencyPattern => CURRENCY
                .find_iter(self.raw)
                .filter_map(|m| parse_brl(m.as_str()))
                .find(|p| accept(*p)),
            Strategy::JsonLd(_) | Strategy::InstallmentPattern => None,
        }
    }

    /// Run a text cascade, returning the first hit.
    pub fn first_text(&self, strategies: &[Strategy], field: TextField) -> Option<String> {
        strategies.iter().find_map(|s| self.text(s, field))
    }

    /// Run a price cascade, returning the first accepted value.
    pub fn first_price(
        &self,
        strategies: &[Strategy],
        filter: Option<&PerUnitPriceFilter>,
        accept: impl Fn(Decimal) -> bool,
    ) -> Option<Decimal> {
        strategies
            .iter()
            .find_map(|s| self.price(s, filter, &accept))
    }
}
