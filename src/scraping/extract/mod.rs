//! Field extraction from a fetched product page.
//!
//! Every field runs an ordered cascade of [`Strategy`] values taken from the
//! site's [`SiteRules`] and keeps the first plausible result.

use thiserror::Error;
use url::Url;

use crate::domain::product::ScrapedProduct;
use crate::domain::types::{
    AffiliateLink, ExternalId, ImageUrl, Price, ProductTitle, ProductUrl, SourceSite,
};
use crate::scraping::price::discount_pct;
use crate::scraping::site::{external_id, with_partner_tag};

mod amazon;
mod jsonld;
mod mercadolivre;
pub mod per_unit;
mod shopee;
pub mod strategy;

pub use per_unit::PerUnitPriceFilter;
pub use strategy::{Page, Strategy, TextField};

/// Ordered strategies per field for one marketplace.
#[derive(Debug, Clone, Copy)]
pub struct SiteRules {
    pub title: &'static [Strategy],
    pub price: &'static [Strategy],
    pub list_price: &'static [Strategy],
    pub image: &'static [Strategy],
    pub installments: &'static [Strategy],
    /// Apply [`PerUnitPriceFilter`] to selector price candidates.
    pub per_unit_filter: bool,
}

impl SiteRules {
    pub const fn for_site(site: SourceSite) -> &'static SiteRules {
        match site {
            SourceSite::Amazon => &amazon::RULES,
            SourceSite::MercadoLivre => &mercadolivre::RULES,
            SourceSite::Shopee => &shopee::RULES,
        }
    }
}

/// Knobs of a single extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Amazon associates tag added to affiliate links.
    pub partner_tag: Option<String>,
    pub exclude_per_unit_prices: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("product title not found")]
    MissingTitle,
    #[error("product price not found")]
    MissingPrice,
    /// The page or affiliate URL was rejected as a stored link.
    #[error("invalid product url: {0}")]
    InvalidUrl(String),
}

fn absolute_http(raw: &str, base: &Url) -> Option<Url> {
    let url = base.join(raw.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Extract a [`ScrapedProduct`] from `html`, fetched from `url`.
pub fn extract_product(
    html: &str,
    url: &Url,
    site: SourceSite,
    options: &ExtractOptions,
) -> Result<ScrapedProduct, ExtractionError> {
    let rules = SiteRules::for_site(site);
    let page = Page::parse(html);

    let title = page
        .first_text(rules.title, TextField::Title)
        .and_then(|t| ProductTitle::new(t).ok())
        .ok_or(ExtractionError::MissingTitle)?;

    let filter = (rules.per_unit_filter && options.exclude_per_unit_prices)
        .then(PerUnitPriceFilter::default);
    let price = page
        .first_price(rules.price, filter.as_ref(), |_| true)
        .and_then(|p| Price::new(p).ok())
        .ok_or(ExtractionError::MissingPrice)?;
    let previous_price = page
        .first_price(rules.list_price, filter.as_ref(), |p| p > price.get())
        .and_then(|p| Price::new(p).ok())
        .filter(|prev| *prev > price);
    let discount = previous_price.and_then(|prev| discount_pct(prev.get(), price.get()));

    let image_url = page
        .first_text(rules.image, TextField::Image)
        .and_then(|raw| absolute_http(&raw, url))
        .and_then(|u| ImageUrl::new(u.as_str()).ok());
    let installments = page.first_text(rules.installments, TextField::Installments);

    let canonical = page
        .text(&Strategy::Meta("og:url"), TextField::Image)
        .and_then(|raw| absolute_http(&raw, url));
    let mut link = canonical.clone().unwrap_or_else(|| url.clone());
    if site == SourceSite::Amazon
        && let Some(tag) = options.partner_tag.as_deref().filter(|t| !t.is_empty())
    {
        link = with_partner_tag(&link, tag);
    }
    let affiliate_link = AffiliateLink::new(link.as_str())
        .map_err(|_| ExtractionError::InvalidUrl(link.to_string()))?;
    let raw_url =
        ProductUrl::new(url.as_str()).map_err(|_| ExtractionError::InvalidUrl(url.to_string()))?;

    let external_id = external_id(site, url)
        .or_else(|| canonical.as_ref().and_then(|c| external_id(site, c)))
        .and_then(|id| ExternalId::new(id).ok());

    log::debug!("extracted {site} product `{title}` at {price} from {url}");

    Ok(ScrapedProduct {
        title,
        price,
        previous_price,
        discount_pct: discount,
        image_url,
        installments,
        affiliate_link,
        raw_url,
        source_site: site,
        external_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn options() -> ExtractOptions {
        ExtractOptions {
            partner_tag: Some("ofertas-20".into()),
            exclude_per_unit_prices: true,
        }
    }

    const AMAZON_PAGE: &str = r#"<html><head>
        <meta property="og:image" content="https://m.media-amazon.com/images/I/echo.jpg">
        </head><body>
        <span id="productTitle">
            Echo Dot 5ª geração   Smart speaker com Alexa
        </span>
        <div id="corePrice_feature_div">
          <span class="a-price"><span class="a-offscreen">R$ 379,05</span></span>
          <span class="a-price a-text-price"><span class="a-offscreen">R$ 499,00</span></span>
        </div>
        <div id="installmentCalculatorFeature"><span class="a-text-bold">em 10x de R$ 37,91 sem juros</span></div>
        </body></html>"#;

    #[test]
    fn amazon_page_yields_all_fields() {
        let product = extract_product(
            AMAZON_PAGE,
            &url("https://www.amazon.com.br/dp/B09B8V1LZ3?ref=deal"),
            SourceSite::Amazon,
            &options(),
        )
        .unwrap();

        assert_eq!(
            product.title.as_str(),
            "Echo Dot 5ª geração Smart speaker com Alexa"
        );
        assert_eq!(product.price.get(), Decimal::new(37905, 2));
        assert_eq!(
            product.previous_price.map(|p| p.get()),
            Some(Decimal::new(49900, 2))
        );
        assert_eq!(product.discount_pct.map(|d| d.get()), Some(24));
        assert_eq!(
            product.installments.as_deref(),
            Some("em 10x de R$ 37,91 sem juros")
        );
        assert_eq!(
            product.image_url.as_ref().map(|i| i.as_str()),
            Some("https://m.media-amazon.com/images/I/echo.jpg")
        );
        assert_eq!(
            product.affiliate_link.as_str(),
            "https://www.amazon.com.br/dp/B09B8V1LZ3?ref=deal&tag=ofertas-20"
        );
        assert_eq!(product.external_id.unwrap().as_str(), "B09B8V1LZ3");
    }

    #[test]
    fn per_unit_price_falls_through_to_page_state() {
        let html = r#"<span id="productTitle">Água mineral 12 unidades</span>
            <div class="a-section"><span class="a-price"><span class="a-offscreen">R$ 2,10</span></span> por litro</div>
            <script>var data = {"priceToPay":{"amount":25.20}};</script>"#;
        let page_url = url("https://www.amazon.com.br/dp/B000000001");

        let filtered =
            extract_product(html, &page_url, SourceSite::Amazon, &options()).unwrap();
        assert_eq!(filtered.price.get(), Decimal::new(2520, 2));

        let unfiltered = extract_product(
            html,
            &page_url,
            SourceSite::Amazon,
            &ExtractOptions::default(),
        )
        .unwrap();
        assert_eq!(unfiltered.price.get(), Decimal::new(210, 2));
    }

    #[test]
    fn list_price_not_above_current_is_dropped() {
        let html = r#"<span id="productTitle">Cafeteira</span>
            <span id="priceblock_ourprice">R$ 199,90</span>
            <span id="priceblock_retailprice">R$ 150,00</span>"#;
        let product = extract_product(
            html,
            &url("https://www.amazon.com.br/dp/B000000002"),
            SourceSite::Amazon,
            &options(),
        )
        .unwrap();
        assert!(product.previous_price.is_none());
        assert!(product.discount_pct.is_none());
    }

    #[test]
    fn mercado_livre_page_uses_site_selectors() {
        let html = r#"<html><head>
            <meta property="og:url" content="https://produto.mercadolivre.com.br/MLB-1234567890-fone">
            </head><body>
            <h1 class="ui-pdp-title">Fone Bluetooth JBL</h1>
            <s class="andes-money-amount--previous"><span class="andes-money-amount__fraction">349</span></s>
            <div class="ui-pdp-price__main-container">R$ 1.299</div>
            <figure class="ui-pdp-image"><img src="https://http2.mlstatic.com/fone.webp"></figure>
            <p class="ui-pdp-payment__title">Mesmo preço em 12x R$ 108,25 sem juros</p>
            </body></html>"#;
        let product = extract_product(
            html,
            &url("https://www.mercadolivre.com.br/fone/p/MLB123"),
            SourceSite::MercadoLivre,
            &options(),
        )
        .unwrap();

        assert_eq!(product.title.as_str(), "Fone Bluetooth JBL");
        assert_eq!(product.price.get(), Decimal::from(1299));
        // 349 < 1299, so no list price.
        assert!(product.previous_price.is_none());
        assert_eq!(
            product.affiliate_link.as_str(),
            "https://produto.mercadolivre.com.br/MLB-1234567890-fone"
        );
        assert_eq!(product.external_id.unwrap().as_str(), "MLB123");
        assert_eq!(
            product.installments.as_deref(),
            Some("em 12x R$ 108,25 sem juros")
        );
    }

    #[test]
    fn jsonld_graph_supplies_shopee_fields() {
        let html = r#"<script type="application/ld+json">
            {"@context":"https://schema.org","@graph":[
              {"@type":"BreadcrumbList"},
              {"@type":"Product","name":"Kit 3 Camisetas","image":["/img/kit.jpg"],
               "offers":{"@type":"Offer","price":"59.90","priceCurrency":"BRL"}}
            ]}</script>
            <script>{"price_before_discount": 9990000}</script>"#;
        let product = extract_product(
            html,
            &url("https://shopee.com.br/Kit-3-Camisetas-i.123.456"),
            SourceSite::Shopee,
            &options(),
        )
        .unwrap();

        assert_eq!(product.title.as_str(), "Kit 3 Camisetas");
        assert_eq!(product.price.get(), Decimal::new(5990, 2));
        assert_eq!(
            product.previous_price.map(|p| p.get()),
            Some(Decimal::new(999, 1))
        );
        assert_eq!(product.discount_pct.map(|d| d.get()), Some(40));
        assert_eq!(
            product.image_url.unwrap().as_str(),
            "https://shopee.com.br/img/kit.jpg"
        );
        assert_eq!(product.external_id.unwrap().as_str(), "123.456");
        // Shopee links are never tagged.
        assert_eq!(
            product.affiliate_link.as_str(),
            "https://shopee.com.br/Kit-3-Camisetas-i.123.456"
        );
    }

    #[test]
    fn missing_fields_are_reported() {
        let page_url = url("https://www.amazon.com.br/dp/B000000003");
        assert_eq!(
            extract_product("<p>R$ 10,00</p>", &page_url, SourceSite::Amazon, &options()),
            Err(ExtractionError::MissingTitle)
        );
        assert_eq!(
            extract_product(
                r#"<span id="productTitle">Sem preço</span>"#,
                &page_url,
                SourceSite::Amazon,
                &options()
            ),
            Err(ExtractionError::MissingPrice)
        );
    }

    #[test]
    fn sub_cent_price_is_not_a_price() {
        let page_url = url("https://www.amazon.com.br/dp/B000000004");
        let html = r#"<span id="productTitle">Parafuso</span><script>{"amount": 0.004}</script>"#;
        assert_eq!(
            extract_product(html, &page_url, SourceSite::Amazon, &options()),
            Err(ExtractionError::MissingPrice)
        );

        let html = r#"<span id="productTitle">Parafuso</span>
            <script>{"amount": 0.004}</script><p>R$ 0,35</p>"#;
        let product = extract_product(html, &page_url, SourceSite::Amazon, &options()).unwrap();
        assert_eq!(product.price.get(), Decimal::new(35, 2));
        assert_eq!(product.price.to_cents(), 35);
    }

    #[test]
    fn encoded_page_url_is_kept_as_link() {
        let page_url =
            url("https://www.mercadolivre.com.br/cafeteira-el%C3%A9trica/p/MLB123?x=1#d");
        let html = r#"<h1 class="ui-pdp-title">Cafeteira</h1><p>R$ 199,90</p>"#;
        let product =
            extract_product(html, &page_url, SourceSite::MercadoLivre, &options()).unwrap();
        assert_eq!(product.raw_url.as_str(), page_url.as_str());
        assert_eq!(product.affiliate_link.as_str(), page_url.as_str());
    }
}
