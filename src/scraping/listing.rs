//! Listing pages: detection, product link harvesting and canonicalization.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::fetch::{FetchError, PageFetcher};
use super::site::external_id;
use crate::domain::types::SourceSite;

static MERCADO_LIVRE_PRODUCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/p/[A-Za-z0-9]+").expect("valid regex"));
static SHOPEE_PRODUCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[^/]+-i\.\d+\.\d+").expect("valid regex"));

const MAX_MERCADO_LIVRE_PATH: usize = 200;
const MAX_SHOPEE_PATH: usize = 500;

/// Whether `url` points at a page listing many products rather than one.
pub fn looks_like_listing(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let root = path.is_empty() || path == "/";

    match SourceSite::from_url(url) {
        Some(SourceSite::Amazon) => {
            path.contains("/deals")
                || path == "/s"
                || path.starts_with("/s/")
                || path == "/b"
                || path.contains("/b/")
                || path.contains("/gp/offer-listing")
                || path.contains("/gp/goldbox")
        }
        Some(SourceSite::MercadoLivre) => {
            host.starts_with("lista.")
                || path.contains("/ofertas")
                || path.contains("/lista")
                || path.contains("/busca")
                || root
        }
        Some(SourceSite::Shopee) => {
            path.contains("/flash-sale")
                || path.contains("/cat/")
                || path.contains("/search")
                || root
        }
        None => false,
    }
}

fn strip_locator(mut url: Url) -> Url {
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Resolve `href` against `base` and rewrite it to its canonical product URL.
///
/// Links that are not product pages of a known marketplace yield `None`.
pub fn canonicalize(href: &str, base: &Url) -> Option<Url> {
    let url = base.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let path = url.path();
    match SourceSite::from_url(&url)? {
        SourceSite::Amazon => {
            let asin = external_id(SourceSite::Amazon, &url)?;
            Url::parse(&format!("https://www.amazon.com.br/dp/{asin}")).ok()
        }
        SourceSite::MercadoLivre => {
            let is_product = MERCADO_LIVRE_PRODUCT.is_match(path)
                || (path.contains("MLB") && path.len() < MAX_MERCADO_LIVRE_PATH);
            is_product.then(|| strip_locator(url))
        }
        SourceSite::Shopee => {
            let is_product = SHOPEE_PRODUCT.is_match(path) && path.len() < MAX_SHOPEE_PATH;
            is_product.then(|| strip_locator(url))
        }
    }
}

/// Canonical product URLs linked from `html`, in first-seen order.
pub fn extract_product_urls(html: &str, base: &Url) -> Vec<Url> {
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| canonicalize(href, base))
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

/// Fetch a listing page and harvest its product URLs.
///
/// Links resolve against the post-redirect URL. The per-listing cap is the
/// caller's concern.
pub async fn crawl_listing<F: PageFetcher>(
    fetcher: &F,
    url: &Url,
) -> Result<Vec<Url>, FetchError> {
    let page = fetcher.fetch(url).await?;
    let urls = extract_product_urls(&page.body, &page.final_url);
    log::info!("Extracted {} product urls from listing {url}", urls.len());
    Ok(urls)
}
