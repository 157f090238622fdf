//! Marketplace detection and URL-derived identifiers.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::domain::types::SourceSite;

static AMAZON_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^amazon\.(com|com\.br|de|co\.uk|fr|it|es|ca)$").expect("valid regex")
});
static AMAZON_ASIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/(?:dp|gp/product)/([A-Z0-9]{10})(?:[/?]|$)").expect("valid regex")
});
static MERCADO_LIVRE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(MLB)-?(\d+)").expect("valid regex"));
static SHOPEE_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-i\.(\d+)\.(\d+)").expect("valid regex"));

const MERCADO_LIVRE_HOSTS: [&str; 4] = [
    "mercadolivre.com.br",
    "mercadolibre.com.br",
    "mercadolivre.com",
    "mercadolibre.com",
];

fn bare_host(url: &Url) -> Option<String> {
    url.host_str()
        .map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
}

impl SourceSite {
    /// Marketplace declared by the URL host.
    pub fn from_url(url: &Url) -> Option<Self> {
        let host = bare_host(url)?;
        if AMAZON_HOST.is_match(&host) {
            Some(Self::Amazon)
        } else if MERCADO_LIVRE_HOSTS.contains(&host.as_str())
            || host.ends_with(".mercadolivre.com.br")
            || host.ends_with(".mercadolibre.com.br")
        {
            Some(Self::MercadoLivre)
        } else if host.contains("shopee") {
            Some(Self::Shopee)
        } else {
            None
        }
    }

    /// Marketplace guessed from page markup (short links, mirrors).
    pub fn sniff(html: &str) -> Option<Self> {
        if html.contains("ui-pdp-") || html.contains("andes-money-amount") {
            Some(Self::MercadoLivre)
        } else if html.contains("shopee.com") {
            Some(Self::Shopee)
        } else if html.contains("id=\"productTitle\"") || html.contains("a-offscreen") {
            Some(Self::Amazon)
        } else {
            None
        }
    }

    /// Host first, then markup; unknown pages are parsed as Amazon.
    pub fn detect(url: &Url, html: &str) -> Self {
        Self::from_url(url)
            .or_else(|| Self::sniff(html))
            .unwrap_or(Self::Amazon)
    }
}

/// Marketplace identifier of the product behind `url`.
///
/// Upper-cased ASIN for Amazon, `MLB<digits>` for Mercado Livre and
/// `shop.item` for Shopee.
pub fn external_id(site: SourceSite, url: &Url) -> Option<String> {
    let path = url.path();
    match site {
        SourceSite::Amazon => AMAZON_ASIN
            .captures(path)
            .map(|c| c[1].to_ascii_uppercase()),
        SourceSite::MercadoLivre => MERCADO_LIVRE_ID
            .captures(path)
            .map(|c| format!("{}{}", c[1].to_ascii_uppercase(), &c[2])),
        SourceSite::Shopee => SHOPEE_ITEM
            .captures(path)
            .map(|c| format!("{}.{}", &c[1], &c[2])),
    }
}

/// Set (or replace) the Amazon associates `tag` query parameter.
pub fn with_partner_tag(url: &Url, tag: &str) -> Url {
    let mut tagged = url.clone();
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "tag")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = tagged.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(retained);
        pairs.append_pair("tag", tag);
    }
    tagged
}
