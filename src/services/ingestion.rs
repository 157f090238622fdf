//! Batch ingestion: URLs in, pending products out.
//!
//! Runs strictly one fetch at a time with a fixed pause after every item and
//! every URL. Nothing that goes wrong with a single item stops the run; the
//! caller only ever sees the summary counts.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::categorize::Categorizer;
use crate::domain::product::{NewProduct, ScrapedProduct};
use crate::domain::types::{CategoryId, CategorySlug, SourceSite};
use crate::models::config::Settings;
use crate::repository::errors::RepositoryError;
use crate::repository::{CategoryReader, ProductWriter};
use crate::scraping::extract::{ExtractOptions, ExtractionError, extract_product};
use crate::scraping::fetch::{FetchError, PageFetcher, parse_http_url};
use crate::scraping::listing::{crawl_listing, looks_like_listing};

/// Environment variable overriding the configured URL list.
pub const URLS_ENV: &str = "OFERTAS_URLS";

/// Failure to turn one URL into a [`ScrapedProduct`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Summary of an ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub inserted: usize,
    pub failed: usize,
    /// Products already stored under the same marketplace id.
    pub duplicates: usize,
    pub total_urls: usize,
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub urls: Vec<String>,
    pub delay: Duration,
    pub max_per_listing: usize,
    pub extract: ExtractOptions,
}

impl IngestionOptions {
    /// Options from settings; `urls` replaces the configured list when non-empty.
    pub fn from_settings(settings: &Settings, urls: Vec<String>) -> Self {
        let urls = if urls.is_empty() {
            configured_urls(settings)
        } else {
            urls
        };
        Self {
            urls,
            delay: settings.ingestion.delay(),
            max_per_listing: settings.ingestion.max_per_listing,
            extract: ExtractOptions {
                partner_tag: settings.amazon.partner_tag.clone(),
                exclude_per_unit_prices: settings.ingestion.exclude_per_unit_prices,
            },
        }
    }
}

fn split_url_list(raw: &str) -> Vec<String> {
    raw.split(['\n', ',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Deserialize)]
struct UrlsFile {
    #[serde(default)]
    urls: Vec<String>,
    #[serde(default, rename = "urlList")]
    url_list: Vec<String>,
}

/// URLs from a JSON `{ "urls": [...] }` / `{ "urlList": [...] }` file or a
/// newline-separated text file. Only `http` entries count.
pub fn parse_urls_file(text: &str) -> Vec<String> {
    let candidates = match serde_json::from_str::<UrlsFile>(text) {
        Ok(file) if !file.urls.is_empty() => file.urls,
        Ok(file) => file.url_list,
        Err(e) if text.trim_start().starts_with('{') => {
            log::warn!("Could not parse urls file: {e}");
            Vec::new()
        }
        Err(_) => text.lines().map(str::to_string).collect(),
    };
    candidates
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| u.starts_with("http"))
        .collect()
}

fn read_urls_file(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_urls_file(&text),
        Err(e) => {
            log::warn!("Could not read urls file {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Resolve the URL list: `env_override`, then the settings list, then the urls file.
pub fn resolve_urls(env_override: Option<&str>, settings: &Settings) -> Vec<String> {
    if let Some(raw) = env_override.filter(|r| !r.trim().is_empty()) {
        return split_url_list(raw);
    }
    let listed: Vec<String> = settings
        .ingestion
        .urls
        .iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();
    if !listed.is_empty() {
        return listed;
    }
    settings
        .ingestion
        .urls_file
        .as_deref()
        .map(read_urls_file)
        .unwrap_or_default()
}

/// [`resolve_urls`] with the `OFERTAS_URLS` environment variable.
pub fn configured_urls(settings: &Settings) -> Vec<String> {
    let env_override = std::env::var(URLS_ENV).ok();
    resolve_urls(env_override.as_deref(), settings)
}

/// Fetch one product page and extract its fields.
pub async fn scrape_url<F: PageFetcher>(
    fetcher: &F,
    url: &Url,
    options: &ExtractOptions,
) -> Result<ScrapedProduct, ScrapeError> {
    let page = fetcher.fetch(url).await?;
    let site = SourceSite::detect(&page.final_url, &page.body);
    Ok(extract_product(&page.body, &page.final_url, site, options)?)
}

/// Active persisted category for `slug`, if any.
fn resolve_category<R: CategoryReader>(repo: &R, slug: &str) -> Option<CategoryId> {
    let slug = CategorySlug::new(slug).ok()?;
    match repo.get_category_by_slug(&slug) {
        Ok(Some(category)) if category.is_active => Some(category.id),
        Ok(_) => None,
        Err(e) => {
            log::error!("Failed to resolve category {slug}: {e}");
            None
        }
    }
}

enum Stored {
    Inserted,
    Duplicate,
}

#[derive(Debug, Error)]
enum ItemError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

async fn ingest_product<F, R>(
    fetcher: &F,
    repo: &R,
    categorizer: &Categorizer,
    url: &Url,
    options: &IngestionOptions,
) -> Result<Stored, ItemError>
where
    F: PageFetcher,
    R: ProductWriter + CategoryReader,
{
    let scraped = scrape_url(fetcher, url, &options.extract).await?;
    let slug = categorizer.categorize(
        scraped.title.as_str(),
        scraped.discount_pct.map(|d| d.get()),
    );
    let category_id = resolve_category(repo, slug);
    let product = NewProduct::from_scraped(scraped, category_id);

    match repo.create_product(&product) {
        Ok(stored) => {
            log::info!(
                "Inserted {} product {} `{}` ({slug})",
                stored.source,
                stored.id,
                stored.title
            );
            Ok(Stored::Inserted)
        }
        Err(RepositoryError::Conflict(_)) => {
            log::debug!("Skipping duplicate product {url}");
            Ok(Stored::Duplicate)
        }
        Err(e) => {
            log::error!("Failed to store product from {url}: {e}");
            Err(e.into())
        }
    }
}

impl IngestionReport {
    fn record(&mut self, stored: Stored) {
        match stored {
            Stored::Inserted => self.inserted += 1,
            Stored::Duplicate => self.duplicates += 1,
        }
    }
}

/// Ingest every configured URL, listing pages expanded to their products.
pub async fn run_ingestion<F, R>(
    fetcher: &F,
    repo: &R,
    categorizer: &Categorizer,
    options: &IngestionOptions,
) -> IngestionReport
where
    F: PageFetcher,
    R: ProductWriter + CategoryReader,
{
    let mut report = IngestionReport {
        total_urls: options.urls.len(),
        ..IngestionReport::default()
    };
    if options.urls.is_empty() {
        log::warn!("No ingestion URLs configured");
        return report;
    }

    for raw in &options.urls {
        match parse_http_url(raw) {
            Err(e) => {
                log::warn!("Skipping url: {e}");
                report.failed += 1;
            }
            Ok(url) if looks_like_listing(&url) => match crawl_listing(fetcher, &url).await {
                Ok(product_urls) => {
                    for product_url in product_urls.iter().take(options.max_per_listing) {
                        match ingest_product(fetcher, repo, categorizer, product_url, options).await
                        {
                            Ok(stored) => report.record(stored),
                            Err(e) => {
                                log::debug!("Skipping product {product_url}: {e}");
                                report.failed += 1;
                            }
                        }
                        tokio::time::sleep(options.delay).await;
                    }
                }
                Err(e) => {
                    log::warn!("Skipping listing {url}: {e}");
                    report.failed += 1;
                }
            },
            Ok(url) => match ingest_product(fetcher, repo, categorizer, &url, options).await {
                Ok(stored) => report.record(stored),
                Err(e) => {
                    log::warn!("Skipping url {url}: {e}");
                    report.failed += 1;
                }
            },
        }
        tokio::time::sleep(options.delay).await;
    }

    log::info!(
        "Ingestion done: {} inserted, {} failed, {} duplicates, {} urls",
        report.inserted,
        report.failed,
        report.duplicates,
        report.total_urls
    );
    report
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Mutex;

    use super::*;
    use crate::categorize::default_categories;
    use crate::domain::types::ProductStatus;
    use crate::repository::CategoryWriter;
    use crate::repository::test::TestRepository;
    use crate::scraping::fetch::FetchedPage;

    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
        requested_at: Mutex<Vec<tokio::time::Instant>>,
    }

    impl FakeFetcher {
        fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.requested_at
                .lock()
                .unwrap()
                .push(tokio::time::Instant::now());
            match self.pages.get(url.as_str()) {
                Some(body) => Ok(FetchedPage {
                    final_url: url.clone(),
                    body: body.clone(),
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    fn product_page(title: &str, price: &str) -> String {
        format!(
            r#"<span id="productTitle">{title}</span>
               <span id="priceblock_ourprice">R$ {price}</span>"#
        )
    }

    fn options(urls: &[&str]) -> IngestionOptions {
        IngestionOptions {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            delay: Duration::ZERO,
            max_per_listing: 15,
            extract: ExtractOptions::default(),
        }
    }

    fn seeded_repo() -> TestRepository {
        let repo = TestRepository::new();
        for category in default_categories().unwrap() {
            repo.upsert_category(&category).unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn extraction_failure_is_counted_not_raised() {
        let fetcher = FakeFetcher::default()
            .page(
                "https://www.amazon.com.br/dp/B000000001",
                &product_page("iPhone 14 Pro Max", "6.999,00"),
            )
            .page(
                "https://www.amazon.com.br/dp/B000000002",
                "<html><body>Página dinâmica</body></html>",
            )
            .page(
                "https://www.amazon.com.br/dp/B000000003",
                &product_page("Cadeira de escritório", "499,90"),
            );
        let repo = seeded_repo();

        let report = run_ingestion(
            &fetcher,
            &repo,
            &Categorizer::default(),
            &options(&[
                "https://www.amazon.com.br/dp/B000000001",
                "https://www.amazon.com.br/dp/B000000002",
                "https://www.amazon.com.br/dp/B000000003",
            ]),
        )
        .await;

        assert_eq!(
            report,
            IngestionReport {
                inserted: 2,
                failed: 1,
                duplicates: 0,
                total_urls: 3
            }
        );
        let products = repo.products();
        assert!(products.iter().all(|p| p.status == ProductStatus::Pending));
        let eletronicos = repo
            .get_category_by_slug(&CategorySlug::new("eletronicos").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(products[0].category_id, Some(eletronicos.id));
    }

    #[tokio::test]
    async fn listing_is_capped_and_duplicates_are_not_failures() {
        let listing = r#"
            <a href="/dp/B0000000AA">a</a>
            <a href="/dp/B0000000BB">b</a>
            <a href="/dp/B0000000CC">c</a>"#;
        let fetcher = FakeFetcher::default()
            .page("https://www.amazon.com.br/deals", listing)
            .page(
                "https://www.amazon.com.br/dp/B0000000AA",
                &product_page("Garrafa térmica", "89,90"),
            )
            .page(
                "https://www.amazon.com.br/dp/B0000000BB",
                &product_page("Garrafa térmica", "89,90"),
            );
        let repo = seeded_repo();
        let mut opts = options(&[
            "https://www.amazon.com.br/deals",
            "https://www.amazon.com.br/dp/B0000000AA",
        ]);
        opts.max_per_listing = 2;

        let report = run_ingestion(&fetcher, &repo, &Categorizer::default(), &opts).await;

        assert_eq!(report.inserted, 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.total_urls, 2);
        assert!(
            !fetcher
                .requested
                .lock()
                .unwrap()
                .iter()
                .any(|u| u.ends_with("B0000000CC"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_after_every_listing_item_and_every_url() {
        let listing = r#"
            <a href="/dp/B0000000AA">a</a>
            <a href="/dp/B0000000BB">b</a>"#;
        let fetcher = FakeFetcher::default()
            .page("https://www.amazon.com.br/deals", listing)
            .page(
                "https://www.amazon.com.br/dp/B0000000AA",
                &product_page("Garrafa térmica", "89,90"),
            )
            .page(
                "https://www.amazon.com.br/dp/B0000000BB",
                &product_page("Mochila", "149,90"),
            )
            .page(
                "https://www.amazon.com.br/dp/B0000000CC",
                &product_page("Luminária", "59,90"),
            );
        let repo = seeded_repo();
        let delay = Duration::from_millis(2500);
        let mut opts = options(&[
            "https://www.amazon.com.br/deals",
            "https://www.amazon.com.br/dp/B0000000CC",
        ]);
        opts.delay = delay;

        let started = tokio::time::Instant::now();
        let report = run_ingestion(&fetcher, &repo, &Categorizer::default(), &opts).await;

        assert_eq!(report.inserted, 3);
        assert_eq!(started.elapsed(), delay * 4);
        let offsets: Vec<Duration> = fetcher
            .requested_at
            .lock()
            .unwrap()
            .iter()
            .map(|at| at.duration_since(started))
            .collect();
        // listing, both items, then the single page after the listing's own pause
        assert_eq!(
            offsets,
            vec![Duration::ZERO, Duration::ZERO, delay, delay * 3]
        );
    }

    #[tokio::test]
    async fn failing_listing_and_bad_urls_count_once_each() {
        let fetcher = FakeFetcher::default();
        let repo = seeded_repo();
        let report = run_ingestion(
            &fetcher,
            &repo,
            &Categorizer::default(),
            &options(&["https://www.mercadolivre.com.br/ofertas", "not a url"]),
        )
        .await;
        assert_eq!(report.failed, 2);
        assert_eq!(report.inserted, 0);
    }

    #[tokio::test]
    async fn no_urls_yields_zero_report() {
        let report = run_ingestion(
            &FakeFetcher::default(),
            &TestRepository::new(),
            &Categorizer::default(),
            &options(&[]),
        )
        .await;
        assert_eq!(report, IngestionReport::default());
    }

    #[test]
    fn url_sources_in_priority_order() {
        let mut settings = Settings::default();
        settings.ingestion.urls = vec![" https://a.example/deals ".into(), "".into()];

        assert_eq!(
            resolve_urls(Some("https://x.example\nhttps://y.example; https://z.example,"), &settings),
            vec!["https://x.example", "https://y.example", "https://z.example"]
        );
        assert_eq!(resolve_urls(Some("  "), &settings), vec!["https://a.example/deals"]);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"urlList": ["https://b.example/ofertas", "ftp://nope"]}}"#).unwrap();
        settings.ingestion.urls.clear();
        settings.ingestion.urls_file = Some(file.path().to_path_buf());
        assert_eq!(resolve_urls(None, &settings), vec!["https://b.example/ofertas"]);
    }

    #[test]
    fn text_urls_file_skips_blank_and_non_http_lines() {
        let text = "https://a.example/s?k=fone\n\n# comentário\nhttps://b.example/deals\n";
        assert_eq!(
            parse_urls_file(text),
            vec!["https://a.example/s?k=fone", "https://b.example/deals"]
        );
    }
}
