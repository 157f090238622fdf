//! `ofertas` command line: ingestion, moderation, campaigns and the send worker.

use anyhow::Context;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use ofertas::categorize::Categorizer;
use ofertas::db::{establish_connection_pool, run_migrations};
use ofertas::domain::product::Product;
use ofertas::forms::campaigns::{CreateCampaignForm, SendNowForm};
use ofertas::forms::products::ManualProductForm;
use ofertas::messages::ComposeOptions;
use ofertas::models::config::{DEFAULT_CONFIG, Settings};
use ofertas::repository::DieselRepository;
use ofertas::scraping::fetch::parse_http_url;
use ofertas::scraping::{ExtractOptions, HttpFetcher};
use ofertas::services::{campaigns, categories, dispatch, ingestion, products};
use ofertas::whatsapp::Provider;
use ofertas::worker;

#[derive(Parser)]
#[command(name = "ofertas")]
#[command(about = "Marketplace offer ingestion and WhatsApp dispatch")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file stem (YAML), overridable via `OFERTAS__*` variables
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Insert or refresh the default category table
    SeedCategories,

    /// Ingest the configured product and listing URLs
    Fetch {
        /// URL to ingest instead of the configured list (repeatable)
        #[arg(long = "url")]
        urls: Vec<String>,

        /// Override the number of products taken from each listing page
        #[arg(long)]
        max_per_listing: Option<usize>,

        /// Override the pause between fetched items, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Extract one product page without storing it
    Scrape { url: String },

    /// Moderate scraped products
    #[command(subcommand)]
    Products(ProductCommands),

    /// Render the offer message of a product
    Preview {
        product_id: i32,

        #[arg(long)]
        coupon: Option<String>,

        /// Link printed instead of the affiliate link
        #[arg(long)]
        short_link: Option<String>,

        /// Use the broadcast headline
        #[arg(long, conflicts_with = "post")]
        urgent: bool,

        /// Print the channel post (text and image) as JSON
        #[arg(long)]
        post: bool,
    },

    /// Manage dispatch campaigns
    #[command(subcommand)]
    Campaign(CampaignCommands),

    /// Consume the send queue until interrupted
    Worker,
}

#[derive(Subcommand)]
enum ProductCommands {
    /// List products, newest first
    List {
        /// pending, approved, rejected or sent
        #[arg(long)]
        status: Option<String>,

        /// Category slug
        #[arg(long)]
        category: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Store a manually entered offer
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        price: Decimal,

        #[arg(long)]
        previous_price: Option<Decimal>,

        #[arg(long)]
        link: String,

        #[arg(long)]
        image_url: Option<String>,

        #[arg(long)]
        installments: Option<String>,

        #[arg(long)]
        category: Option<String>,
    },

    /// Approve a product for dispatch
    Approve { id: i32 },

    /// Reject (delete) a product
    Reject { id: i32 },

    /// Assign a category, or clear it when no slug is given
    Category { id: i32, slug: Option<String> },
}

#[derive(Subcommand)]
enum CampaignCommands {
    /// Create a campaign from product ids
    Create {
        #[arg(long)]
        name: String,

        /// Product id in dispatch order (repeatable)
        #[arg(long = "product", required = true)]
        product_ids: Vec<i32>,

        /// list, group or broadcast
        #[arg(long, default_value = "list")]
        target_type: String,

        #[arg(long)]
        target_ref: Option<String>,

        /// e.g. 2026-01-31T09:00:00
        #[arg(long)]
        scheduled_at: Option<NaiveDateTime>,
    },

    /// List campaigns, newest first
    List,

    /// Queue the approved products of a campaign for the given recipients
    SendNow {
        id: i32,

        /// Recipient phone number (repeatable)
        #[arg(long = "to", required = true)]
        recipients: Vec<String>,
    },

    /// Cancel a campaign that has not started sending
    Cancel { id: i32 },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_product(product: &Product) {
    println!(
        "{}\t{}\t{}\t{}\t{}",
        product.id,
        product.status,
        product.source,
        product.price,
        product.title
    );
}

/// Categorizer built from the persisted table, or the built-in one before seeding.
fn load_categorizer(repo: &DieselRepository) -> anyhow::Result<Categorizer> {
    let stored = categories::list_categories(repo)?;
    if stored.is_empty() {
        log::warn!("No categories stored, using the built-in table");
        Ok(Categorizer::default())
    } else {
        Ok(Categorizer::from_categories(&stored))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut settings = Settings::load_from(&cli.config).context("failed to load settings")?;

    let pool = establish_connection_pool(&settings.database_url)
        .with_context(|| format!("failed to open database {}", settings.database_url))?;
    let repo = DieselRepository::new(pool.clone());

    match cli.command {
        Commands::Migrate => {
            let applied = run_migrations(&pool)?;
            log::info!("Applied {applied} migrations");
        }
        Commands::SeedCategories => {
            let seeded = categories::seed_categories(&repo)?;
            log::info!("Seeded {} categories", seeded.len());
        }
        Commands::Fetch {
            urls,
            max_per_listing,
            delay_ms,
        } => {
            if let Some(max) = max_per_listing {
                settings.ingestion.max_per_listing = max;
            }
            if let Some(delay) = delay_ms {
                settings.ingestion.delay_ms = delay;
            }
            let fetcher = HttpFetcher::new(settings.ingestion.request_timeout())?;
            let categorizer = load_categorizer(&repo)?;
            let options = ingestion::IngestionOptions::from_settings(&settings, urls);
            let report = ingestion::run_ingestion(&fetcher, &repo, &categorizer, &options).await;
            log::info!(
                "Ingestion finished: {} inserted, {} duplicates, {} failed",
                report.inserted,
                report.duplicates,
                report.failed
            );
            print_json(&report)?;
        }
        Commands::Scrape { url } => {
            let url = parse_http_url(&url)?;
            let fetcher = HttpFetcher::new(settings.ingestion.request_timeout())?;
            let options = ExtractOptions {
                partner_tag: settings.amazon.partner_tag.clone(),
                exclude_per_unit_prices: settings.ingestion.exclude_per_unit_prices,
            };
            let scraped = ingestion::scrape_url(&fetcher, &url, &options).await?;
            print_json(&scraped)?;
        }
        Commands::Products(command) => products_command(command, &repo)?,
        Commands::Preview {
            product_id,
            coupon,
            short_link,
            urgent,
            post,
        } => {
            let options = ComposeOptions { coupon, short_link };
            if post {
                print_json(&products::post_content(product_id, &options, &repo)?)?;
            } else if urgent {
                println!("{}", products::preview_urgent_message(product_id, &options, &repo)?);
            } else {
                println!("{}", products::preview_message(product_id, &options, &repo)?);
            }
        }
        Commands::Campaign(command) => campaign_command(command, &repo, &settings)?,
        Commands::Worker => {
            let provider = Provider::from_settings(&settings.whatsapp)?;
            worker::run(&repo, &repo, &provider, &settings.dispatch).await?;
        }
    }

    Ok(())
}

fn products_command(command: ProductCommands, repo: &DieselRepository) -> anyhow::Result<()> {
    match command {
        ProductCommands::List {
            status,
            category,
            page,
        } => {
            let (total, items) =
                products::list_products(status.as_deref(), category.as_deref(), page, repo)?;
            for product in &items {
                print_product(product);
            }
            println!("{} of {total} products", items.len());
        }
        ProductCommands::Add {
            title,
            price,
            previous_price,
            link,
            image_url,
            installments,
            category,
        } => {
            let form = ManualProductForm {
                title,
                price,
                previous_price,
                affiliate_link: link,
                image_url,
                installments,
                external_id: None,
                category_slug: category,
            };
            let categorizer = load_categorizer(repo)?;
            let product = products::create_manual_product(form, &categorizer, repo)?;
            print_product(&product);
        }
        ProductCommands::Approve { id } => print_product(&products::approve_product(id, repo)?),
        ProductCommands::Reject { id } => {
            products::reject_product(id, repo)?;
            log::info!("Deleted product {id}");
        }
        ProductCommands::Category { id, slug } => {
            print_product(&products::set_product_category(id, slug.as_deref(), repo)?);
        }
    }
    Ok(())
}

fn campaign_command(
    command: CampaignCommands,
    repo: &DieselRepository,
    settings: &Settings,
) -> anyhow::Result<()> {
    match command {
        CampaignCommands::Create {
            name,
            product_ids,
            target_type,
            target_ref,
            scheduled_at,
        } => {
            let form = CreateCampaignForm {
                name,
                product_ids,
                target_type,
                target_ref,
                scheduled_at,
            };
            print_json(&campaigns::create_campaign(form, repo)?)?;
        }
        CampaignCommands::List => {
            for campaign in campaigns::list_campaigns(repo)? {
                println!(
                    "{}\t{}\t{}\t{} products",
                    campaign.id,
                    campaign.status,
                    campaign.name,
                    campaign.product_ids.len()
                );
            }
        }
        CampaignCommands::SendNow { id, recipients } => {
            let report =
                dispatch::send_now(id, SendNowForm { recipients }, repo, repo, &settings.dispatch)?;
            print_json(&report)?;
        }
        CampaignCommands::Cancel { id } => {
            let campaign = campaigns::cancel_campaign(id, repo)?;
            log::info!("Campaign {} is {}", campaign.id, campaign.status);
        }
    }
    Ok(())
}
