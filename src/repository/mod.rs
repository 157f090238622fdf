use chrono::NaiveDateTime;

use crate::db::{DbConnection, DbPool};
use crate::domain::campaign::{Campaign, NewCampaign};
use crate::domain::category::{Category, NewCategory};
use crate::domain::message::{Message, NewMessage};
use crate::domain::product::{NewProduct, Product};
use crate::domain::send_job::{NewSendJob, QueuedMessage, SendJob};
use crate::domain::types::{
    CampaignId, CampaignStatus, CategoryId, CategorySlug, MessageId, MessageStatus, ProductId,
    ProductStatus, SendJobId,
};
use crate::repository::errors::RepositoryResult;

pub mod campaign;
pub mod category;
pub mod errors;
pub mod message;
pub mod product;
pub mod send_queue;

/// Repository implementation backed by Diesel and SQLite.
///
/// The underlying `r2d2::Pool` is cheap to clone, allowing the repository to
/// be passed around freely between the ingestion run and the worker.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository from an established database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a pooled database connection.
    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// One-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Number of rows to skip for this page.
    pub fn offset(&self) -> usize {
        (self.page.max(1) - 1) * self.per_page
    }
}

/// Query parameters used when listing products.
#[derive(Debug, Clone, Default)]
pub struct ProductListQuery {
    /// Filter by moderation status.
    pub status: Option<ProductStatus>,
    /// Filter by category.
    pub category_id: Option<CategoryId>,
    /// Pagination parameters.
    pub pagination: Option<Pagination>,
}

impl ProductListQuery {
    pub fn status(mut self, status: ProductStatus) -> Self {
        self.status = Some(status);
        self
    }
    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Read-only operations for category entities.
pub trait CategoryReader {
    /// List categories ordered by priority (`position`, then id).
    fn list_categories(&self, active_only: bool) -> RepositoryResult<Vec<Category>>;
    /// Retrieve a category by its unique slug.
    fn get_category_by_slug(&self, slug: &CategorySlug) -> RepositoryResult<Option<Category>>;
}

/// Write operations for category entities.
pub trait CategoryWriter {
    /// Insert a category or update the existing one with the same slug.
    fn upsert_category(&self, category: &NewCategory) -> RepositoryResult<Category>;
}

/// Read-only operations for product entities.
pub trait ProductReader {
    /// List products matching the supplied query, newest first, with the total count.
    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)>;
    /// Retrieve a product by its identifier.
    fn get_product_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>>;
    /// Retrieve the products with the given ids, in the order of `ids`.
    ///
    /// Unknown ids are skipped.
    fn get_products_by_ids(&self, ids: &[ProductId]) -> RepositoryResult<Vec<Product>>;
}

/// Write operations for product entities.
pub trait ProductWriter {
    /// Persist a new `pending` product.
    ///
    /// A second product with the same `(source, external_id)` yields
    /// [`errors::RepositoryError::Conflict`].
    fn create_product(&self, product: &NewProduct) -> RepositoryResult<Product>;
    /// Change the moderation status; `approved` also stamps `approved_at`.
    fn set_product_status(&self, id: ProductId, status: ProductStatus)
    -> RepositoryResult<Product>;
    /// Assign or clear the product category.
    fn set_product_category(
        &self,
        id: ProductId,
        category_id: Option<CategoryId>,
    ) -> RepositoryResult<Product>;
    /// Permanently delete a product.
    fn delete_product(&self, id: ProductId) -> RepositoryResult<usize>;
}

/// Read-only operations for campaign entities.
pub trait CampaignReader {
    /// Retrieve a campaign with its ordered product ids.
    fn get_campaign_by_id(&self, id: CampaignId) -> RepositoryResult<Option<Campaign>>;
    /// List campaigns, newest first.
    fn list_campaigns(&self) -> RepositoryResult<Vec<Campaign>>;
}

/// Write operations for campaign entities.
pub trait CampaignWriter {
    /// Persist a campaign and its ordered product set.
    fn create_campaign(&self, campaign: &NewCampaign) -> RepositoryResult<Campaign>;
    /// Move a campaign to `status`, stamping `started_at`/`completed_at` as needed.
    fn set_campaign_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> RepositoryResult<Campaign>;
}

/// Read-only operations for message entities.
pub trait MessageReader {
    fn get_message_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>>;
    /// Messages of a campaign in creation order.
    fn list_messages(&self, campaign_id: CampaignId) -> RepositoryResult<Vec<Message>>;
    /// Count the campaign messages currently in `status`.
    fn count_messages(
        &self,
        campaign_id: CampaignId,
        status: MessageStatus,
    ) -> RepositoryResult<usize>;
}

/// Write operations for message entities.
pub trait MessageWriter {
    /// Record a `pending` message.
    fn create_message(&self, message: &NewMessage) -> RepositoryResult<Message>;
    /// Settle a message as delivered.
    fn mark_message_sent(
        &self,
        id: MessageId,
        provider_message_id: Option<&str>,
        sent_at: NaiveDateTime,
    ) -> RepositoryResult<usize>;
    /// Settle a message as failed with the error detail.
    fn mark_message_failed(&self, id: MessageId, error: &str) -> RepositoryResult<usize>;
}

/// Durable delayed queue of outbound send jobs.
pub trait SendQueue {
    /// Enqueue a job that becomes due `job.delay` after `now`.
    fn enqueue(&self, job: &NewSendJob, now: NaiveDateTime) -> RepositoryResult<SendJob>;
    /// Move a draft or scheduled campaign to `sending` and store every
    /// message with its job in one transaction.
    ///
    /// Nothing is written when any insert fails. A campaign that already
    /// left draft or scheduled yields [`errors::RepositoryError::Conflict`].
    fn start_dispatch(
        &self,
        campaign_id: CampaignId,
        batch: &[QueuedMessage],
        now: NaiveDateTime,
    ) -> RepositoryResult<Vec<SendJob>>;
    /// Claim the earliest due `queued` job, moving it to `processing` and
    /// counting the attempt.
    fn claim_due(&self, now: NaiveDateTime) -> RepositoryResult<Option<SendJob>>;
    /// Mark a claimed job as done.
    fn complete(&self, id: SendJobId) -> RepositoryResult<usize>;
    /// Put a claimed job back in the queue, due at `available_at`.
    fn retry(
        &self,
        id: SendJobId,
        available_at: NaiveDateTime,
        error: &str,
    ) -> RepositoryResult<usize>;
    /// Mark a claimed job as permanently failed.
    fn fail(&self, id: SendJobId, error: &str) -> RepositoryResult<usize>;
    /// Return jobs left in `processing` by an interrupted worker to the queue.
    fn requeue_in_flight(&self) -> RepositoryResult<usize>;
}
