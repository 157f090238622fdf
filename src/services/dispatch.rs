//! Campaign "send now": one queued job per approved product and recipient.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::domain::message::NewMessage;
use crate::domain::send_job::QueuedMessage;
use crate::domain::types::{CampaignId, ProductStatus};
use crate::forms::campaigns::{SendNowForm, SendNowFormPayload};
use crate::messages::{ComposeOptions, Offer, compose_offer_message};
use crate::models::config::DispatchSettings;
use crate::repository::{CampaignReader, ProductReader, SendQueue};
use crate::services::{ServiceError, ServiceResult};

/// What a "send now" request queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SendNowReport {
    pub messages_queued: usize,
    pub recipients: usize,
    pub products: usize,
}

/// Queue the approved products of a campaign for every recipient.
///
/// Recipients are validated before anything is written, and the status change
/// with every message and job is stored atomically. Jobs are spaced by
/// the anti-ban interval: the n-th job (0-based, products outer, recipients
/// inner) becomes due `n × interval` after the request.
pub fn send_now<R, Q>(
    campaign_id: i32,
    form: SendNowForm,
    repo: &R,
    queue: &Q,
    settings: &DispatchSettings,
) -> ServiceResult<SendNowReport>
where
    R: CampaignReader + ProductReader,
    Q: SendQueue,
{
    let payload = SendNowFormPayload::try_from(form)?;

    let campaign_id = match CampaignId::new(campaign_id) {
        Ok(id) => id,
        Err(_) => return Err(ServiceError::NotFound),
    };
    let campaign = match repo.get_campaign_by_id(campaign_id) {
        Ok(Some(campaign)) => campaign,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get campaign: {e}");
            return Err(ServiceError::Internal);
        }
    };
    if !campaign.status.can_dispatch() {
        return Err(ServiceError::InvalidState(format!(
            "campaign is {}",
            campaign.status
        )));
    }

    let products: Vec<_> = match repo.get_products_by_ids(&campaign.product_ids) {
        Ok(products) => products
            .into_iter()
            .filter(|p| p.status == ProductStatus::Approved)
            .collect(),
        Err(e) => {
            log::error!("Failed to load campaign products: {e}");
            return Err(ServiceError::Internal);
        }
    };
    if products.is_empty() {
        return Err(ServiceError::InvalidState(
            "campaign has no approved products".to_string(),
        ));
    }

    let now = Utc::now().naive_utc();
    let interval = settings.anti_ban_interval();
    let mut delay = Duration::ZERO;
    let mut batch = Vec::with_capacity(products.len() * payload.recipients.len());

    for product in &products {
        let body = compose_offer_message(&Offer::from(product), &ComposeOptions::default());
        for recipient in &payload.recipients {
            batch.push(QueuedMessage {
                message: NewMessage {
                    campaign_id,
                    product_id: product.id,
                    recipient: recipient.clone(),
                    body: body.clone(),
                    short_link: None,
                },
                delay,
                max_attempts: settings.max_attempts,
            });
            delay += interval;
        }
    }

    let queued = queue
        .start_dispatch(campaign_id, &batch, now)
        .map_err(|e| ServiceError::from_repository("Failed to queue campaign", e))?
        .len();

    log::info!(
        "Campaign {campaign_id}: queued {queued} messages for {} recipients",
        payload.recipients.len()
    );
    Ok(SendNowReport {
        messages_queued: queued,
        recipients: payload.recipients.len(),
        products: products.len(),
    })
}
