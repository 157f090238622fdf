//! Send-queue consumer.
//!
//! Claims due jobs one at a time, hands them to the messaging provider and
//! settles the matching message. The queue row is the durable record of the
//! work; a job left `processing` by a crash is re-queued on the next start.

use chrono::{NaiveDateTime, TimeDelta, Utc};

use crate::domain::send_job::SendJob;
use crate::domain::types::{CampaignId, CampaignStatus, MessageId, MessageStatus, ProductStatus};
use crate::models::config::DispatchSettings;
use crate::repository::{
    CampaignReader, CampaignWriter, MessageReader, MessageWriter, ProductReader, ProductWriter,
    SendQueue,
};
use crate::services::{ServiceError, ServiceResult};
use crate::whatsapp::MessagingProvider;

/// What a single [`process_next`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkOutcome {
    /// No job was due.
    Idle,
    Sent(MessageId),
    /// Transient failure, the job is due again at the given time.
    Retrying(MessageId, NaiveDateTime),
    Failed(MessageId),
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Close the campaign once none of its messages is pending.
fn settle_campaign<R>(repo: &R, campaign_id: CampaignId) -> ServiceResult<()>
where
    R: MessageReader + CampaignReader + CampaignWriter + ProductReader + ProductWriter,
{
    let pending = repo
        .count_messages(campaign_id, MessageStatus::Pending)
        .map_err(|e| ServiceError::from_repository("Failed to count pending messages", e))?;
    if pending > 0 {
        return Ok(());
    }

    let campaign = match repo.get_campaign_by_id(campaign_id) {
        Ok(Some(campaign)) => campaign,
        Ok(None) => return Ok(()),
        Err(e) => return Err(ServiceError::from_repository("Failed to get campaign", e)),
    };
    if campaign.status != CampaignStatus::Sending {
        return Ok(());
    }

    if let Err(e) = repo.set_campaign_status(campaign_id, CampaignStatus::Completed) {
        return Err(ServiceError::from_repository("Failed to complete campaign", e));
    }
    let products = repo
        .get_products_by_ids(&campaign.product_ids)
        .map_err(|e| ServiceError::from_repository("Failed to load campaign products", e))?;
    for product in products
        .into_iter()
        .filter(|p| p.status == ProductStatus::Approved)
    {
        if let Err(e) = repo.set_product_status(product.id, ProductStatus::Sent) {
            return Err(ServiceError::from_repository("Failed to mark product sent", e));
        }
    }
    log::info!("Campaign {campaign_id} completed");
    Ok(())
}

fn deliver_failed<Q, R>(queue: &Q, repo: &R, job: &SendJob, error: &str) -> ServiceResult<()>
where
    Q: SendQueue,
    R: MessageWriter,
{
    repo.mark_message_failed(job.message_id, error)
        .map_err(|e| ServiceError::from_repository("Failed to mark message failed", e))?;
    queue
        .fail(job.id, error)
        .map_err(|e| ServiceError::from_repository("Failed to fail send job", e))?;
    Ok(())
}

/// Claim and deliver the next due job.
pub async fn process_next<Q, R, P>(
    queue: &Q,
    repo: &R,
    provider: &P,
    settings: &DispatchSettings,
) -> ServiceResult<WorkOutcome>
where
    Q: SendQueue,
    R: MessageReader
        + MessageWriter
        + CampaignReader
        + CampaignWriter
        + ProductReader
        + ProductWriter,
    P: MessagingProvider,
{
    let job = match queue.claim_due(now()) {
        Ok(Some(job)) => job,
        Ok(None) => return Ok(WorkOutcome::Idle),
        Err(e) => return Err(ServiceError::from_repository("Failed to claim send job", e)),
    };
    let message_id = job.message_id;
    let campaign_id = job.payload.campaign_id;

    let outcome = match provider.send(&job.payload.recipient, &job.payload.body).await {
        Ok(delivery) => {
            repo.mark_message_sent(message_id, delivery.provider_message_id.as_deref(), now())
                .map_err(|e| ServiceError::from_repository("Failed to mark message sent", e))?;
            queue
                .complete(job.id)
                .map_err(|e| ServiceError::from_repository("Failed to complete send job", e))?;
            log::info!("Message {message_id} sent to {}", job.payload.recipient);
            WorkOutcome::Sent(message_id)
        }
        Err(e) if e.is_transient() && job.has_attempts_left() => {
            let backoff = TimeDelta::from_std(settings.backoff(job.attempts))
                .unwrap_or_else(|_| TimeDelta::seconds(3600));
            let at = now() + backoff;
            queue
                .retry(job.id, at, &e.to_string())
                .map_err(|e| ServiceError::from_repository("Failed to re-queue send job", e))?;
            log::warn!(
                "Message {message_id} attempt {}/{} failed, retrying at {at}: {e}",
                job.attempts,
                job.max_attempts
            );
            return Ok(WorkOutcome::Retrying(message_id, at));
        }
        Err(e) => {
            log::error!("Message {message_id} failed after {} attempts: {e}", job.attempts);
            deliver_failed(queue, repo, &job, &e.to_string())?;
            WorkOutcome::Failed(message_id)
        }
    };

    settle_campaign(repo, campaign_id)?;
    Ok(outcome)
}

/// Consume the queue until ctrl-c.
pub async fn run<Q, R, P>(
    queue: &Q,
    repo: &R,
    provider: &P,
    settings: &DispatchSettings,
) -> ServiceResult<()>
where
    Q: SendQueue,
    R: MessageReader
        + MessageWriter
        + CampaignReader
        + CampaignWriter
        + ProductReader
        + ProductWriter,
    P: MessagingProvider,
{
    match queue.requeue_in_flight() {
        Ok(0) => {}
        Ok(n) => log::warn!("Re-queued {n} send jobs interrupted by a previous run"),
        Err(e) => return Err(ServiceError::from_repository("Failed to recover send jobs", e)),
    }
    log::info!("Send worker started");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let outcome = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            outcome = process_next(queue, repo, provider, settings) => outcome,
        };
        let idle = match outcome {
            Ok(WorkOutcome::Idle) => true,
            Ok(_) => false,
            Err(e) => {
                log::error!("Send worker iteration failed: {e}");
                true
            }
        };
        if idle {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(settings.poll_interval()) => {}
            }
        }
    }

    log::info!("Send worker stopped");
    Ok(())
}
