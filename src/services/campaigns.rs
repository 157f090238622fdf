use crate::domain::campaign::Campaign;
use crate::domain::types::{CampaignId, CampaignStatus};
use crate::forms::campaigns::{CreateCampaignForm, CreateCampaignFormPayload};
use crate::repository::{CampaignReader, CampaignWriter, ProductReader};

use super::{ServiceError, ServiceResult};

/// Create a campaign over existing products.
///
/// Starts `scheduled` when a send time is given, `draft` otherwise.
pub fn create_campaign<R>(form: CreateCampaignForm, repo: &R) -> ServiceResult<Campaign>
where
    R: CampaignWriter + ProductReader,
{
    let CreateCampaignFormPayload { campaign } = CreateCampaignFormPayload::try_from(form)?;

    let found = match repo.get_products_by_ids(&campaign.product_ids) {
        Ok(products) => products,
        Err(e) => return Err(ServiceError::from_repository("Failed to load products", e)),
    };
    if found.len() != campaign.product_ids.len() {
        let missing: Vec<String> = campaign
            .product_ids
            .iter()
            .filter(|id| !found.iter().any(|p| p.id == **id))
            .map(ToString::to_string)
            .collect();
        return Err(ServiceError::Form(format!(
            "unknown product ids: {}",
            missing.join(", ")
        )));
    }

    match repo.create_campaign(&campaign) {
        Ok(created) => {
            log::info!("Created campaign {} `{}`", created.id, created.name);
            Ok(created)
        }
        Err(e) => Err(ServiceError::from_repository("Failed to create campaign", e)),
    }
}

pub fn get_campaign<R: CampaignReader>(id: i32, repo: &R) -> ServiceResult<Campaign> {
    let id = CampaignId::new(id).map_err(|_| ServiceError::NotFound)?;
    match repo.get_campaign_by_id(id) {
        Ok(Some(campaign)) => Ok(campaign),
        Ok(None) => Err(ServiceError::NotFound),
        Err(e) => Err(ServiceError::from_repository("Failed to get campaign", e)),
    }
}

pub fn list_campaigns<R: CampaignReader>(repo: &R) -> ServiceResult<Vec<Campaign>> {
    repo.list_campaigns()
        .map_err(|e| ServiceError::from_repository("Failed to list campaigns", e))
}

/// Cancel a campaign that has not started sending.
pub fn cancel_campaign<R>(id: i32, repo: &R) -> ServiceResult<Campaign>
where
    R: CampaignReader + CampaignWriter,
{
    let campaign = get_campaign(id, repo)?;
    match campaign.status {
        CampaignStatus::Cancelled => Ok(campaign),
        CampaignStatus::Sending | CampaignStatus::Completed => Err(ServiceError::InvalidState(
            format!("campaign is {}", campaign.status),
        )),
        CampaignStatus::Draft | CampaignStatus::Scheduled => repo
            .set_campaign_status(campaign.id, CampaignStatus::Cancelled)
            .map_err(|e| ServiceError::from_repository("Failed to cancel campaign", e)),
    }
}
