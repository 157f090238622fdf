use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{CampaignId, CampaignName, CampaignStatus, ProductId, TargetType};

/// A named batch of offers sent to one audience.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: CampaignName,
    /// Products in dispatch order.
    pub product_ids: Vec<ProductId>,
    pub target_type: TargetType,
    pub target_ref: Option<String>,
    pub status: CampaignStatus,
    pub scheduled_at: Option<NaiveDateTime>,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Data required to create a [`Campaign`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCampaign {
    pub name: CampaignName,
    pub product_ids: Vec<ProductId>,
    pub target_type: TargetType,
    pub target_ref: Option<String>,
    pub scheduled_at: Option<NaiveDateTime>,
}

impl NewCampaign {
    /// `scheduled` when a send time is set, `draft` otherwise.
    pub fn initial_status(&self) -> CampaignStatus {
        if self.scheduled_at.is_some() {
            CampaignStatus::Scheduled
        } else {
            CampaignStatus::Draft
        }
    }
}
