use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::campaign::{Campaign as DomainCampaign, NewCampaign as DomainNewCampaign};
use crate::domain::types::{
    CampaignName, CampaignStatus, ProductId, TargetType, TypeConstraintError,
};

/// Diesel model representing the `campaigns` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::campaigns)]
pub struct Campaign {
    pub id: i32,
    pub name: String,
    pub target_type: String,
    pub target_ref: Option<String>,
    pub status: String,
    pub scheduled_at: Option<NaiveDateTime>,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::campaigns)]
pub struct NewCampaign {
    pub name: String,
    pub target_type: String,
    pub target_ref: Option<String>,
    pub status: String,
    pub scheduled_at: Option<NaiveDateTime>,
}

/// Row of the `campaign_products` join table.
#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::campaign_products)]
pub struct CampaignProduct {
    pub campaign_id: i32,
    pub product_id: i32,
    pub position: i32,
}

impl Campaign {
    /// Convert into the domain entity with products already resolved in order.
    pub fn into_domain(self, product_ids: Vec<i32>) -> Result<DomainCampaign, TypeConstraintError> {
        Ok(DomainCampaign {
            id: self.id.try_into()?,
            name: CampaignName::new(self.name)?,
            product_ids: product_ids
                .into_iter()
                .map(ProductId::new)
                .collect::<Result<_, _>>()?,
            target_type: TargetType::try_from(self.target_type)?,
            target_ref: self.target_ref,
            status: CampaignStatus::try_from(self.status)?,
            scheduled_at: self.scheduled_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl From<&DomainNewCampaign> for NewCampaign {
    fn from(campaign: &DomainNewCampaign) -> Self {
        Self {
            name: campaign.name.as_str().to_string(),
            target_type: campaign.target_type.into(),
            target_ref: campaign.target_ref.clone(),
            status: campaign.initial_status().into(),
            scheduled_at: campaign.scheduled_at,
        }
    }
}
