use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::campaign::NewCampaign;
use crate::domain::types::{
    CampaignName, ProductId, RecipientPhone, TargetType, TypeConstraintError,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCampaignForm {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub product_ids: Vec<i32>,
    pub target_type: String,
    pub target_ref: Option<String>,
    pub scheduled_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateCampaignFormPayload {
    pub campaign: NewCampaign,
}

#[derive(Debug, Error)]
pub enum CreateCampaignFormError {
    #[error("Create campaign form validation failed: {0}")]
    Validation(String),
    #[error("Create campaign form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for CreateCampaignFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for CreateCampaignFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<CreateCampaignForm> for CreateCampaignFormPayload {
    type Error = CreateCampaignFormError;

    fn try_from(value: CreateCampaignForm) -> Result<Self, Self::Error> {
        value.validate()?;

        let mut product_ids: Vec<ProductId> = Vec::with_capacity(value.product_ids.len());
        for raw in value.product_ids {
            let id = ProductId::new(raw)?;
            if !product_ids.contains(&id) {
                product_ids.push(id);
            }
        }

        let target_ref = value
            .target_ref
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        Ok(Self {
            campaign: NewCampaign {
                name: CampaignName::new(value.name)?,
                product_ids,
                target_type: TargetType::try_from(value.target_type)?,
                target_ref,
                scheduled_at: value.scheduled_at,
            },
        })
    }
}

/// "Send now" request: the explicit recipient list.
#[derive(Debug, Deserialize, Validate)]
pub struct SendNowForm {
    #[validate(length(min = 1))]
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendNowFormPayload {
    /// Normalized recipients in input order.
    pub recipients: Vec<RecipientPhone>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendNowFormError {
    #[error("Send now form validation failed: {0}")]
    Validation(String),
    /// A phone number was not numeric or shorter than ten digits.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

impl From<ValidationErrors> for SendNowFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl TryFrom<SendNowForm> for SendNowFormPayload {
    type Error = SendNowFormError;

    fn try_from(value: SendNowForm) -> Result<Self, Self::Error> {
        value.validate()?;

        let recipients = value
            .recipients
            .iter()
            .map(|raw| {
                RecipientPhone::new(raw).map_err(|_| SendNowFormError::InvalidRecipient(raw.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { recipients })
    }
}
