//! Error conversion glue between layers.
//!
//! The domain layer must not depend on service/repository error types, so the
//! `From` impls connecting them live here.

use crate::domain::types::TypeConstraintError;
use crate::repository::errors::RepositoryError;

#[cfg(feature = "pipeline")]
use crate::forms::campaigns::{CreateCampaignFormError, SendNowFormError};
#[cfg(feature = "pipeline")]
use crate::forms::products::ManualProductFormError;
#[cfg(feature = "pipeline")]
use crate::services::errors::ServiceError;

impl From<TypeConstraintError> for RepositoryError {
    fn from(val: TypeConstraintError) -> Self {
        RepositoryError::ValidationError(val.to_string())
    }
}

#[cfg(feature = "pipeline")]
impl From<TypeConstraintError> for ServiceError {
    fn from(val: TypeConstraintError) -> Self {
        ServiceError::TypeConstraint(val.to_string())
    }
}

#[cfg(feature = "pipeline")]
impl From<SendNowFormError> for ServiceError {
    fn from(val: SendNowFormError) -> Self {
        ServiceError::Form(val.to_string())
    }
}

#[cfg(feature = "pipeline")]
impl From<CreateCampaignFormError> for ServiceError {
    fn from(val: CreateCampaignFormError) -> Self {
        ServiceError::Form(val.to_string())
    }
}

#[cfg(feature = "pipeline")]
impl From<ManualProductFormError> for ServiceError {
    fn from(val: ManualProductFormError) -> Self {
        ServiceError::Form(val.to_string())
    }
}
