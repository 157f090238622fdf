use thiserror::Error;

use crate::repository::errors::RepositoryError;

/// Generic error type used by service layer functions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Requested resource was not found.
    #[error("not found")]
    NotFound,
    /// The write clashed with an existing record.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Inbound payload failed validation.
    #[error("invalid input: {0}")]
    Form(String),
    #[error("invalid value: {0}")]
    TypeConstraint(String),
    /// The entity is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// An unexpected internal error occurred.
    #[error("internal error")]
    Internal,
}

/// Convenient alias for results returned from service functions.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Map a repository failure, logging anything that is not a domain outcome.
    pub fn from_repository(context: &str, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::Conflict(detail) => ServiceError::Conflict(detail),
            other => {
                log::error!("{context}: {other}");
                ServiceError::Internal
            }
        }
    }
}
