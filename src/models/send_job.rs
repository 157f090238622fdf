use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::send_job::{SendJob as DomainSendJob, SendJobPayload};
use crate::domain::types::{SendJobStatus, TypeConstraintError};

/// Diesel model representing the `send_jobs` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::send_jobs)]
pub struct SendJob {
    pub id: i32,
    pub message_id: i32,
    /// JSON encoded [`SendJobPayload`].
    pub payload: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub delay_ms: i64,
    pub available_at: NaiveDateTime,
    pub last_error: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::send_jobs)]
pub struct NewSendJob {
    pub message_id: i32,
    pub payload: String,
    pub status: String,
    pub max_attempts: i32,
    pub delay_ms: i64,
    pub available_at: NaiveDateTime,
}

impl TryFrom<SendJob> for DomainSendJob {
    type Error = TypeConstraintError;

    fn try_from(job: SendJob) -> Result<Self, Self::Error> {
        let payload: SendJobPayload = serde_json::from_str(&job.payload)
            .map_err(|e| TypeConstraintError::InvalidValue(format!("send job payload: {e}")))?;
        Ok(Self {
            id: job.id.try_into()?,
            message_id: job.message_id.try_into()?,
            payload,
            status: SendJobStatus::try_from(job.status)?,
            attempts: job.attempts,
            max_attempts: job.max_attempts,
            delay_ms: job.delay_ms,
            available_at: job.available_at,
            last_error: job.last_error,
        })
    }
}
