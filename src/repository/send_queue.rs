use chrono::{NaiveDateTime, TimeDelta};
use diesel::prelude::*;

use crate::domain::send_job::{NewSendJob, QueuedMessage, SendJob};
use crate::domain::types::{CampaignId, CampaignStatus, SendJobId, SendJobStatus};
use crate::models::message::{Message as DbMessage, NewMessage as DbNewMessage};
use crate::models::send_job::{NewSendJob as DbNewSendJob, SendJob as DbSendJob};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, SendQueue};

fn job_row(job: &NewSendJob, now: NaiveDateTime) -> RepositoryResult<DbNewSendJob> {
    let delay = TimeDelta::from_std(job.delay)
        .map_err(|e| RepositoryError::ValidationError(format!("send job delay: {e}")))?;
    Ok(DbNewSendJob {
        message_id: job.payload.correlation_id.get(),
        payload: serde_json::to_string(&job.payload)?,
        status: SendJobStatus::Queued.into(),
        max_attempts: job.max_attempts,
        delay_ms: job.delay.as_millis() as i64,
        available_at: now + delay,
    })
}

impl DieselRepository {
    fn settle_job(
        &self,
        id: SendJobId,
        status: SendJobStatus,
        error: Option<&str>,
    ) -> RepositoryResult<usize> {
        use crate::schema::send_jobs;

        let mut conn = self.conn()?;

        let affected = diesel::update(send_jobs::table.filter(send_jobs::id.eq(id.get())))
            .set((
                send_jobs::status.eq(status.as_str()),
                send_jobs::last_error.eq(error),
                send_jobs::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }
}

impl SendQueue for DieselRepository {
    fn enqueue(&self, job: &NewSendJob, now: NaiveDateTime) -> RepositoryResult<SendJob> {
        use crate::schema::send_jobs;

        let mut conn = self.conn()?;

        let row = job_row(job, now)?;
        let stored = diesel::insert_into(send_jobs::table)
            .values(&row)
            .returning(DbSendJob::as_returning())
            .get_result(&mut conn)?;

        Ok(stored.try_into()?)
    }

    fn start_dispatch(
        &self,
        campaign_id: CampaignId,
        batch: &[QueuedMessage],
        now: NaiveDateTime,
    ) -> RepositoryResult<Vec<SendJob>> {
        use crate::schema::{campaigns, messages, send_jobs};

        let mut conn = self.conn()?;

        let stored = conn.immediate_transaction::<_, RepositoryError, _>(|conn| {
            let started = diesel::update(
                campaigns::table
                    .filter(campaigns::id.eq(campaign_id.get()))
                    .filter(campaigns::status.eq_any([
                        CampaignStatus::Draft.as_str(),
                        CampaignStatus::Scheduled.as_str(),
                    ])),
            )
            .set((
                campaigns::status.eq(CampaignStatus::Sending.as_str()),
                campaigns::started_at.eq(Some(now)),
                campaigns::updated_at.eq(now),
            ))
            .execute(conn)?;
            if started == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "campaign {campaign_id} is not draft or scheduled"
                )));
            }

            let mut stored = Vec::with_capacity(batch.len());
            for item in batch {
                let message = diesel::insert_into(messages::table)
                    .values(DbNewMessage::from(&item.message))
                    .returning(DbMessage::as_returning())
                    .get_result(conn)?;
                let row = job_row(&item.job(message.id.try_into()?), now)?;
                let job = diesel::insert_into(send_jobs::table)
                    .values(&row)
                    .returning(DbSendJob::as_returning())
                    .get_result(conn)?;
                stored.push(job);
            }
            Ok(stored)
        })?;

        let jobs = stored
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<SendJob>, _>>()?;
        Ok(jobs)
    }

    fn claim_due(&self, now: NaiveDateTime) -> RepositoryResult<Option<SendJob>> {
        use crate::schema::send_jobs;

        let mut conn = self.conn()?;

        // Immediate transaction takes the write lock before selecting, so two
        // workers never claim the same row.
        let claimed = conn.immediate_transaction(|conn| {
            let Some(next) = send_jobs::table
                .filter(send_jobs::status.eq(SendJobStatus::Queued.as_str()))
                .filter(send_jobs::available_at.le(now))
                .order((send_jobs::available_at.asc(), send_jobs::id.asc()))
                .first::<DbSendJob>(conn)
                .optional()?
            else {
                return Ok(None);
            };

            diesel::update(send_jobs::table.filter(send_jobs::id.eq(next.id)))
                .set((
                    send_jobs::status.eq(SendJobStatus::Processing.as_str()),
                    send_jobs::attempts.eq(send_jobs::attempts + 1),
                    send_jobs::updated_at.eq(diesel::dsl::now),
                ))
                .returning(DbSendJob::as_returning())
                .get_result(conn)
                .map(Some)
        })?;

        let claimed = claimed.map(TryInto::try_into).transpose()?;
        Ok(claimed)
    }

    fn complete(&self, id: SendJobId) -> RepositoryResult<usize> {
        self.settle_job(id, SendJobStatus::Done, None)
    }

    fn retry(
        &self,
        id: SendJobId,
        available_at: NaiveDateTime,
        error: &str,
    ) -> RepositoryResult<usize> {
        use crate::schema::send_jobs;

        let mut conn = self.conn()?;

        let affected = diesel::update(send_jobs::table.filter(send_jobs::id.eq(id.get())))
            .set((
                send_jobs::status.eq(SendJobStatus::Queued.as_str()),
                send_jobs::available_at.eq(available_at),
                send_jobs::last_error.eq(Some(error)),
                send_jobs::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn fail(&self, id: SendJobId, error: &str) -> RepositoryResult<usize> {
        self.settle_job(id, SendJobStatus::Failed, Some(error))
    }

    fn requeue_in_flight(&self) -> RepositoryResult<usize> {
        use crate::schema::send_jobs;

        let mut conn = self.conn()?;

        let affected = diesel::update(
            send_jobs::table.filter(send_jobs::status.eq(SendJobStatus::Processing.as_str())),
        )
        .set((
            send_jobs::status.eq(SendJobStatus::Queued.as_str()),
            send_jobs::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut conn)?;

        Ok(affected)
    }
}
