use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::message::{Message, NewMessage};
use crate::domain::types::{CampaignId, MessageId, MessageStatus};
use crate::models::message::{Message as DbMessage, NewMessage as DbNewMessage};
use crate::repository::errors::RepositoryResult;
use crate::repository::{DieselRepository, MessageReader, MessageWriter};

impl MessageReader for DieselRepository {
    fn get_message_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>> {
        use crate::schema::messages;

        let mut conn = self.conn()?;

        let message = messages::table
            .filter(messages::id.eq(id.get()))
            .first::<DbMessage>(&mut conn)
            .optional()?;

        let message = message.map(TryInto::try_into).transpose()?;
        Ok(message)
    }

    fn list_messages(&self, campaign_id: CampaignId) -> RepositoryResult<Vec<Message>> {
        use crate::schema::messages;

        let mut conn = self.conn()?;

        let items = messages::table
            .filter(messages::campaign_id.eq(campaign_id.get()))
            .order(messages::id.asc())
            .load::<DbMessage>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Message>, _>>()?;

        Ok(items)
    }

    fn count_messages(
        &self,
        campaign_id: CampaignId,
        status: MessageStatus,
    ) -> RepositoryResult<usize> {
        use crate::schema::messages;

        let mut conn = self.conn()?;

        let total = messages::table
            .filter(messages::campaign_id.eq(campaign_id.get()))
            .filter(messages::status.eq(status.as_str()))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(total as usize)
    }
}

impl MessageWriter for DieselRepository {
    fn create_message(&self, message: &NewMessage) -> RepositoryResult<Message> {
        use crate::schema::messages;

        let mut conn = self.conn()?;

        let stored = diesel::insert_into(messages::table)
            .values(DbNewMessage::from(message))
            .returning(DbMessage::as_returning())
            .get_result(&mut conn)?;

        Ok(stored.try_into()?)
    }

    fn mark_message_sent(
        &self,
        id: MessageId,
        provider_message_id: Option<&str>,
        sent_at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        use crate::schema::messages;

        let mut conn = self.conn()?;

        let affected = diesel::update(messages::table.filter(messages::id.eq(id.get())))
            .set((
                messages::status.eq(MessageStatus::Sent.as_str()),
                messages::provider_message_id.eq(provider_message_id),
                messages::error_message.eq(None::<String>),
                messages::sent_at.eq(Some(sent_at)),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn mark_message_failed(&self, id: MessageId, error: &str) -> RepositoryResult<usize> {
        use crate::schema::messages;

        let mut conn = self.conn()?;

        let affected = diesel::update(messages::table.filter(messages::id.eq(id.get())))
            .set((
                messages::status.eq(MessageStatus::Failed.as_str()),
                messages::error_message.eq(Some(error)),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }
}
