use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::message::{Message as DomainMessage, NewMessage as DomainNewMessage};
use crate::domain::types::{MessageStatus, RecipientPhone, TypeConstraintError};

/// Diesel model representing the `messages` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::messages)]
pub struct Message {
    pub id: i32,
    pub campaign_id: i32,
    pub product_id: i32,
    pub recipient: String,
    pub body: String,
    pub short_link: Option<String>,
    pub status: String,
    pub provider_message_id: Option<String>,
    pub error_message: Option<String>,
    pub sent_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::messages)]
pub struct NewMessage {
    pub campaign_id: i32,
    pub product_id: i32,
    pub recipient: String,
    pub body: String,
    pub short_link: Option<String>,
    pub status: String,
}

impl TryFrom<Message> for DomainMessage {
    type Error = TypeConstraintError;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        Ok(Self {
            id: message.id.try_into()?,
            campaign_id: message.campaign_id.try_into()?,
            product_id: message.product_id.try_into()?,
            recipient: RecipientPhone::new(&message.recipient)?,
            body: message.body,
            short_link: message.short_link,
            status: MessageStatus::try_from(message.status)?,
            provider_message_id: message.provider_message_id,
            error_message: message.error_message,
            sent_at: message.sent_at,
            created_at: message.created_at,
        })
    }
}

impl From<&DomainNewMessage> for NewMessage {
    fn from(message: &DomainNewMessage) -> Self {
        Self {
            campaign_id: message.campaign_id.get(),
            product_id: message.product_id.get(),
            recipient: message.recipient.as_str().to_string(),
            body: message.body.clone(),
            short_link: message.short_link.clone(),
            status: MessageStatus::Pending.into(),
        }
    }
}
