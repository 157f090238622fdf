use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{CampaignId, MessageId, MessageStatus, ProductId, RecipientPhone};

/// An outbound WhatsApp message for one recipient and one product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub campaign_id: CampaignId,
    pub product_id: ProductId,
    pub recipient: RecipientPhone,
    pub body: String,
    pub short_link: Option<String>,
    pub status: MessageStatus,
    pub provider_message_id: Option<String>,
    pub error_message: Option<String>,
    pub sent_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

/// Data required to record a pending [`Message`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMessage {
    pub campaign_id: CampaignId,
    pub product_id: ProductId,
    pub recipient: RecipientPhone,
    pub body: String,
    pub short_link: Option<String>,
}
