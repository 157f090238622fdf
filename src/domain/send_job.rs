use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::message::NewMessage;
use crate::domain::types::{
    CampaignId, MessageId, ProductId, RecipientPhone, SendJobId, SendJobStatus,
};

/// Payload handed to the send worker.
///
/// The worker contract only needs `recipient`, `body` and `correlation_id`
/// (the [`MessageId`] whose status the worker settles); the campaign and
/// product ids let it close the campaign once every message is settled.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SendJobPayload {
    pub campaign_id: CampaignId,
    pub product_id: ProductId,
    pub recipient: RecipientPhone,
    pub body: String,
    pub correlation_id: MessageId,
}

/// A durable queue entry.
#[derive(Debug, Clone)]
pub struct SendJob {
    pub id: SendJobId,
    pub message_id: MessageId,
    pub payload: SendJobPayload,
    pub status: SendJobStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub delay_ms: i64,
    pub available_at: NaiveDateTime,
    pub last_error: Option<String>,
}

impl SendJob {
    /// Whether another delivery attempt is allowed after the current one.
    pub fn has_attempts_left(&self) -> bool {
        self.attempts < self.max_attempts
    }
}

/// Job to enqueue, delayed by `delay` from the moment it is enqueued.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSendJob {
    pub payload: SendJobPayload,
    pub delay: Duration,
    pub max_attempts: i32,
}

/// A campaign message to store together with its send job.
///
/// The job payload is derived from the message once its id is known.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    pub message: NewMessage,
    pub delay: Duration,
    pub max_attempts: i32,
}

impl QueuedMessage {
    pub fn job(&self, correlation_id: MessageId) -> NewSendJob {
        NewSendJob {
            payload: SendJobPayload {
                campaign_id: self.message.campaign_id,
                product_id: self.message.product_id,
                recipient: self.message.recipient.clone(),
                body: self.message.body.clone(),
                correlation_id,
            },
            delay: self.delay,
            max_attempts: self.max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> SendJobPayload {
        SendJobPayload {
            campaign_id: CampaignId::new(3).unwrap(),
            product_id: ProductId::new(7).unwrap(),
            recipient: RecipientPhone::new("11987654321").unwrap(),
            body: "🔥 OFERTA DO DIA".into(),
            correlation_id: MessageId::new(42).unwrap(),
        }
    }

    #[test]
    fn serializes_payload_with_correlation_id() {
        let value = serde_json::to_value(payload()).unwrap();

        assert_eq!(value["recipient"], "5511987654321");
        assert_eq!(value["correlation_id"], 42);
        assert_eq!(value["campaign_id"], 3);
    }

    #[test]
    fn deserializes_payload() {
        let text = serde_json::to_string(&payload()).unwrap();
        let parsed: SendJobPayload = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed, payload());
    }
}
