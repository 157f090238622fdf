//! Outbound WhatsApp messaging.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::types::RecipientPhone;
use crate::models::config::WhatsAppSettings;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivery failure reported by a [`MessagingProvider`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network trouble, throttling or a provider outage; worth retrying.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// The provider refused the message.
    #[error("provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("provider misconfigured: {0}")]
    Config(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Successful hand-off to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub provider_message_id: Option<String>,
}

/// `send(phone, text)` capability consumed by the send worker.
pub trait MessagingProvider {
    async fn send(&self, to: &RecipientPhone, body: &str) -> Result<Delivery, ProviderError>;
}

/// Logs instead of sending; used when no credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunProvider;

impl MessagingProvider for DryRunProvider {
    async fn send(&self, to: &RecipientPhone, body: &str) -> Result<Delivery, ProviderError> {
        log::debug!("dry-run send to {} ({} chars)", to.e164(), body.chars().count());
        Ok(Delivery {
            provider_message_id: Some(format!(
                "dry-{}",
                chrono::Utc::now().timestamp_millis()
            )),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TwilioResponse {
    sid: Option<String>,
    message: Option<String>,
    error_message: Option<String>,
}

/// Twilio-compatible REST provider.
#[derive(Clone)]
pub struct TwilioProvider {
    client: reqwest::Client,
    endpoint: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioProvider {
    pub fn new(settings: &WhatsAppSettings) -> Result<Self, ProviderError> {
        let required = |value: &Option<String>, name: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| ProviderError::Config(format!("missing whatsapp.{name}")))
        };
        let account_sid = required(&settings.account_sid, "account_sid")?;
        let auth_token = required(&settings.auth_token, "auth_token")?;
        let from_number = required(&settings.from_number, "from_number")?;

        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        let endpoint = format!(
            "{}/Accounts/{account_sid}/Messages.json",
            settings.api_base.trim_end_matches('/')
        );

        Ok(Self {
            client,
            endpoint,
            account_sid,
            auth_token,
            from_number,
        })
    }
}

impl MessagingProvider for TwilioProvider {
    async fn send(&self, to: &RecipientPhone, body: &str) -> Result<Delivery, ProviderError> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("To", &format!("whatsapp:{}", to.e164()))
            .append_pair("From", &format!("whatsapp:{}", self.from_number))
            .append_pair("Body", body)
            .finish();

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(form)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status();
        let data: TwilioResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        if !status.is_success() {
            let message = data
                .message
                .or(data.error_message)
                .unwrap_or_else(|| status.to_string());
            log::error!("WhatsApp send to {} failed ({status}): {message}", to.e164());
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                ProviderError::Unavailable(message)
            } else {
                ProviderError::Rejected {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        log::info!("WhatsApp sent to {} ({:?})", to.e164(), data.sid);
        Ok(Delivery {
            provider_message_id: data.sid,
        })
    }
}

/// Live provider when credentials exist, dry run otherwise.
#[derive(Clone)]
pub enum Provider {
    Twilio(TwilioProvider),
    DryRun(DryRunProvider),
}

impl Provider {
    pub fn from_settings(settings: &WhatsAppSettings) -> Result<Self, ProviderError> {
        if settings.has_credentials() {
            Ok(Self::Twilio(TwilioProvider::new(settings)?))
        } else {
            log::warn!("WhatsApp credentials not configured, sends are simulated");
            Ok(Self::DryRun(DryRunProvider))
        }
    }
}

impl MessagingProvider for Provider {
    async fn send(&self, to: &RecipientPhone, body: &str) -> Result<Delivery, ProviderError> {
        match self {
            Self::Twilio(provider) => provider.send(to, body).await,
            Self::DryRun(provider) => provider.send(to, body).await,
        }
    }
}
