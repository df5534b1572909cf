//! Outbound WhatsApp messages through the Twilio REST API

use crate::runtime::MessageSender;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_BASE: &str = "https://api.twilio.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Twilio API error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Credentials and sender identity
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number, e.g. `whatsapp:+14155238886`
    pub from_number: String,
    /// Override for tests; defaults to the public API
    pub api_base: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: Option<String>,
}

pub struct TwilioClient {
    client: Client,
    config: TwilioConfig,
    messages_url: String,
}

impl TwilioClient {
    pub fn new(config: TwilioConfig) -> Result<Self, MessagingError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base = config
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/');
        let messages_url = format!(
            "{base}/2010-04-01/Accounts/{}/Messages.json",
            config.account_sid
        );

        Ok(Self {
            client,
            config,
            messages_url,
        })
    }
}

#[async_trait]
impl MessageSender for TwilioClient {
    async fn send(&self, to: &str, body: &str) -> Result<(), MessagingError> {
        let form = [
            ("From", self.config.from_number.as_str()),
            ("To", to),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TwilioErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text);
            return Err(MessagingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let resource: MessageResource = response.json().await?;
        tracing::info!(
            to = %to,
            sid = resource.sid.as_deref().unwrap_or("unknown"),
            "Message sent"
        );
        Ok(())
    }
}
