//! API request and response types

use serde::{Deserialize, Serialize};

/// Inbound WhatsApp message as posted by the messaging provider
#[derive(Debug, Deserialize)]
pub struct WebhookForm {
    /// Sender identity, e.g. `whatsapp:+5511912345678`
    #[serde(rename = "From")]
    pub from: String,
    /// Media-only messages arrive without a body
    #[serde(rename = "Body", default)]
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
