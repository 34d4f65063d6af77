use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{join_url, SmsError, SmsNotifier, SmsReceipt};
use crate::config::{ClickSendConfig, SmsConfig};

const PROVIDER: &str = "clicksend";
const SUCCESS: &str = "SUCCESS";

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    messages: Vec<OutboundMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    source: &'a str,
    body: &'a str,
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    response_code: Option<String>,
    data: Option<SendResponseData>,
}

#[derive(Debug, Deserialize)]
struct SendResponseData {
    #[serde(default)]
    messages: Vec<MessageResult>,
}

#[derive(Debug, Deserialize)]
struct MessageResult {
    status: Option<String>,
    message_id: Option<String>,
}

impl SendResponse {
    /// First non-success code reported by ClickSend, if any
    fn failure_code(&self) -> Option<&str> {
        if let Some(code) = self.response_code.as_deref().filter(|c| *c != SUCCESS) {
            return Some(code);
        }
        self.first_message()
            .and_then(|m| m.status.as_deref())
            .filter(|s| *s != SUCCESS)
    }

    fn first_message(&self) -> Option<&MessageResult> {
        self.data.as_ref().and_then(|d| d.messages.first())
    }
}

/// ClickSend REST v3 notifier
#[derive(Clone)]
pub struct ClickSendNotifier {
    client: Client,
    config: ClickSendConfig,
    to: Option<String>,
}

impl ClickSendNotifier {
    pub fn new(client: Client, sms: &SmsConfig) -> Self {
        Self {
            client,
            config: sms.clicksend.clone(),
            to: sms.to.clone(),
        }
    }

    fn send_url(&self) -> String {
        join_url(&self.config.api_base, "v3/sms/send")
    }
}

#[async_trait]
impl SmsNotifier for ClickSendNotifier {
    async fn send(&self, message: &str) -> Result<SmsReceipt, SmsError> {
        let (Some(username), Some(api_key), Some(to)) = (
            self.config.username.as_deref(),
            self.config.api_key.as_deref(),
            self.to.as_deref(),
        ) else {
            return Err(SmsError::NotConfigured(self.missing_settings()));
        };

        let payload = SendRequest {
            messages: vec![OutboundMessage {
                source: &self.config.source,
                body: message,
                to,
                from: self.config.from.as_deref(),
            }],
        };

        let url = self.send_url();
        debug!(url = %url, "Sending SMS via ClickSend");

        let response = self
            .client
            .post(&url)
            .basic_auth(username, Some(api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "ClickSend request failed");
                SmsError::Transport(e)
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!(
                provider = PROVIDER,
                status = status.as_u16(),
                body = %body,
                "ClickSend rejected the message"
            );
            return Err(SmsError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SendResponse = serde_json::from_str(&body).map_err(|e| {
            error!(provider = PROVIDER, body = %body, error = %e, "Unreadable ClickSend response");
            SmsError::InvalidResponse(e.to_string())
        })?;

        if let Some(code) = parsed.failure_code() {
            error!(
                provider = PROVIDER,
                status = status.as_u16(),
                code = %code,
                body = %body,
                "ClickSend reported a failed message"
            );
            return Err(SmsError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let message_id = parsed.first_message().and_then(|m| m.message_id.clone());
        info!(provider = PROVIDER, message_id = ?message_id, "SMS accepted by ClickSend");

        Ok(SmsReceipt {
            provider: PROVIDER,
            message_id,
        })
    }

    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.config.username.is_none() {
            missing.push("CLICKSEND_USERNAME");
        }
        if self.config.api_key.is_none() {
            missing.push("CLICKSEND_API_KEY");
        }
        if self.to.is_none() {
            missing.push("SMS_TO");
        }
        missing
    }
}
