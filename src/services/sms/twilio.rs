use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use super::{join_url, SmsError, SmsNotifier, SmsReceipt};
use crate::config::{SmsConfig, TwilioConfig};

const PROVIDER: &str = "twilio";

/// Subset of Twilio's Message resource we care about
#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: Option<String>,
    status: Option<String>,
}

/// Twilio Programmable Messaging notifier
#[derive(Clone)]
pub struct TwilioNotifier {
    client: Client,
    config: TwilioConfig,
    to: Option<String>,
}

impl TwilioNotifier {
    pub fn new(client: Client, sms: &SmsConfig) -> Self {
        Self {
            client,
            config: sms.twilio.clone(),
            to: sms.to.clone(),
        }
    }

    fn messages_url(&self, account_sid: &str) -> String {
        join_url(
            &self.config.api_base,
            &format!("2010-04-01/Accounts/{}/Messages.json", account_sid),
        )
    }
}

#[async_trait]
impl SmsNotifier for TwilioNotifier {
    async fn send(&self, message: &str) -> Result<SmsReceipt, SmsError> {
        let (Some(account_sid), Some(auth_token), Some(from), Some(to)) = (
            self.config.account_sid.as_deref(),
            self.config.auth_token.as_deref(),
            self.config.from.as_deref(),
            self.to.as_deref(),
        ) else {
            return Err(SmsError::NotConfigured(self.missing_settings()));
        };

        let url = self.messages_url(account_sid);
        debug!(url = %url, "Sending SMS via Twilio");

        let response = self
            .client
            .post(&url)
            .basic_auth(account_sid, Some(auth_token))
            .form(&[("To", to), ("From", from), ("Body", message)])
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "Twilio request failed");
                SmsError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                provider = PROVIDER,
                status = status.as_u16(),
                body = %body,
                "Twilio rejected the message"
            );
            return Err(SmsError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // Twilio answers 201 with the created Message resource
        let created = response.json::<TwilioMessage>().await.ok();
        let (message_id, delivery_status) = match created {
            Some(m) => (m.sid, m.status),
            None => (None, None),
        };
        info!(
            provider = PROVIDER,
            message_id = ?message_id,
            status = ?delivery_status,
            "SMS accepted by Twilio"
        );

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
        if self.config.account_sid.is_none() {
            missing.push("TWILIO_SID");
        }
        if self.config.auth_token.is_none() {
            missing.push("TWILIO_TOKEN");
        }
        if self.config.from.is_none() {
            missing.push("TWILIO_FROM");
        }
        if self.to.is_none() {
            missing.push("SMS_TO");
        }
        missing
    }
}
