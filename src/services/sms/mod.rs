//! SMS delivery
//!
//! A matched webhook produces exactly one outbound message. Providers sit
//! behind [`SmsNotifier`] so handlers never know which API is in use.

pub mod clicksend;
pub mod twilio;

pub use clicksend::ClickSendNotifier;
pub use twilio::TwilioNotifier;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::config::{SmsConfig, SmsProvider};

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS not configured: missing {}", .0.join(", "))]
    NotConfigured(Vec<&'static str>),

    #[error("SMS provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("SMS provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected SMS provider response: {0}")]
    InvalidResponse(String),
}

/// Provider acknowledgement for a sent message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmsReceipt {
    pub provider: &'static str,
    pub message_id: Option<String>,
}

#[async_trait]
pub trait SmsNotifier: Send + Sync {
    /// Send `message` to the configured recipient. One attempt, no retry.
    async fn send(&self, message: &str) -> Result<SmsReceipt, SmsError>;

    fn provider(&self) -> &'static str;

    /// Settings still missing before a send can succeed
    fn missing_settings(&self) -> Vec<&'static str>;
}

/// HTTP client shared by a notifier, bounded by the configured timeout
pub fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build SMS HTTP client: {}", e))
}

/// Build the notifier for the configured provider
pub fn build_notifier(config: &SmsConfig) -> Result<Arc<dyn SmsNotifier>> {
    let client = http_client(config.timeout_secs)?;

    let notifier: Arc<dyn SmsNotifier> = match config.provider {
        SmsProvider::Twilio => Arc::new(TwilioNotifier::new(client, config)),
        SmsProvider::ClickSend => Arc::new(ClickSendNotifier::new(client, config)),
    };

    Ok(notifier)
}

/// Count a delivery attempt
pub fn track_delivery(provider: &'static str, success: bool) {
    counter!(
        "sms_messages_total",
        "provider" => provider,
        "success" => success.to_string()
    )
    .increment(1);
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
