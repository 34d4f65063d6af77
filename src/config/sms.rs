use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::optional_var;

pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";
pub const DEFAULT_CLICKSEND_API_BASE: &str = "https://rest.clicksend.com";
pub const DEFAULT_CLICKSEND_SOURCE: &str = "tekmetric-webhook";

/// Outbound provider call timeout in seconds (default: 20)
pub const DEFAULT_SMS_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsProvider {
    Twilio,
    ClickSend,
}

impl SmsProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmsProvider::Twilio => "twilio",
            SmsProvider::ClickSend => "clicksend",
        }
    }
}

impl fmt::Display for SmsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmsProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twilio" => Ok(SmsProvider::Twilio),
            "clicksend" | "click_send" | "click-send" => Ok(SmsProvider::ClickSend),
            other => Err(anyhow!(
                "Unsupported SMS_PROVIDER: {} (expected twilio or clicksend)",
                other
            )),
        }
    }
}

/// SMS relay configuration.
///
/// Credentials and the recipient may be absent at startup. A send attempted
/// without them fails with a configuration error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    pub provider: SmsProvider,
    /// Destination phone number
    pub to: Option<String>,
    pub timeout_secs: u64,
    pub twilio: TwilioConfig,
    pub clicksend: ClickSendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickSendConfig {
    pub username: Option<String>,
    pub api_key: Option<String>,
    pub source: String,
    pub from: Option<String>,
    pub api_base: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            provider: SmsProvider::Twilio,
            to: None,
            timeout_secs: DEFAULT_SMS_TIMEOUT_SECS,
            twilio: TwilioConfig {
                account_sid: None,
                auth_token: None,
                from: None,
                api_base: DEFAULT_TWILIO_API_BASE.to_string(),
            },
            clicksend: ClickSendConfig {
                username: None,
                api_key: None,
                source: DEFAULT_CLICKSEND_SOURCE.to_string(),
                from: None,
                api_base: DEFAULT_CLICKSEND_API_BASE.to_string(),
            },
        }
    }
}

impl SmsConfig {
    /// Load SMS settings from environment variables with defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(provider) = optional_var("SMS_PROVIDER") {
            config.provider = provider.parse()?;
        }

        if let Some(val) = optional_var("SMS_TIMEOUT_SECS") {
            config.timeout_secs = val
                .parse()
                .map_err(|e| anyhow!("SMS_TIMEOUT_SECS must be seconds: {}", e))?;
        }

        config.to = optional_var("SMS_TO");

        config.twilio.account_sid = optional_var("TWILIO_SID");
        config.twilio.auth_token = optional_var("TWILIO_TOKEN");
        config.twilio.from = optional_var("TWILIO_FROM");
        if let Some(base) = optional_var("TWILIO_API_BASE") {
            config.twilio.api_base = base;
        }

        config.clicksend.username = optional_var("CLICKSEND_USERNAME");
        config.clicksend.api_key = optional_var("CLICKSEND_API_KEY");
        config.clicksend.from = optional_var("CLICKSEND_FROM");
        if let Some(source) = optional_var("CLICKSEND_SOURCE") {
            config.clicksend.source = source;
        }
        if let Some(base) = optional_var("CLICKSEND_API_BASE") {
            config.clicksend.api_base = base;
        }

        Ok(config)
    }
}
