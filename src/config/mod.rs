use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

pub mod sms;
pub use sms::{ClickSendConfig, SmsConfig, SmsProvider, TwilioConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub environment: String,
    pub port: u16,
    /// Upper bound on a whole inbound request, in seconds
    pub request_timeout: u64,
    pub log_format: LogFormat,
    pub match_fields: MatchFields,
    pub sms: SmsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unsupported LOG_FORMAT: {}", other)),
        }
    }
}

/// Which webhook fields are consulted for the repair-order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFields {
    /// Only `repairOrderCustomLabel.name`
    Label,
    /// `repairOrderCustomLabel.name`, falling back to the flat `status` field
    LabelOrStatus,
}

impl FromStr for MatchFields {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "label" => Ok(MatchFields::Label),
            "label_or_status" | "label-or-status" => Ok(MatchFields::LabelOrStatus),
            other => Err(anyhow::anyhow!(
                "Unsupported TEKMETRIC_MATCH_FIELDS: {} (expected label or label_or_status)",
                other
            )),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Config {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|e| anyhow::anyhow!("PORT must be a valid port number: {}", e))?,
            request_timeout: env::var("REQUEST_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|e| anyhow::anyhow!("REQUEST_TIMEOUT must be seconds: {}", e))?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse()?,
            match_fields: env::var("TEKMETRIC_MATCH_FIELDS")
                .unwrap_or_else(|_| "label_or_status".to_string())
                .parse()?,
            sms: SmsConfig::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// The inbound timeout must outlast the SMS call, or a slow provider
    /// surfaces as 408 instead of a delivery failure
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout <= self.sms.timeout_secs {
            anyhow::bail!(
                "REQUEST_TIMEOUT ({}s) must be greater than SMS_TIMEOUT_SECS ({}s)",
                self.request_timeout,
                self.sms.timeout_secs
            );
        }
        Ok(())
    }
}

/// Read an optional variable, treating blank values as unset
pub(crate) fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
