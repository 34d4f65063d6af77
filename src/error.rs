use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::services::sms::SmsError;

/// Error codes for categorizing errors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ErrorCode {
    // Validation errors (3xxx)
    #[serde(rename = "VAL_3003")]
    InvalidFormat,

    // External service errors (8xxx)
    #[serde(rename = "EXT_8002")]
    ExternalServiceTimeout,
    #[serde(rename = "EXT_8006")]
    SmsDeliveryFailed,

    // Internal errors (9xxx)
    #[serde(rename = "INT_9998")]
    ConfigurationError,
}

impl ErrorCode {
    /// Get numeric code
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::InvalidFormat => 3003,
            ErrorCode::ExternalServiceTimeout => 8002,
            ErrorCode::SmsDeliveryFailed => 8006,
            ErrorCode::ConfigurationError => 9998,
        }
    }

    /// Get user-friendly message
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidFormat => "Invalid JSON",
            ErrorCode::ExternalServiceTimeout => "SMS provider request timed out",
            ErrorCode::SmsDeliveryFailed => "Failed to send SMS",
            ErrorCode::ConfigurationError => "SMS not configured on server",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,
            ErrorCode::ExternalServiceTimeout | ErrorCode::SmsDeliveryFailed => {
                StatusCode::BAD_GATEWAY
            }
            ErrorCode::ConfigurationError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Structured error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub request_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub code_number: u16,
    pub message: String,
    pub details: String,
}

/// Failure surfaced to the webhook caller
#[derive(Debug, Error)]
#[error("{message}: {details}", message = .code.message())]
pub struct ApiError {
    code: ErrorCode,
    details: String,
    /// Id of the request that failed; minted at render time when unset
    request_id: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, details: impl Into<String>) -> Self {
        Self {
            code,
            details: details.into(),
            request_id: None,
        }
    }

    /// Request body is not parseable JSON
    pub fn invalid_json(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFormat, details)
    }

    /// Tag the error with the id the request logger assigned
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn error_code(&self) -> ErrorCode {
        self.code
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    /// Log error with appropriate level
    fn log_error(&self, request_id: &str) {
        match self.status_code() {
            status if status.is_server_error() => {
                error!(
                    request_id = %request_id,
                    code = ?self.code,
                    error = %self,
                    "Server error occurred"
                );
            }
            status if status.is_client_error() => {
                warn!(
                    request_id = %request_id,
                    code = ?self.code,
                    error = %self,
                    "Client error occurred"
                );
            }
            _ => {}
        }
    }
}

impl From<SmsError> for ApiError {
    fn from(err: SmsError) -> Self {
        match err {
            SmsError::NotConfigured(missing) => ApiError::new(
                ErrorCode::ConfigurationError,
                format!("missing {}", missing.join(", ")),
            ),
            SmsError::Rejected { status, .. } => ApiError::new(
                ErrorCode::SmsDeliveryFailed,
                format!("provider responded with status {}", status),
            ),
            SmsError::Transport(e) if e.is_timeout() => {
                ApiError::new(ErrorCode::ExternalServiceTimeout, e.to_string())
            }
            SmsError::Transport(e) => ApiError::new(ErrorCode::SmsDeliveryFailed, e.to_string()),
            SmsError::InvalidResponse(msg) => ApiError::new(ErrorCode::SmsDeliveryFailed, msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = self
            .request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        self.log_error(&request_id);

        let code = self.code;
        let error_response = ErrorResponse {
            error: ErrorDetail {
                code,
                code_number: code.code(),
                message: code.message().to_string(),
                details: self.details,
            },
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (code.status_code(), Json(error_response)).into_response()
    }
}
