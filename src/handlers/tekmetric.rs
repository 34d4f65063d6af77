//! Tekmetric repair-order webhook.
//!
//! Every request ends in one of four outcomes: acknowledged without action,
//! acknowledged after an SMS went out, rejected as malformed (400), or a
//! failed send (500 when SMS is not configured, 502 when the provider fails).

use axum::{body::Bytes, extract::State, response::Json, Extension};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::middleware::RequestId;
use crate::models::classify;
use crate::services::sms::{track_delivery, SmsError};

/// Acknowledgement returned for every processed webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub ok: bool,
    pub matched: bool,
    /// Repair-order identifier, only set for matched events
    pub ro: Option<String>,
}

impl WebhookAck {
    fn ignored() -> Self {
        Self {
            ok: true,
            matched: false,
            ro: None,
        }
    }

    fn notified(ro: String) -> Self {
        Self {
            ok: true,
            matched: true,
            ro: Some(ro),
        }
    }
}

fn track_webhook(outcome: &'static str) {
    counter!("tekmetric_webhooks_total", "outcome" => outcome).increment(1);
}

fn record_send_failure(provider: &'static str, ro: &str, err: &SmsError) {
    match err {
        // Nothing reached the provider, so no delivery is counted
        SmsError::NotConfigured(missing) => {
            track_webhook("unconfigured");
            error!(
                ro = %ro,
                provider = provider,
                "SMS not configured, missing {}",
                missing.join(", ")
            );
        }
        _ => {
            track_delivery(provider, false);
            track_webhook("delivery_failed");
            error!(ro = %ro, provider = provider, error = %err, "Failed to send SMS");
        }
    }
}

/// Receive a Tekmetric webhook
/// POST /webhooks/tekmetric
pub async fn tekmetric_webhook(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(request_id = %request_id, error = %e, bytes = body.len(), "Invalid JSON payload");
        track_webhook("invalid");
        ApiError::invalid_json(e.to_string()).with_request_id(&request_id)
    })?;

    info!(request_id = %request_id, payload = %payload, "Received Tekmetric webhook");

    let Some(event) = classify(&payload, state.config.match_fields) else {
        debug!("Webhook is not a Needs Parts transition, ignoring");
        track_webhook("ignored");
        return Ok(Json(WebhookAck::ignored()));
    };

    let provider = state.notifier.provider();
    match state.notifier.send(&event.message()).await {
        Ok(receipt) => {
            track_delivery(provider, true);
            track_webhook("notified");
            info!(
                ro = %event.ro,
                provider = provider,
                message_id = ?receipt.message_id,
                "SMS sent for RO {}",
                event.ro
            );
            Ok(Json(WebhookAck::notified(event.ro)))
        }
        Err(err) => {
            record_send_failure(provider, &event.ro, &err);
            Err(ApiError::from(err).with_request_id(request_id))
        }
    }
}
