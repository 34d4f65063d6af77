use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use tekmetric_sms_relay::config::{Config, LogFormat, MatchFields, SmsConfig};
use tekmetric_sms_relay::router::build_router;
use tekmetric_sms_relay::services::{SmsError, SmsNotifier, SmsReceipt};
use tekmetric_sms_relay::AppState;

#[derive(Clone, Copy)]
enum Behaviour {
    Accept,
    Reject,
    Unconfigured,
}

/// Notifier that records every message instead of calling a provider
struct RecordingNotifier {
    behaviour: Behaviour,
    sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            sent: Mutex::new(Vec::new()),
        })
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsNotifier for RecordingNotifier {
    async fn send(&self, message: &str) -> Result<SmsReceipt, SmsError> {
        if let Behaviour::Unconfigured = self.behaviour {
            return Err(SmsError::NotConfigured(self.missing_settings()));
        }

        self.sent.lock().unwrap().push(message.to_string());

        match self.behaviour {
            Behaviour::Reject => Err(SmsError::Rejected {
                status: 500,
                body: "{\"message\":\"upstream exploded\"}".to_string(),
            }),
            _ => Ok(SmsReceipt {
                provider: "recording",
                message_id: Some(format!("MSG-{}", self.sent.lock().unwrap().len())),
            }),
        }
    }

    fn provider(&self) -> &'static str {
        "recording"
    }

    fn missing_settings(&self) -> Vec<&'static str> {
        match self.behaviour {
            Behaviour::Unconfigured => vec!["SMS_TO"],
            _ => Vec::new(),
        }
    }
}

fn test_config(match_fields: MatchFields) -> Config {
    Config {
        environment: "test".to_string(),
        port: 0,
        request_timeout: 30,
        log_format: LogFormat::Pretty,
        match_fields,
        sms: SmsConfig::default(),
    }
}

fn test_app(notifier: Arc<RecordingNotifier>, match_fields: MatchFields) -> Router {
    build_router(AppState::new(test_config(match_fields), notifier))
}

async fn post_webhook(app: Router, body: impl Into<Body>) -> Result<(StatusCode, Value)> {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/tekmetric")
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())?,
        )
        .await?;

    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn test_root_health_check() -> Result<()> {
    let app = test_app(RecordingNotifier::new(Behaviour::Accept), MatchFields::LabelOrStatus);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = response.into_body().collect().await?.to_bytes();
    assert_eq!(serde_json::from_slice::<Value>(&bytes)?, json!({"ok": true}));
    Ok(())
}

#[tokio::test]
async fn test_detailed_health_reports_provider() -> Result<()> {
    let app = test_app(
        RecordingNotifier::new(Behaviour::Unconfigured),
        MatchFields::LabelOrStatus,
    );

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await?.to_bytes();
    let health: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["sms_provider"], "recording");
    assert_eq!(health["sms_configured"], false);
    assert_eq!(health["missing_settings"], json!(["SMS_TO"]));
    assert_eq!(health["environment"], "test");
    Ok(())
}

#[tokio::test]
async fn test_needs_parts_label_sends_sms() -> Result<()> {
    let notifier = RecordingNotifier::new(Behaviour::Accept);
    let app = test_app(notifier.clone(), MatchFields::Label);

    let body = json!({
        "data": {
            "repairOrderCustomLabel": {"name": "Needs Parts"},
            "repairOrderNumber": "123"
        }
    });
    let (status, ack) = post_webhook(app, body.to_string()).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, json!({"ok": true, "matched": true, "ro": "123"}));
    assert_eq!(notifier.sent(), vec!["RO 123 is NEEDS PARTS".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_other_status_is_acknowledged_without_sms() -> Result<()> {
    let notifier = RecordingNotifier::new(Behaviour::Accept);
    let app = test_app(notifier.clone(), MatchFields::LabelOrStatus);

    let (status, ack) =
        post_webhook(app, json!({"data": {"status": "In Progress"}}).to_string()).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, json!({"ok": true, "matched": false, "ro": null}));
    assert!(notifier.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_flat_status_respects_match_fields() -> Result<()> {
    let body = json!({"data": {"status": "needs_parts", "number": 42}}).to_string();

    let notifier = RecordingNotifier::new(Behaviour::Accept);
    let (status, ack) =
        post_webhook(test_app(notifier.clone(), MatchFields::LabelOrStatus), body.clone()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["ro"], "42");
    assert_eq!(notifier.sent(), vec!["RO 42 is NEEDS PARTS".to_string()]);

    let label_only = RecordingNotifier::new(Behaviour::Accept);
    let (status, ack) = post_webhook(test_app(label_only.clone(), MatchFields::Label), body).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["matched"], false);
    assert!(label_only.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_payload_without_data_object_is_ignored() -> Result<()> {
    let notifier = RecordingNotifier::new(Behaviour::Accept);

    for body in [json!({"data": "Needs Parts"}), json!(["Needs Parts"]), json!(null)] {
        let app = test_app(notifier.clone(), MatchFields::LabelOrStatus);
        let (status, ack) = post_webhook(app, body.to_string()).await?;
        assert_eq!(status, StatusCode::OK, "body: {}", body);
        assert_eq!(ack["matched"], false);
    }

    assert!(notifier.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_top_level_payload_treated_as_data() -> Result<()> {
    let notifier = RecordingNotifier::new(Behaviour::Accept);
    let app = test_app(notifier.clone(), MatchFields::Label);

    let body = json!({"repairOrderCustomLabel": {"name": "need-parts"}, "roNumber": 9001});
    let (status, _) = post_webhook(app, body.to_string()).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(notifier.sent(), vec!["RO 9001 is NEEDS PARTS".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_is_rejected() -> Result<()> {
    let notifier = RecordingNotifier::new(Behaviour::Accept);
    let app = test_app(notifier.clone(), MatchFields::LabelOrStatus);

    let (status, error) = post_webhook(app, "{\"data\": {\"status\": ").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["code"], "VAL_3003");
    assert_eq!(error["error"]["message"], "Invalid JSON");
    assert!(notifier.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_error_body_reuses_caller_request_id() -> Result<()> {
    let app = test_app(RecordingNotifier::new(Behaviour::Unconfigured), MatchFields::Label);

    for (body, request_id, expected) in [
        ("{not json".to_string(), "delivery-abc", StatusCode::BAD_REQUEST),
        (
            json!({"data": {"repairOrderCustomLabel": {"name": "Needs Parts"}}}).to_string(),
            "delivery-def",
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhooks/tekmetric")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-request-id", request_id)
                    .body(Body::from(body))?,
            )
            .await?;

        assert_eq!(response.status(), expected);
        assert_eq!(response.headers().get("x-request-id").unwrap(), request_id);
        let bytes = response.into_body().collect().await?.to_bytes();
        let error: Value = serde_json::from_slice(&bytes)?;
        assert_eq!(error["request_id"], request_id);
    }
    Ok(())
}

#[tokio::test]
async fn test_error_body_matches_generated_request_id() -> Result<()> {
    let app = test_app(RecordingNotifier::new(Behaviour::Reject), MatchFields::Label);

    let body = json!({"data": {"repairOrderCustomLabel": {"name": "Needs Parts"}, "number": 3}});
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/tekmetric")
                .body(Body::from(body.to_string()))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let header_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap();
    let bytes = response.into_body().collect().await?.to_bytes();
    let error: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(error["request_id"], header_id.as_str());
    Ok(())
}

#[tokio::test]
async fn test_provider_failure_is_bad_gateway() -> Result<()> {
    let notifier = RecordingNotifier::new(Behaviour::Reject);
    let app = test_app(notifier.clone(), MatchFields::Label);

    let body = json!({"data": {"repairOrderCustomLabel": {"name": "NEEDS_PARTS"}, "number": "77"}});
    let (status, error) = post_webhook(app, body.to_string()).await?;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error["error"]["code"], "EXT_8006");
    assert_eq!(error["error"]["message"], "Failed to send SMS");
    assert_eq!(notifier.sent().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_configuration_is_server_error() -> Result<()> {
    let notifier = RecordingNotifier::new(Behaviour::Unconfigured);
    let app = test_app(notifier.clone(), MatchFields::Label);

    let body = json!({"data": {"repairOrderCustomLabel": {"name": "Needs Parts"}}});
    let (status, error) = post_webhook(app, body.to_string()).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["error"]["code"], "INT_9998");
    assert_eq!(error["error"]["message"], "SMS not configured on server");
    assert_eq!(error["error"]["details"], "missing SMS_TO");
    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_without_recorder() -> Result<()> {
    let app = test_app(RecordingNotifier::new(Behaviour::Accept), MatchFields::Label);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain; version=0.0.4"
    );
    Ok(())
}
