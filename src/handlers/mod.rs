// HTTP request handlers

pub mod health;
pub mod metrics;
pub mod tekmetric;

pub use self::health::{health_check, root};
pub use self::metrics::get_prometheus_metrics;
pub use self::tekmetric::{tekmetric_webhook, WebhookAck};
