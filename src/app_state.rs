//! Application state shared across all handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::Config;
use crate::services::SmsNotifier;

/// Application state shared across handlers.
///
/// Everything in here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Outbound SMS provider
    pub notifier: Arc<dyn SmsNotifier>,
    /// Prometheus render handle, absent when no recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Config, notifier: Arc<dyn SmsNotifier>) -> Self {
        Self {
            config,
            notifier,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
