//! Application startup and initialization logic

use anyhow::Result;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::config::Config;
use crate::services;

/// Initialize application services and create the AppState.
pub async fn initialize_app(config: &Config) -> Result<AppState> {
    info!("🚀 Starting Tekmetric SMS relay ({})", config.environment);

    // Initialize Prometheus metrics exporter
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;
    info!("✅ Prometheus metrics initialized");

    let notifier = services::build_notifier(&config.sms)?;
    let missing = notifier.missing_settings();
    if missing.is_empty() {
        info!(
            "✅ SMS notifier initialized (provider: {}, timeout: {}s)",
            notifier.provider(),
            config.sms.timeout_secs
        );
    } else {
        warn!(
            "⚠️  SMS provider {} is missing {}. Matching webhooks will fail until configured.",
            notifier.provider(),
            missing.join(", ")
        );
    }

    info!("✅ Matching on {:?}", config.match_fields);

    Ok(AppState::new(config.clone(), notifier).with_metrics(metrics_handle))
}
