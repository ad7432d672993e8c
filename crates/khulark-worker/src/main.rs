//! Feed-photo worker entry point.
//!
//! Loads configuration from the environment, builds the detection and
//! language-model pipeline, and serves `POST /feed-photo` until `Ctrl-C`.
//! Logging starts once the configuration is known, since `LOG_FORMAT` is
//! part of it.

use std::sync::Arc;

use khulark_worker::{AppState, FeedPhotoService, LogFormat, ServerConfig, WorkerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = WorkerConfig::from_env()?;
    init_tracing(config.log_format);

    info!("khulark-worker starting");
    info!(
        detection_model = config.detection_model,
        llm_model = config.llm.model,
        min_detection_score = config.min_detection_score,
        max_upload_bytes = config.max_upload_bytes,
        "configuration loaded"
    );

    let service = FeedPhotoService::from_config(&config)?;
    info!(
        backend = service.backend_name(),
        custom_templates = config.templates_dir.is_some(),
        "feed-photo pipeline ready"
    );

    let state = Arc::new(AppState::new(service, config.max_upload_bytes));
    khulark_worker::start_server(&ServerConfig::from(&config), state).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
