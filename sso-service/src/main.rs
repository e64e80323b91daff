use service_core::error::AppError;
use service_core::observability::init_tracing;
use sso_service::{config::SsoConfig, startup::Application};
use tracing::Instrument;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = SsoConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    sso_service::services::metrics::init_metrics();

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );

    async move {
        tracing::info!(
            grpc_port = config.common.grpc_port,
            http_port = config.common.http_port,
            "Starting SSO service"
        );

        let application = Application::build(config).await?;
        application.run_until_stopped().await
    }
    .instrument(service_span)
    .await
}
