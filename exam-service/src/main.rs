use dotenvy::dotenv;
use exam_service::config::ExamConfig;
use exam_service::startup::Application;
use service_core::observability::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = ExamConfig::load().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "exam-service",
        &config.observability.log_level,
        config.observability.otlp_endpoint.as_deref(),
    );

    exam_service::services::metrics::init_metrics()?;

    let static_dir = config.static_dir.clone();
    let app = Application::build(config).await?;

    info!(
        port = app.port(),
        static_dir = %static_dir.display(),
        "Exam proctoring server running on http://localhost:{}",
        app.port()
    );
    if app.generation_enabled() {
        info!("Gemini question generation enabled");
    } else {
        warn!("Gemini API key missing, serving offline questions");
    }

    app.run_until_stopped().await?;

    Ok(())
}
