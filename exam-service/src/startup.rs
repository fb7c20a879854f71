//! Application startup and lifecycle management.
//!
//! One HTTP listener serves the exam web app from the static root, the
//! question API, and the health/metrics endpoints. Cross-origin headers are
//! attached to every response by a single router-wide layer.

use crate::config::ExamConfig;
use crate::handlers::{
    health::health_check,
    metrics::metrics,
    questions::{get_questions, questions_preflight},
};
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::TextProvider;
use crate::services::QuestionProvider;
use axum::{middleware::from_fn, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{cross_origin_middleware, request_id_middleware};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub questions: QuestionProvider,
}

pub fn build_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route(
            "/api/questions",
            get(get_questions).options(questions_preflight),
        )
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        // `/` resolves to index.html inside the static root.
        .fallback_service(ServeDir::new(static_dir))
        .layer(from_fn(cross_origin_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Build the Gemini generator, or `None` when no API key is configured.
pub fn build_generator(config: &ExamConfig) -> Result<Option<Arc<dyn TextProvider>>, AppError> {
    let Some(gemini_config) = GeminiConfig::from_settings(&config.gemini) else {
        return Ok(None);
    };

    let provider = GeminiTextProvider::new(gemini_config)
        .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;

    tracing::info!(
        model = %config.gemini.model,
        timeout_secs = config.gemini.timeout_secs,
        "Initialized Gemini text provider"
    );

    Ok(Some(Arc::new(provider)))
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    generation_enabled: bool,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: ExamConfig) -> Result<Self, AppError> {
        let generator = build_generator(&config)?;
        Self::build_with_generator(config, generator).await
    }

    /// Build with an explicit generator in place of the configured one.
    pub async fn build_with_generator(
        config: ExamConfig,
        generator: Option<Arc<dyn TextProvider>>,
    ) -> Result<Self, AppError> {
        let questions = QuestionProvider::new(generator);
        let generation_enabled = questions.generation_enabled();
        let router = build_router(AppState { questions }, &config.static_dir);

        let address = config.common.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
            generation_enabled,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn generation_enabled(&self) -> bool {
        self.generation_enabled
    }

    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
