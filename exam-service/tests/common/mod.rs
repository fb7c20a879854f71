#![allow(dead_code)]

use exam_service::config::ExamConfig;
use exam_service::services::providers::TextProvider;
use exam_service::startup::Application;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

pub const INDEX_HTML: &str = "<!doctype html><title>Exam</title><script src=\"app.js\"></script>";
pub const APP_JS: &str = "fetch('/api/questions');";

pub const FALLBACK_TOPICS: [&str; 5] = [
    "OOP Principles",
    "Data Structures",
    "APIs",
    "Machine Learning",
    "Databases",
];

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    static_dir: PathBuf,
}

impl TestApp {
    /// Spawn with the given generator in place of Gemini.
    pub async fn spawn(generator: Option<Arc<dyn TextProvider>>) -> Self {
        let config = test_config();
        let static_dir = config.static_dir.clone();
        let app = Application::build_with_generator(config, generator)
            .await
            .expect("Failed to build test application");
        Self::start(app, static_dir).await
    }

    /// Spawn through the production wiring, building Gemini from `config`.
    pub async fn spawn_with_config(config: ExamConfig) -> Self {
        let static_dir = config.static_dir.clone();
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        Self::start(app, static_dir).await
    }

    async fn start(app: Application, static_dir: PathBuf) -> Self {
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
            static_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.static_dir);
    }
}

/// Config bound to a random local port with a throwaway static root.
pub fn test_config() -> ExamConfig {
    let static_dir = PathBuf::from(format!("target/test-static-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&static_dir).expect("Failed to create static dir");
    std::fs::write(static_dir.join("index.html"), INDEX_HTML).expect("Failed to write index");
    std::fs::write(static_dir.join("app.js"), APP_JS).expect("Failed to write asset");

    let mut config = ExamConfig::default();
    config.common.host = "127.0.0.1".to_string();
    config.common.port = 0; // Random port for testing
    config.static_dir = static_dir;
    config
}

pub fn assert_cross_origin_headers(headers: &reqwest::header::HeaderMap) {
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["cross-origin-opener-policy"], "same-origin");
    assert_eq!(headers["cross-origin-embedder-policy"], "require-corp");
}

/// Five generated questions with the given (arbitrary) ids.
pub fn generated_questions(ids: [i64; 5]) -> String {
    let items: Vec<serde_json::Value> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            serde_json::json!({
                "id": id,
                "text": format!("Generated question {}", i + 1),
                "topic": format!("Generated topic {}", i + 1),
            })
        })
        .collect();
    serde_json::to_string(&items).expect("Failed to serialize questions")
}
