use crate::services::providers::gemini::GEMINI_API_BASE;
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Upper bound on a single generation call. Past this the request is served
/// from the fallback set instead of hanging.
const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ExamConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    /// Root directory of the exam web application assets.
    pub static_dir: PathBuf,
    pub observability: ObservabilitySettings,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// Absent or blank disables generation for the lifetime of the process.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ObservabilitySettings {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            gemini: GeminiSettings {
                api_key: None,
                model: DEFAULT_GEMINI_MODEL.to_string(),
                api_base: GEMINI_API_BASE.to_string(),
                timeout_secs: DEFAULT_GEMINI_TIMEOUT_SECS,
            },
            static_dir: default_static_dir(),
            observability: ObservabilitySettings {
                log_level: "info".to_string(),
                otlp_endpoint: None,
            },
        }
    }
}

impl ExamConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(ExamConfig {
            common,
            gemini: GeminiSettings {
                api_key: optional_env("GEMINI_API_KEY").map(Secret::new),
                model: get_env("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                api_base: get_env("GEMINI_API_BASE", GEMINI_API_BASE),
                timeout_secs: parse_env("GEMINI_TIMEOUT_SECS", DEFAULT_GEMINI_TIMEOUT_SECS)?,
            },
            static_dir: optional_env("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_static_dir),
            observability: ObservabilitySettings {
                log_level: get_env("LOG_LEVEL", "info"),
                otlp_endpoint: optional_env("OTLP_ENDPOINT"),
            },
        })
    }

    pub fn generation_enabled(&self) -> bool {
        self.gemini.api_key.is_some()
    }
}

/// Bundled assets, whether started from the workspace root or the crate dir.
fn default_static_dir() -> PathBuf {
    let in_crate_dir = env::current_dir()
        .map(|dir| dir.ends_with("exam-service"))
        .unwrap_or(false);

    if in_crate_dir {
        PathBuf::from("static")
    } else {
        PathBuf::from("exam-service").join("static")
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn get_env(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match optional_env(key) {
        Some(raw) => raw.parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
        }),
        None => Ok(default),
    }
}
