//! Prometheus metrics for exam-service.
//!
//! Tracks where each served question set came from and how the generation
//! provider behaves.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Mutex, OnceLock};

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static QUESTION_SETS_SERVED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static GENERATION_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static GENERATION_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static GENERATION_TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Serializes initialization so the registry and its metrics come from one call.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Where a served question set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSource {
    Generated,
    FallbackDisabled,
    FallbackError,
}

impl QuestionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionSource::Generated => "generated",
            QuestionSource::FallbackDisabled => "fallback_disabled",
            QuestionSource::FallbackError => "fallback_error",
        }
    }
}

/// Initialize all metrics. Later calls are no-ops.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let sets_served = IntCounterVec::new(
        Opts::new(
            "exam_question_sets_served_total",
            "Question sets served, by source",
        ),
        &["source"],
    )?;

    let latency = HistogramVec::new(
        HistogramOpts::new(
            "exam_generation_latency_seconds",
            "Question generation provider latency in seconds",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0]),
        &["model", "outcome"],
    )?;

    let errors = IntCounterVec::new(
        Opts::new(
            "exam_generation_errors_total",
            "Question generation failures, by kind",
        ),
        &["kind"],
    )?;

    let tokens = IntCounterVec::new(
        Opts::new("exam_generation_tokens_total", "Tokens used for generation"),
        &["model", "type"], // type: input, output
    )?;

    registry.register(Box::new(sets_served.clone()))?;
    registry.register(Box::new(latency.clone()))?;
    registry.register(Box::new(errors.clone()))?;
    registry.register(Box::new(tokens.clone()))?;

    let _ = REGISTRY.set(registry);
    let _ = QUESTION_SETS_SERVED_TOTAL.set(sets_served);
    let _ = GENERATION_LATENCY_SECONDS.set(latency);
    let _ = GENERATION_ERRORS_TOTAL.set(errors);
    let _ = GENERATION_TOKENS_TOTAL.set(tokens);

    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => return "# Metrics registry not initialized\n".to_string(),
    };

    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

pub fn record_question_set(source: QuestionSource) {
    if let Some(counter) = QUESTION_SETS_SERVED_TOTAL.get() {
        counter.with_label_values(&[source.as_str()]).inc();
    }
}

pub fn record_generation_latency(model: &str, outcome: &str, duration_secs: f64) {
    if let Some(histogram) = GENERATION_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[model, outcome])
            .observe(duration_secs);
    }
}

pub fn record_generation_error(kind: &str) {
    if let Some(counter) = GENERATION_ERRORS_TOTAL.get() {
        counter.with_label_values(&[kind]).inc();
    }
}

pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    if let Some(counter) = GENERATION_TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[model, "input"])
            .inc_by(input_tokens.max(0) as u64);
        counter
            .with_label_values(&[model, "output"])
            .inc_by(output_tokens.max(0) as u64);
    }
}
