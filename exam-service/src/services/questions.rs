//! Question set provider.
//!
//! Serves AI-generated exam questions when a generator is configured and the
//! fixed offline set otherwise. Every failure on the generation path is
//! absorbed here: callers always receive a complete, numbered set.

use crate::models::{fallback_questions, Question, QUESTION_COUNT};
use crate::services::metrics::{self, QuestionSource};
use crate::services::providers::{GenerationParams, ProviderError, TextProvider};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use validator::Validate;

/// Prompt sent to the generator. The model is asked for bare JSON but is
/// known to wrap it in markdown fences anyway; see [`strip_code_fence`].
pub const QUESTION_PROMPT: &str = "\
Generate 5 unique, challenging exam questions for a Computer Science exam.
Topics should cover: OOP, Data Structures, Web Development, Machine Learning, and Databases.

Return ONLY a raw JSON array with no markdown formatting.
Each object in the array must have: 'id' (number), 'text' (string), and 'topic' (string).";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Question generation is not configured")]
    Unavailable,

    #[error("Generator failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Malformed generator output: {0}")]
    Malformed(String),
}

impl GenerationError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Unavailable => "unavailable",
            GenerationError::Provider(e) => e.kind(),
            GenerationError::Malformed(_) => "malformed",
        }
    }
}

/// Shape each generated element must have. Any `id` the model produced is
/// ignored; positions are authoritative.
#[derive(Debug, Deserialize, Validate)]
struct RawQuestion {
    #[validate(length(min = 1, message = "Question text cannot be empty"))]
    text: String,
    #[validate(length(min = 1, message = "Question topic cannot be empty"))]
    topic: String,
}

impl RawQuestion {
    fn into_question(self, id: u32) -> Result<Question, GenerationError> {
        let trimmed = RawQuestion {
            text: self.text.trim().to_string(),
            topic: self.topic.trim().to_string(),
        };
        trimmed
            .validate()
            .map_err(|e| GenerationError::Malformed(format!("question {}: {}", id, e)))?;

        Ok(Question {
            id,
            text: trimmed.text,
            topic: trimmed.topic,
        })
    }
}

#[derive(Clone)]
pub struct QuestionProvider {
    generator: Option<Arc<dyn TextProvider>>,
}

impl QuestionProvider {
    pub fn new(generator: Option<Arc<dyn TextProvider>>) -> Self {
        Self { generator }
    }

    /// Provider that only ever serves the offline set.
    pub fn disabled() -> Self {
        Self { generator: None }
    }

    pub fn generation_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Return a question set. Never fails; any generation problem degrades
    /// to the offline set.
    pub async fn get_questions(&self) -> Vec<Question> {
        match self.generate().await {
            Ok(questions) => {
                tracing::info!(count = questions.len(), "Successfully generated questions");
                metrics::record_question_set(QuestionSource::Generated);
                questions
            }
            Err(GenerationError::Unavailable) => {
                tracing::info!("No Gemini API key configured, serving fallback questions");
                metrics::record_question_set(QuestionSource::FallbackDisabled);
                fallback_questions()
            }
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Error generating questions, serving fallback questions");
                metrics::record_generation_error(e.kind());
                metrics::record_question_set(QuestionSource::FallbackError);
                fallback_questions()
            }
        }
    }

    /// Ask the generator for a fresh set. One attempt, no retries.
    pub async fn generate(&self) -> Result<Vec<Question>, GenerationError> {
        let generator = self.generator.as_ref().ok_or(GenerationError::Unavailable)?;
        let model = generator.model();

        tracing::info!(model = %model, "Generating questions with Gemini");

        let start = Instant::now();
        let result = generator
            .generate(QUESTION_PROMPT, &GenerationParams::default())
            .await;
        let outcome = if result.is_ok() { "success" } else { "error" };
        metrics::record_generation_latency(model, outcome, start.elapsed().as_secs_f64());

        let response = result?;
        metrics::record_tokens(model, response.input_tokens, response.output_tokens);

        parse_questions(&response.text)
    }
}

/// Remove surrounding whitespace and markdown code fences: a leading
/// "```json" or "```" marker and a trailing "```" marker.
pub fn strip_code_fence(text: &str) -> &str {
    let mut cleaned = text.trim();

    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }

    cleaned.trim()
}

/// Parse raw generator text into a validated, renumbered question set.
///
/// Exactly [`QUESTION_COUNT`] questions are required.
pub fn parse_questions(raw: &str) -> Result<Vec<Question>, GenerationError> {
    let cleaned = strip_code_fence(raw);

    let parsed: Vec<RawQuestion> = serde_json::from_str(cleaned)
        .map_err(|e| GenerationError::Malformed(format!("not a JSON question array: {}", e)))?;

    if parsed.len() != QUESTION_COUNT {
        return Err(GenerationError::Malformed(format!(
            "expected {} questions, got {}",
            QUESTION_COUNT,
            parsed.len()
        )));
    }

    parsed
        .into_iter()
        .zip(1u32..)
        .map(|(raw, id)| raw.into_question(id))
        .collect()
}
