//! # Language Model Module
//!
//! This module implements the language-model collaborator used by the planner
//! and summarizer. It demonstrates:
//! - Trait-based seams so tests can substitute a fake model
//! - Async/await for non-blocking I/O
//! - Structured error handling with thiserror
//! - Serde for JSON serialization/deserialization
//!
//! The concrete implementation talks to the Gemini `generateContent` REST API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;

// =============================================================================
// CUSTOM ERROR TYPE
// =============================================================================
/// # Rust Concept: Custom Error Types with thiserror
///
/// thiserror is a derive macro that makes creating custom error types easy.
/// Each variant represents a different kind of error that can occur.
/// The #[error("...")] attribute defines the error message.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("GOOGLE_API_KEY is not set - the model cannot be called without it")]
    MissingApiKey,

    #[error("Model request failed with HTTP {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("Model response contained no text candidates")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

// =============================================================================
// MODEL TEXT NORMALIZATION
// =============================================================================
/// A raw model response: either one plain string or a composite list of text
/// fragments. Gemini returns the latter whenever a candidate carries several
/// `parts`, so both shapes are first-class here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelText {
    /// A single text body
    Single(String),
    /// Multiple text fragments belonging to one response
    Fragments(Vec<String>),
}

/// Collapse a raw model response into one string.
///
/// This is the only place in the crate that branches on response shape.
/// Every caller of [`LanguageModel::invoke`] runs the reply through here
/// before doing anything else with it. Fragments are joined with newlines
/// (the planner parses line-by-line, so newline is the join that matters).
pub fn normalize_model_text(raw: ModelText) -> String {
    match raw {
        ModelText::Single(text) => text,
        ModelText::Fragments(parts) => parts.join("\n"),
    }
}

// =============================================================================
// LANGUAGE MODEL TRAIT
// =============================================================================
/// The text-completion interface the workflow depends on.
///
/// # Rust Concept: Traits as Seams
///
/// Traits are like interfaces in other languages - they define behavior.
/// The orchestrator only knows this trait, so tests can drive the whole
/// workflow with a scripted fake instead of a live API.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send one prompt and return the raw (not yet normalized) reply.
    async fn invoke(&self, prompt: &str, temperature: f32) -> Result<ModelText, ModelError>;
}

// =============================================================================
// GEMINI CLIENT
// =============================================================================
/// Client for the Gemini `generateContent` endpoint.
///
/// Constructed once at startup and shared by reference; there is no global
/// client instance hiding anywhere.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("research-scout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn request_url(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn invoke(&self, prompt: &str, temperature: f32) -> Result<ModelText, ModelError> {
        if self.api_key.is_empty() {
            return Err(ModelError::MissingApiKey);
        }

        let payload = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": temperature
            }
        });

        info!(
            model = %self.model,
            prompt_chars = prompt.len(),
            "Sending request to Gemini"
        );

        let response = self
            .http
            .post(self.request_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ModelError::HttpStatus(response.status()));
        }

        let body: GenerateContentResponse = response.json().await?;
        debug!("Received response from Gemini");

        Ok(body.into_model_text()?)
    }
}

// =============================================================================
// RESPONSE DESERIALIZATION
// =============================================================================
/// Wire format of a `generateContent` response (only the fields we read).
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Collect all text parts of the first candidate into a [`ModelText`].
    fn into_model_text(self) -> Result<ModelText, ModelError> {
        let mut parts: Vec<String> = self
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        match parts.len() {
            0 => Err(ModelError::EmptyResponse),
            1 => Ok(ModelText::Single(parts.remove(0))),
            _ => Ok(ModelText::Fragments(parts)),
        }
    }
}
