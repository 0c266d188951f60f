//! # Configuration Module
//!
//! This module handles loading and managing configuration from environment variables.
//! It demonstrates several important Rust patterns:
//! - Structs with named fields
//! - The Default trait for sensible defaults
//! - Error handling with Result types
//! - String ownership vs borrowing

use anyhow::{Context, Result};
use std::env;

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Main configuration for the research agent.
///
/// # Rust Concept: Structs
/// Structs are Rust's way of creating custom data types. They're similar to
/// classes in other languages but without inheritance. Each field has a name
/// and type.
///
/// # Rust Concept: Derive Macros
/// The #[derive(...)] attribute automatically implements common traits:
/// - Debug: Allows printing with {:?} format
/// - Clone: Creates a deep copy of the struct
#[derive(Debug, Clone)]
pub struct Config {
    /// The Gemini model to use (e.g., "gemini-flash-latest")
    pub model: String,

    /// Base URL of the Gemini API
    pub api_base_url: String,

    /// The Google AI API key. May be empty here - absence only surfaces as an
    /// error on the first model call, there is no pre-flight key validation.
    pub api_key: String,

    /// Temperature for the planning call (0.0 = deterministic)
    pub planner_temperature: f32,

    /// Temperature for the final summary call (a bit of creativity is fine)
    pub summary_temperature: f32,

    /// Maximum number of web search results to include per lookup
    pub max_search_results: usize,
}

// =============================================================================
// DEFAULT IMPLEMENTATION
// =============================================================================
/// # Rust Concept: The Default Trait
///
/// The Default trait provides a way to create a "default" value for a type.
/// This is useful when you want sensible defaults that can be overridden.
///
/// We implement it manually here to show the pattern, but you can also
/// derive it with #[derive(Default)] for simple cases.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Flash model since it's fast and cheap
            model: "gemini-flash-latest".to_string(),

            // Public Google AI endpoint
            api_base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),

            // No key by default - must come from the environment
            api_key: String::new(),

            // Planning should be deterministic
            planner_temperature: 0.0,

            // Summaries can be a little looser
            summary_temperature: 0.7,

            // Include top 5 web results per lookup by default
            max_search_results: 5,
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Rust Concept: Result Type
    ///
    /// Result<T, E> is Rust's way of handling operations that can fail.
    /// - Ok(value) indicates success with a value
    /// - Err(error) indicates failure with an error
    ///
    /// We use `anyhow::Result<T>` which is shorthand for `Result<T, anyhow::Error>`.
    /// anyhow::Error can hold any error type, making it great for applications.
    ///
    /// # Example
    /// ```
    /// let config = Config::from_env()?;
    /// println!("Using model: {}", config.model);
    /// ```
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (silently ignore if not found)
        // This is useful for local development
        let _ = dotenvy::dotenv();

        // Start with default values
        let mut config = Config::default();

        // Override with environment variables if set
        //
        // # Rust Concept: if let
        // `if let` is a concise way to handle a single pattern match.
        // It's equivalent to a full match with an empty Err arm.
        if let Ok(val) = env::var("GEMINI_MODEL") {
            config.model = val;
        }

        if let Ok(val) = env::var("GEMINI_API_BASE_URL") {
            config.api_base_url = val;
        }

        if let Ok(val) = env::var("GOOGLE_API_KEY") {
            config.api_key = val;
        }

        // Parse temperatures from string to f32
        // .context() adds helpful error messages when things fail
        if let Ok(val) = env::var("PLANNER_TEMPERATURE") {
            config.planner_temperature = val
                .parse()
                .context("PLANNER_TEMPERATURE must be a valid floating-point number (e.g., 0.0)")?;
        }

        if let Ok(val) = env::var("SUMMARY_TEMPERATURE") {
            config.summary_temperature = val
                .parse()
                .context("SUMMARY_TEMPERATURE must be a valid floating-point number (e.g., 0.7)")?;
        }

        if let Ok(val) = env::var("MAX_SEARCH_RESULTS") {
            config.max_search_results = val
                .parse()
                .context("MAX_SEARCH_RESULTS must be a valid positive integer")?;
        }

        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// This ensures all values are within acceptable ranges before the agent starts.
    /// It's better to fail fast with a clear error than to fail later with a confusing one!
    ///
    /// Note: the API key is deliberately NOT validated here. A missing or bad
    /// key surfaces as a model error on the first planner call instead.
    pub fn validate(&self) -> Result<()> {
        // Temperature must be between 0 and 2 (Gemini accepts this range)
        for (name, temp) in [
            ("PLANNER_TEMPERATURE", self.planner_temperature),
            ("SUMMARY_TEMPERATURE", self.summary_temperature),
        ] {
            if !(0.0..=2.0).contains(&temp) {
                anyhow::bail!("{} must be between 0.0 and 2.0, got: {}", name, temp);
            }
        }

        // Must have at least 1 search result
        if self.max_search_results == 0 {
            anyhow::bail!("MAX_SEARCH_RESULTS must be at least 1");
        }

        // Model name can't be empty
        if self.model.is_empty() {
            anyhow::bail!("GEMINI_MODEL cannot be empty");
        }

        Ok(())
    }
}
