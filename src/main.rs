//! # Research Scout
//!
//! A multi-step research agent CLI.
//!
//! This application demonstrates:
//! - A plan -> research -> summarize workflow as an explicit state machine
//! - Gemini for planning and summarization
//! - Web search (DuckDuckGo) and encyclopedia (Wikipedia) lookups
//! - CLI design with clap
//! - Structured logging with tracing
//! - Error handling best practices
//!
//! ## Quick Start
//! ```bash
//! GOOGLE_API_KEY=... cargo run -- "What are the latest developments in Rust?"
//! ```

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================
// Rust requires explicit module declarations. Each `mod` statement tells
// the compiler to look for a file (or directory) with that name.

/// Configuration management
mod config;

/// Language-model collaborator (Gemini)
mod llm;

/// Search backends and the tool router
mod tools;

/// The plan/research/summarize state machine
mod workflow;

// =============================================================================
// IMPORTS
// =============================================================================
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::llm::GeminiClient;
use crate::tools::ToolRouter;
use crate::workflow::Orchestrator;

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
/// # Rust Concept: Derive Macros with Clap
///
/// Clap's derive feature lets us define CLI arguments as a struct.
/// The macros automatically generate argument parsing code.
///
/// - #[command(...)]: Configures the overall program
/// - #[arg(...)]: Configures individual arguments
#[derive(Parser, Debug)]
#[command(
    name = "research-scout",
    author = "Your Name",
    version = "0.1.0",
    about = "A research assistant that plans queries, searches the web, and summarizes findings",
    long_about = r#"
Research Scout - a small multi-step research agent.

Given a topic it will:
  1. Ask Gemini to plan a handful of search queries
  2. Run each query against web search or an encyclopedia lookup
  3. Synthesize the collected findings into a short answer

PREREQUISITES:
  Set GOOGLE_API_KEY in the environment (or a .env file).

EXAMPLES:
  # Basic research run
  research-scout "What are the latest developments in Rust async?"

  # No topic: you will be prompted on stdin
  research-scout

  # Use a specific model
  research-scout --model gemini-flash-latest "Machine learning in Rust"
"#
)]
struct Args {
    /// The research topic or question to investigate.
    /// If omitted, the topic is read interactively from stdin.
    #[arg(help = "The topic to research", value_name = "TOPIC")]
    topic: Option<String>,

    /// The Gemini model to use (overrides GEMINI_MODEL env var)
    #[arg(
        short = 'm',
        long = "model",
        help = "Gemini model to use",
        env = "GEMINI_MODEL"
    )]
    model: Option<String>,

    /// Verbose output (debug logging)
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Enable verbose/debug logging",
        default_value = "false"
    )]
    verbose: bool,
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
/// # Rust Concept: The #[tokio::main] Attribute
///
/// Rust's main() function is synchronous by default.
/// #[tokio::main] transforms it into an async function by creating a Tokio
/// runtime and running our async main inside it.
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    // Clap handles --help, --version, and error messages automatically
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose)?;

    info!("Research Scout starting up...");

    // Load configuration from environment/.env file
    let mut config = Config::from_env()?;

    // Override model if specified on command line
    if let Some(model) = args.model {
        info!(model = %model, "Using model from command line");
        config.model = model;
    }

    // Validate configuration
    config.validate()?;

    info!(
        model = %config.model,
        max_results = config.max_search_results,
        "Configuration loaded"
    );

    // Resolve the topic: positional argument, or interactive prompt
    let topic = match args.topic {
        Some(topic) => topic,
        None => prompt_for_topic()?,
    };

    // Construct the collaborators once, up front, and hand them to the
    // orchestrator - no global tool instances anywhere.
    let model = GeminiClient::new(&config)?;
    let router = ToolRouter::with_default_backends(config.max_search_results)?;
    let orchestrator = Orchestrator::new(
        Box::new(model),
        router,
        config.planner_temperature,
        config.summary_temperature,
    );

    // Execute the run and handle the result
    match orchestrator.run(&topic).await {
        Ok(answer) => {
            println!("\n{}", "=".repeat(60));
            println!("RESEARCH RESULTS");
            println!("{}\n", "=".repeat(60));
            println!("{}", answer);
            println!("\n{}", "=".repeat(60));
        }
        Err(e) => {
            // Print a labeled, user-friendly error block instead of a panic
            error!(error = %e, "Research failed");

            eprintln!("\n{}", "=".repeat(60));
            eprintln!("RESEARCH FAILED");
            eprintln!("{}", "=".repeat(60));
            eprintln!("{:#}", anyhow::Error::from(e));
            eprintln!("{}", "=".repeat(60));

            // Return the error to set a non-zero exit code
            anyhow::bail!("research run aborted");
        }
    }

    info!("Research completed successfully");
    Ok(())
}

/// Read the topic from stdin when no positional argument was given.
fn prompt_for_topic() -> Result<String> {
    print!("Enter a topic: ");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read topic from stdin")?;

    let topic = line.trim().to_string();
    if topic.is_empty() {
        anyhow::bail!("No topic given");
    }

    Ok(topic)
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Initialize the tracing subscriber for structured logging.
///
/// # Rust Concept: Early Returns
///
/// The `?` operator returns early from the function if there's an error.
/// This is common in initialization code where failure should abort.
fn init_logging(verbose: bool) -> Result<()> {
    // Set log level based on verbose flag
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    // Build the subscriber
    //
    // # Rust Concept: Builder Pattern
    // Many Rust libraries use builders for configuration.
    // Each method modifies the builder and returns it for chaining.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true) // Show the module that logged
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    // Set as the global default
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

// =============================================================================
// CLI TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        // Test that CLI args parse correctly
        let args = Args::parse_from(["test", "What is Rust?"]);
        assert_eq!(args.topic, Some("What is Rust?".to_string()));
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_topic_is_optional() {
        // No topic on the command line means "prompt on stdin"
        let args = Args::parse_from(["test"]);
        assert_eq!(args.topic, None);
    }

    #[test]
    fn test_args_with_flags() {
        let args = Args::parse_from([
            "test",
            "--verbose",
            "--model",
            "gemini-flash-latest",
            "Test topic",
        ]);

        assert_eq!(args.topic, Some("Test topic".to_string()));
        assert!(args.verbose);
        assert_eq!(args.model, Some("gemini-flash-latest".to_string()));
    }
}
