use std::sync::Arc;

use trends_core::settings::Settings;
use trends_runtime::enhancer::{InsightEnhancer, OpenAiEnhancer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map an upper-case level name (`WARNING`, `CRITICAL`, ...) to a `tracing`
/// filter directive.
///
/// Unrecognised names are passed through unchanged so that full
/// `EnvFilter` directives such as `"trends_data=debug"` also work.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber on stderr.
///
/// Stdout is reserved for the report or JSON output. Falls back to
/// `"info"` if the level string is not a valid filter.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()?;

    Ok(())
}

// ── Enhancer bootstrap ─────────────────────────────────────────────────────────

/// Build the insight enhancer requested by `--enhance`, if any.
///
/// A missing or malformed API key only disables enhancement: the analysis
/// still runs with the standard insights.
pub fn build_enhancer(settings: &Settings) -> Option<Arc<dyn InsightEnhancer>> {
    let key = match settings.enhancement_key() {
        Ok(Some(key)) => key,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(error = %e, "Insight enhancement disabled");
            return None;
        }
    };
    match OpenAiEnhancer::new(key, settings.model.as_str()) {
        Ok(enhancer) => {
            tracing::debug!("Insight enhancement enabled with model {}", enhancer.model());
            let enhancer: Arc<dyn InsightEnhancer> = Arc::new(enhancer);
            Some(enhancer)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Insight enhancement disabled");
            None
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
