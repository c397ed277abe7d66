use clap::Parser;
use std::path::PathBuf;

use crate::error::{Result, SeasonalityError};

/// Default model used for insight enhancement.
pub const DEFAULT_ENHANCEMENT_MODEL: &str = "gpt-3.5-turbo";

/// Default upload ceiling in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Seasonality breakdown for Google Trends CSV exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "trends-seasonality",
    about = "Seasonality breakdown for Google Trends CSV exports",
    version
)]
pub struct Settings {
    /// Google Trends CSV export to analyse
    pub file: PathBuf,

    /// Output format written to stdout
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Write the JSON export to this file or directory
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Rewrite the template insights with the enhancement service
    #[arg(long)]
    pub enhance: bool,

    /// API key for the enhancement service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used by the enhancement service
    #[arg(long, default_value = DEFAULT_ENHANCEMENT_MODEL)]
    pub model: String,

    /// Maximum accepted file size in megabytes (1-100)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..=100))]
    pub max_file_size_mb: u64,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments and resolve derived values.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] but accepts an explicit argument list,
    /// enabling unit-testing without spawning subprocesses.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::resolve(Settings::parse_from(args))
    }

    /// Apply the `--debug` override.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Upload ceiling in bytes.
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// `true` when JSON output was requested on stdout.
    pub fn wants_json(&self) -> bool {
        self.format == "json"
    }

    /// The API key to use for enhancement, validated.
    ///
    /// Returns `Ok(None)` when enhancement was not requested and a
    /// [`SeasonalityError::Config`] when it was requested without a usable key.
    pub fn enhancement_key(&self) -> Result<Option<&str>> {
        if !self.enhance {
            return Ok(None);
        }
        match self.api_key.as_deref() {
            Some(key) if is_valid_api_key(key) => Ok(Some(key)),
            Some(_) => Err(SeasonalityError::Config(
                "API key must start with 'sk-' and be longer than 20 characters".to_string(),
            )),
            None => Err(SeasonalityError::Config(
                "--enhance requires --api-key or OPENAI_API_KEY".to_string(),
            )),
        }
    }
}

/// Shape check for enhancement-service keys.
pub fn is_valid_api_key(key: &str) -> bool {
    key.starts_with("sk-") && key.len() > 20
}

// ── Tests ──────────────────────────────────────────────────────────────────────
