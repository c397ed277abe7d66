use std::path::PathBuf;
use thiserror::Error;

/// All errors that abort a seasonality analysis run.
///
/// Row-level problems (bad dates, short rows) never surface here; the parser
/// skips them. Every variant renders as a single message suitable for
/// showing to the person who uploaded the file.
#[derive(Error, Debug)]
pub enum SeasonalityError {
    /// The upload is neither named `*.csv` nor typed `text/csv`.
    #[error("Please upload a CSV file (got {0})")]
    InvalidFileType(String),

    /// The upload exceeds the configured size ceiling.
    #[error("File size must be less than {}MB (file is {size} bytes)", .limit / (1024 * 1024))]
    FileTooLarge { size: u64, limit: u64 },

    /// Tokenization produced zero rows.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No row looked like a header with a date-like column.
    #[error("Could not find header row with date column in CSV file")]
    HeaderNotFound,

    /// The header row has no date-like cell.
    #[error("Could not find date column in CSV file")]
    DateColumnNotFound,

    /// The header row has no usable value cell.
    #[error("Could not find value column in CSV file")]
    ValueColumnNotFound,

    /// Header and columns were found but every data row was rejected.
    #[error("No valid data points found in the CSV file. Please check the file format.")]
    NoValidData,

    /// An operation needed a loaded analysis and none was present.
    #[error("No analysis loaded")]
    NoAnalysis,

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV tokenizer rejected the input.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be produced.
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the trends crates.
pub type Result<T> = std::result::Result<T, SeasonalityError>;
