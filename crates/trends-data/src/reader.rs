//! Upload validation and CSV tokenization.
//!
//! Checks that an uploaded file looks like a CSV export within the size
//! ceiling, then splits its bytes into [`RawRow`]s for the parser.

use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;
use trends_core::models::RawRow;
use trends_core::{Result, SeasonalityError};

/// Default upload ceiling: 10 MB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

const CSV_CONTENT_TYPE: &str = "text/csv";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ── Upload ────────────────────────────────────────────────────────────────────

/// An uploaded file as received from the caller.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Original file name, used for type checks and the keyword fallback.
    pub file_name: String,
    /// MIME type, when the transport supplied one.
    pub content_type: Option<String>,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    /// Attach a MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// `true` when either the MIME type or the extension says CSV.
    pub fn is_csv(&self) -> bool {
        let typed_csv = self
            .content_type
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case(CSV_CONTENT_TYPE))
            .unwrap_or(false);
        typed_csv || self.file_name.to_lowercase().ends_with(".csv")
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Reject uploads that are not CSV or exceed `max_bytes`.
pub fn validate_upload(upload: &Upload, max_bytes: u64) -> Result<()> {
    if !upload.is_csv() {
        return Err(SeasonalityError::InvalidFileType(upload.file_name.clone()));
    }
    check_size(upload.bytes.len() as u64, max_bytes)
}

/// Read a file from disk as an [`Upload`].
///
/// The size is taken from filesystem metadata first so oversized files are
/// rejected without reading them.
pub fn read_upload(path: &Path, max_bytes: u64) -> Result<Upload> {
    let metadata = std::fs::metadata(path).map_err(|source| SeasonalityError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    check_size(metadata.len(), max_bytes)?;

    let bytes = std::fs::read(path).map_err(|source| SeasonalityError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let upload = Upload::new(file_name_of(path), bytes);
    validate_upload(&upload, max_bytes)?;
    Ok(upload)
}

/// Fail with [`SeasonalityError::FileTooLarge`] when `size > max_bytes`.
pub fn check_size(size: u64, max_bytes: u64) -> Result<()> {
    if size > max_bytes {
        return Err(SeasonalityError::FileTooLarge {
            size,
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Final path component as a string, or an empty string.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Split CSV bytes into rows of string cells.
///
/// Comma-delimited with double-quote escaping; records may have differing
/// lengths. A leading UTF-8 BOM is dropped, invalid UTF-8 is replaced
/// lossily, and empty lines are skipped.
pub fn tokenize(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows: Vec<RawRow> = Vec::new();
    for record in rdr.byte_records() {
        let record = record?;
        if is_blank_record(&record) {
            continue;
        }
        rows.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }

    debug!("Tokenized {} rows from {} bytes", rows.len(), bytes.len());
    Ok(rows)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// A record with no fields, or a single empty field, is an empty line.
fn is_blank_record(record: &csv::ByteRecord) -> bool {
    record.is_empty() || (record.len() == 1 && record[0].is_empty())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
