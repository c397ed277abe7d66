//! End-to-end pipeline: validate, parse, aggregate.
//!
//! Returns an [`AnalysisResult`] ready for rendering or export.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};
use trends_core::models::AnalysisResult;
use trends_core::Result;

use crate::aggregator::analyze_seasonality;
use crate::parser::parse_trends_csv;
use crate::reader::{read_upload, validate_upload, Upload};

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full analysis over an in-memory upload.
///
/// 1. Reject non-CSV or oversized uploads.
/// 2. Parse the export into a sorted series plus metadata.
/// 3. Aggregate buckets and synthesise template insights.
pub fn analyze_upload(upload: &Upload, max_bytes: u64) -> Result<AnalysisResult> {
    // ── Step 1: Validate ──────────────────────────────────────────────────────
    validate_upload(upload, max_bytes)?;

    // ── Step 2: Parse ─────────────────────────────────────────────────────────
    let parse_start = Instant::now();
    let parsed = parse_trends_csv(&upload.bytes, &upload.file_name)?;
    let parse_time = parse_start.elapsed().as_secs_f64();

    // ── Step 3: Aggregate ─────────────────────────────────────────────────────
    let aggregate_start = Instant::now();
    let result = analyze_seasonality(&parsed.points, &parsed.metadata)?;
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    debug!(
        "Timings for {}: parse {:.4}s, aggregate {:.4}s",
        upload.file_name, parse_time, aggregate_time
    );
    info!(
        "Analysed \"{}\": {} points from {} to {}",
        result.keyword, result.total_data_points, result.date_range.start, result.date_range.end
    );

    Ok(result)
}

/// Read `path` from disk and run [`analyze_upload`] on it.
pub fn analyze_file(path: &Path, max_bytes: u64) -> Result<AnalysisResult> {
    let upload = read_upload(path, max_bytes)?;
    analyze_upload(&upload, max_bytes)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
