//! Google Trends CSV ingestion.
//!
//! Exports are loosely structured: an optional preamble with the search term
//! and region embedded in a free-text cell, a header row at an unknown
//! position, weekly ranges or monthly labels for dates, and values that may
//! be percent-suffixed or the literal `<1`. Parsing discovers the schema in
//! three explicit stages:
//!
//! 1. [`RowTable`] scans for the header row.
//! 2. [`HeaderLocated`] resolves the date and value columns.
//! 3. [`ColumnsResolved`] converts every following row, skipping bad rows.
//!
//! Only structural failures abort; individual rows are dropped silently.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};
use trends_core::dates::DateParser;
use trends_core::models::{ParsedSeries, RawRow, SeriesMetadata, TimeSeriesPoint, UNKNOWN_COUNTRY};
use trends_core::{Result, SeasonalityError};

use crate::reader::tokenize;

/// Number of leading rows searched for the keyword/region cell.
pub const METADATA_SCAN_ROWS: usize = 5;

/// Value assigned to the `<1` sentinel.
pub const BELOW_ONE_VALUE: f64 = 0.5;

const BELOW_ONE_SENTINEL: &str = "<1";

fn region_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([^)]+)\)").expect("regex is valid"))
}

fn float_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("regex is valid")
    })
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse a Google Trends CSV export into a sorted series plus metadata.
///
/// `file_name` is only used as the keyword fallback when the file carries
/// no recognisable keyword cell.
pub fn parse_trends_csv(bytes: &[u8], file_name: &str) -> Result<ParsedSeries> {
    let rows = tokenize(bytes)?;
    if rows.is_empty() {
        return Err(SeasonalityError::EmptyFile);
    }

    let metadata = extract_metadata(&rows, file_name);
    let points = RowTable::new(&rows)
        .locate_header()?
        .resolve_columns()?
        .convert()?;

    info!(
        "Parsed {} points for \"{}\" ({})",
        points.len(),
        metadata.keyword,
        metadata.country
    );

    Ok(ParsedSeries { points, metadata })
}

/// Best-effort keyword/region extraction from the first rows.
///
/// Falls back to the file stem (underscores and hyphens become spaces) and
/// [`UNKNOWN_COUNTRY`].
pub fn extract_metadata(rows: &[RawRow], file_name: &str) -> SeriesMetadata {
    for row in rows.iter().take(METADATA_SCAN_ROWS) {
        for cell in row {
            if let Some(metadata) = match_metadata_cell(cell) {
                debug!("Metadata found in cell \"{}\"", cell.trim());
                return metadata;
            }
        }
    }
    SeriesMetadata::new(keyword_from_file_name(file_name), UNKNOWN_COUNTRY)
}

/// `true` for header cells that name a date column.
pub fn is_date_label(cell: &str) -> bool {
    let lower = cell.trim().to_lowercase();
    lower.contains("week") || lower.contains("month") || lower.contains("date") || lower == "day"
}

/// Convert an interest cell to a number.
///
/// `"45%"` → 45, `"<1"` → 0.5, anything unparseable → 0.
pub fn parse_interest_value(cell: &str) -> f64 {
    let cell = cell.trim();
    if cell.contains('%') {
        parse_float_prefix(&cell.replacen('%', "", 1)).unwrap_or(0.0)
    } else if cell == BELOW_ONE_SENTINEL {
        BELOW_ONE_VALUE
    } else {
        parse_float_prefix(cell).unwrap_or(0.0)
    }
}

// ── Stage 1: scanning for the header ──────────────────────────────────────────

/// All tokenized rows, before the header is known.
#[derive(Debug, Clone, Copy)]
pub struct RowTable<'a> {
    rows: &'a [RawRow],
}

impl<'a> RowTable<'a> {
    pub fn new(rows: &'a [RawRow]) -> Self {
        Self { rows }
    }

    /// Find the first row with at least two cells, one of which is a date
    /// label. Everything before it is preamble.
    pub fn locate_header(self) -> Result<HeaderLocated<'a>> {
        let header_index = self
            .rows
            .iter()
            .position(|row| row.len() >= 2 && row.iter().any(|cell| is_date_label(cell)))
            .ok_or(SeasonalityError::HeaderNotFound)?;

        debug!("Header found at row {}", header_index);
        Ok(HeaderLocated {
            rows: self.rows,
            header_index,
        })
    }
}

// ── Stage 2: resolving columns ────────────────────────────────────────────────

/// The header row is known; columns are not yet resolved.
#[derive(Debug, Clone, Copy)]
pub struct HeaderLocated<'a> {
    rows: &'a [RawRow],
    header_index: usize,
}

/// Positions of the two columns the parser reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub date_index: usize,
    pub value_index: usize,
}

impl ColumnLayout {
    /// Minimum row length that contains both columns.
    pub fn required_len(&self) -> usize {
        self.date_index.max(self.value_index) + 1
    }
}

impl<'a> HeaderLocated<'a> {
    pub fn header_index(&self) -> usize {
        self.header_index
    }

    pub fn header(&self) -> &'a RawRow {
        &self.rows[self.header_index]
    }

    /// Date column: first date-label cell. Value column: first other
    /// non-empty cell that is not a date label.
    pub fn resolve_columns(self) -> Result<ColumnsResolved<'a>> {
        let header = self.header();

        let date_index = header
            .iter()
            .position(|cell| is_date_label(cell))
            .ok_or(SeasonalityError::DateColumnNotFound)?;

        let value_index = header
            .iter()
            .enumerate()
            .position(|(i, cell)| i != date_index && !is_date_label(cell) && !cell.trim().is_empty())
            .ok_or(SeasonalityError::ValueColumnNotFound)?;

        let layout = ColumnLayout {
            date_index,
            value_index,
        };
        debug!(
            "Columns resolved: date=\"{}\" value=\"{}\"",
            header[date_index].trim(),
            header[value_index].trim()
        );

        Ok(ColumnsResolved {
            rows: self.rows,
            header_index: self.header_index,
            layout,
        })
    }
}

// ── Stage 3: converting rows ──────────────────────────────────────────────────

/// Header and columns are known; the data rows can be converted.
#[derive(Debug, Clone, Copy)]
pub struct ColumnsResolved<'a> {
    rows: &'a [RawRow],
    header_index: usize,
    layout: ColumnLayout,
}

impl<'a> ColumnsResolved<'a> {
    pub fn layout(&self) -> ColumnLayout {
        self.layout
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &'a [RawRow] {
        &self.rows[self.header_index + 1..]
    }

    /// Convert every data row, drop the ones that fail, and sort by date.
    pub fn convert(self) -> Result<Vec<TimeSeriesPoint>> {
        let data_rows = self.data_rows();
        let mut points: Vec<TimeSeriesPoint> = Vec::with_capacity(data_rows.len());
        let mut skipped = 0usize;

        for (offset, row) in data_rows.iter().enumerate() {
            match self.convert_row(row) {
                Some(point) => points.push(point),
                None => {
                    skipped += 1;
                    debug!(
                        "Skipping row {}: {:?}",
                        self.header_index + 1 + offset,
                        row
                    );
                }
            }
        }

        debug!(
            "Converted {} rows, skipped {}",
            points.len(),
            skipped
        );

        if points.is_empty() {
            return Err(SeasonalityError::NoValidData);
        }

        points.sort_by_key(|p| p.date());
        Ok(points)
    }

    fn convert_row(&self, row: &RawRow) -> Option<TimeSeriesPoint> {
        if row.len() < self.layout.required_len() {
            return None;
        }

        let date_cell = row[self.layout.date_index].trim();
        let value_cell = row[self.layout.value_index].trim();
        if date_cell.is_empty() || value_cell.is_empty() {
            return None;
        }

        let date = DateParser::parse_cell(date_cell)?;
        Some(TimeSeriesPoint::new(date, parse_interest_value(value_cell)))
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Match `"<term>: (<region>)"` or `"<term> (<region>)"`.
fn match_metadata_cell(cell: &str) -> Option<SeriesMetadata> {
    let cell = cell.trim();
    if !(cell.contains('(') && cell.contains(')')) {
        return None;
    }
    let region = region_re()
        .captures(cell)
        .map(|caps| caps[1].trim().to_string())?;

    if cell.contains(':') {
        let term = cell.split(':').next().unwrap_or_default().trim();
        if is_keyword_term(term) {
            return Some(SeriesMetadata::new(term, region));
        }
    }

    let len = cell.chars().count();
    if len > 5 && len < 100 {
        let term = cell.split('(').next().unwrap_or_default().trim();
        if is_keyword_term(term) {
            return Some(SeriesMetadata::new(term, region));
        }
    }

    None
}

/// Non-empty, non-numeric, not a percentage, not a date label word.
fn is_keyword_term(term: &str) -> bool {
    if term.is_empty() || term.contains('%') {
        return false;
    }
    let lower = term.to_lowercase();
    if lower.contains("week") || lower.contains("month") || lower.contains("date") {
        return false;
    }
    !matches!(term.parse::<f64>(), Ok(n) if !n.is_nan())
}

fn keyword_from_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.replace(['_', '-'], " ")
}

/// Parse the longest leading decimal number, ignoring trailing text.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let m = float_prefix_re().find(s.trim_start())?;
    m.as_str().parse::<f64>().ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rows(lines: &[&[&str]]) -> Vec<RawRow> {
        lines
            .iter()
            .map(|cells| cells.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── parse_interest_value ──────────────────────────────────────────────────

    #[test]
    fn test_value_below_one_sentinel() {
        assert_eq!(parse_interest_value("<1"), 0.5);
    }

    #[test]
    fn test_value_percentage() {
        assert_eq!(parse_interest_value("45%"), 45.0);
        assert_eq!(parse_interest_value("12.5%"), 12.5);
    }

    #[test]
    fn test_value_plain_numbers() {
        assert_eq!(parse_interest_value("100"), 100.0);
        assert_eq!(parse_interest_value(" 7 "), 7.0);
        assert_eq!(parse_interest_value(".5"), 0.5);
    }

    #[test]
    fn test_value_unparseable_defaults_to_zero() {
        assert_eq!(parse_interest_value("n/a"), 0.0);
        assert_eq!(parse_interest_value("%"), 0.0);
        assert_eq!(parse_interest_value("<5"), 0.0);
    }

    #[test]
    fn test_value_numeric_prefix() {
        assert_eq!(parse_interest_value("42 (partial)"), 42.0);
        assert_eq!(parse_interest_value("1e2"), 100.0);
    }

    // ── is_date_label ─────────────────────────────────────────────────────────

    #[test]
    fn test_is_date_label() {
        assert!(is_date_label("Week"));
        assert!(is_date_label(" Month "));
        assert!(is_date_label("Start date"));
        assert!(is_date_label("Day"));
        assert!(!is_date_label("Days"));
        assert!(!is_date_label("coffee: (United States)"));
        assert!(!is_date_label(""));
    }

    // ── extract_metadata ──────────────────────────────────────────────────────

    #[test]
    fn test_metadata_colon_form() {
        let table = rows(&[&["Category: All categories"], &["Week", "coffee: (United States)"]]);
        let meta = extract_metadata(&table, "whatever.csv");
        assert_eq!(meta.keyword, "coffee");
        assert_eq!(meta.country, "United States");
    }

    #[test]
    fn test_metadata_paren_form() {
        let table = rows(&[&["Month", "yahoo (Worldwide)"]]);
        let meta = extract_metadata(&table, "x.csv");
        assert_eq!(meta.keyword, "yahoo");
        assert_eq!(meta.country, "Worldwide");
    }

    #[test]
    fn test_metadata_skips_date_words_and_numbers() {
        let table = rows(&[
            &["Week (local)", "2023 (partial)", "45% (approx)"],
            &["Month: (x)"],
        ]);
        let meta = extract_metadata(&table, "coffee_beans-trend.csv");
        assert_eq!(meta.keyword, "coffee beans trend");
        assert_eq!(meta.country, UNKNOWN_COUNTRY);
    }

    #[test]
    fn test_metadata_only_scans_first_five_rows() {
        let table = rows(&[
            &["a"],
            &["b"],
            &["c"],
            &["d"],
            &["e"],
            &["tea: (Japan)"],
        ]);
        let meta = extract_metadata(&table, "fallback.csv");
        assert_eq!(meta.keyword, "fallback");
        assert_eq!(meta.country, UNKNOWN_COUNTRY);
    }

    #[test]
    fn test_metadata_paren_form_length_bounds() {
        // "a (b)" is exactly 5 characters: too short for the bare form.
        let table = rows(&[&["a (b)"]]);
        let meta = extract_metadata(&table, "short.csv");
        assert_eq!(meta.keyword, "short");
    }

    #[test]
    fn test_metadata_requires_region_content() {
        let table = rows(&[&["coffee: ()"]]);
        let meta = extract_metadata(&table, "empty_region.csv");
        assert_eq!(meta.keyword, "empty region");
        assert_eq!(meta.country, UNKNOWN_COUNTRY);
    }

    // ── Stage 1: locate_header ────────────────────────────────────────────────

    #[test]
    fn test_locate_header_after_preamble() {
        let table = rows(&[
            &["Category: All categories"],
            &["Week", "coffee: (United States)"],
            &["2023-01-01", "50"],
        ]);
        let located = RowTable::new(&table).locate_header().unwrap();
        assert_eq!(located.header_index(), 1);
        assert_eq!(located.header()[0], "Week");
    }

    #[test]
    fn test_locate_header_requires_two_cells() {
        let table = rows(&[&["Week"], &["2023-01-01"]]);
        let err = RowTable::new(&table).locate_header().unwrap_err();
        assert!(matches!(err, SeasonalityError::HeaderNotFound));
    }

    #[test]
    fn test_locate_header_none_found() {
        let table = rows(&[&["a", "b"], &["1", "2"]]);
        let err = RowTable::new(&table).locate_header().unwrap_err();
        assert!(matches!(err, SeasonalityError::HeaderNotFound));
    }

    // ── Stage 2: resolve_columns ──────────────────────────────────────────────

    #[test]
    fn test_resolve_columns_date_then_value() {
        let table = rows(&[&["Week", "coffee: (United States)"]]);
        let resolved = RowTable::new(&table)
            .locate_header()
            .unwrap()
            .resolve_columns()
            .unwrap();
        assert_eq!(
            resolved.layout(),
            ColumnLayout {
                date_index: 0,
                value_index: 1
            }
        );
    }

    #[test]
    fn test_resolve_columns_value_before_date_skips_blank() {
        let table = rows(&[&["", "interest", "Date"]]);
        let resolved = RowTable::new(&table)
            .locate_header()
            .unwrap()
            .resolve_columns()
            .unwrap();
        assert_eq!(resolved.layout().date_index, 2);
        assert_eq!(resolved.layout().value_index, 1);
        assert_eq!(resolved.layout().required_len(), 3);
    }

    #[test]
    fn test_resolve_columns_missing_value_column() {
        let table = rows(&[&["Week", "Month", " "]]);
        let err = RowTable::new(&table)
            .locate_header()
            .unwrap()
            .resolve_columns()
            .unwrap_err();
        assert!(matches!(err, SeasonalityError::ValueColumnNotFound));
    }

    // ── Stage 3: convert ──────────────────────────────────────────────────────

    #[test]
    fn test_convert_skips_bad_rows_and_sorts() {
        let table = rows(&[
            &["Week", "coffee"],
            &["2023-01-15", "30"],
            &["not-a-date", "99"],
            &["2023-01-01"],
            &["", "10"],
            &["2023-01-08", ""],
            &["2023-01-08", "<1"],
        ]);
        let points = RowTable::new(&table)
            .locate_header()
            .unwrap()
            .resolve_columns()
            .unwrap()
            .convert()
            .unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date(), ymd(2023, 1, 8));
        assert_eq!(points[0].value(), 0.5);
        assert_eq!(points[1].date(), ymd(2023, 1, 15));
        assert_eq!(points[1].value(), 30.0);
    }

    #[test]
    fn test_convert_header_without_data_rows() {
        let table = rows(&[&["Week", "coffee"]]);
        let err = RowTable::new(&table)
            .locate_header()
            .unwrap()
            .resolve_columns()
            .unwrap()
            .convert()
            .unwrap_err();
        assert!(matches!(err, SeasonalityError::NoValidData));
    }

    // ── parse_trends_csv ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_google_trends_weekly_export() {
        let csv = "Category: All categories\n\
                   \n\
                   Week,coffee: (United States)\n\
                   2023-01-08,75\n\
                   2023-01-01,80\n\
                   2023-01-15,<1\n";
        let parsed = parse_trends_csv(csv.as_bytes(), "multiTimeline.csv").unwrap();

        assert_eq!(parsed.metadata.keyword, "coffee");
        assert_eq!(parsed.metadata.country, "United States");
        assert_eq!(parsed.points.len(), 3);
        assert_eq!(parsed.points[0].date_string(), "2023-01-01");
        assert_eq!(parsed.points[2].date_string(), "2023-01-15");
        assert_eq!(parsed.points[2].value(), 0.5);
    }

    #[test]
    fn test_parse_monthly_export_with_week_ranges_and_percentages() {
        let csv = "Month,tea\n\
                   2022-12-01 - 2022-12-31,45%\n\
                   2022-11,40%\n";
        let parsed = parse_trends_csv(csv.as_bytes(), "green_tea.csv").unwrap();

        assert_eq!(parsed.metadata.keyword, "green tea");
        assert_eq!(parsed.metadata.country, UNKNOWN_COUNTRY);
        assert_eq!(parsed.points[0].date(), ymd(2022, 11, 1));
        assert_eq!(parsed.points[0].value(), 40.0);
        assert_eq!(parsed.points[1].date(), ymd(2022, 12, 1));
        assert_eq!(parsed.points[1].value(), 45.0);
    }

    #[test]
    fn test_parse_slash_dates() {
        let csv = "Day,interest\n1/15/2023,10\n1/16/2023,20\n";
        let parsed = parse_trends_csv(csv.as_bytes(), "daily.csv").unwrap();
        assert_eq!(parsed.points.len(), 2);
        assert_eq!(parsed.points[1].date(), ymd(2023, 1, 16));
    }

    #[test]
    fn test_parse_month_name_labels() {
        let csv = "Month,coffee\n\
                   January 2021,10\n\
                   Feb 2021,20\n\
                   12/1/20,5\n";
        let parsed = parse_trends_csv(csv.as_bytes(), "coffee.csv").unwrap();

        assert_eq!(parsed.points.len(), 3);
        assert_eq!(parsed.points[0].date(), ymd(2020, 12, 1));
        assert_eq!(parsed.points[1].date(), ymd(2021, 1, 1));
        assert_eq!(parsed.points[1].year(), 2021);
        assert_eq!(parsed.points[2].date(), ymd(2021, 2, 1));
    }

    #[test]
    fn test_parse_empty_file() {
        let err = parse_trends_csv(b"\n\n", "empty.csv").unwrap_err();
        assert!(matches!(err, SeasonalityError::EmptyFile));
    }

    #[test]
    fn test_parse_header_with_zero_data_rows() {
        let err = parse_trends_csv(b"Week,coffee\n", "coffee.csv").unwrap_err();
        assert!(matches!(err, SeasonalityError::NoValidData));
    }

    #[test]
    fn test_parse_no_header() {
        let err = parse_trends_csv(b"a,b\n1,2\n", "x.csv").unwrap_err();
        assert!(matches!(err, SeasonalityError::HeaderNotFound));
    }

    #[test]
    fn test_parse_keeps_calendar_fields_consistent() {
        let csv = "Week,x\n2021-05-30,1\n2021-10-03,2\n";
        let parsed = parse_trends_csv(csv.as_bytes(), "x.csv").unwrap();
        for p in &parsed.points {
            assert_eq!(p.month(), chrono::Datelike::month(&p.date()));
            assert_eq!(p.quarter(), (p.month() - 1) / 3 + 1);
            assert_eq!(p.year(), chrono::Datelike::year(&p.date()));
        }
    }
}
