use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use tracing::debug;

/// Separator Google Trends uses for weekly ranges, e.g.
/// `"2023-01-01 - 2023-01-07"`.
pub const WEEK_RANGE_SEPARATOR: &str = " - ";

fn strict_iso_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("regex is valid"))
}

fn year_month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})[-/](\d{1,2})$").expect("regex is valid"))
}

fn year_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}$").expect("regex is valid"))
}

// ── DateParser ────────────────────────────────────────────────────────────────

/// Parses the date labels found in Google Trends exports.
///
/// Exports label rows with plain days (`2023-01-01`), week ranges
/// (`2023-01-01 - 2023-01-07`), months (`2004-01`) or locale-formatted
/// dates (`1/15/2023`). All results are calendar dates with no time-of-day.
pub struct DateParser;

impl DateParser {
    /// Parse a date cell from a data row.
    ///
    /// Cells containing a hyphen are treated as a possible week range: the
    /// text before the first `" - "` is parsed, exactly when it is a strict
    /// `YYYY-MM-DD`, otherwise with [`DateParser::parse_general`]. All other
    /// cells go straight to the general parser.
    pub fn parse_cell(cell: &str) -> Option<NaiveDate> {
        let cell = cell.trim();
        if cell.contains('-') {
            let first = cell
                .split(WEEK_RANGE_SEPARATOR)
                .next()
                .unwrap_or(cell)
                .trim();
            if strict_iso_re().is_match(first) {
                return NaiveDate::parse_from_str(first, "%Y-%m-%d").ok();
            }
            return Self::parse_general(first);
        }
        Self::parse_general(cell)
    }

    /// Lenient date parse over the formats seen in real exports.
    pub fn parse_general(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        // Replace trailing 'Z' with '+00:00' for RFC 3339 compatibility.
        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.date_naive());
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return Some(dt.date_naive());
        }

        const DATETIME_FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%m/%d/%Y %H:%M:%S",
            "%m/%d/%Y %H:%M",
        ];
        for fmt in DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                if let Some(date) = full_year(naive.date()) {
                    return Some(date);
                }
            }
        }

        // "January 2020" / "Jan 2020": pin to the first of the month. Must run
        // before "%B %d %Y", which would read "August 2018" as day 20, year 18.
        let with_day = format!("1 {}", s);
        for fmt in ["%d %B %Y", "%d %b %Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(&with_day, fmt) {
                if let Some(date) = full_year(date) {
                    return Some(date);
                }
            }
        }

        const DATE_FORMATS: &[&str] = &[
            "%Y-%m-%d",
            "%Y/%m/%d",
            "%m/%d/%Y",
            "%m/%d/%y",
            "%B %d, %Y",
            "%b %d, %Y",
            "%B %d %Y",
            "%d %B %Y",
            "%d %b %Y",
            "%a %b %d %Y",
        ];
        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                if let Some(date) = full_year(date) {
                    return Some(date);
                }
            }
        }

        if let Some(caps) = year_month_re().captures(s) {
            let year: i32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, 1);
        }

        if year_only_re().is_match(s) {
            let year: i32 = s.parse().ok()?;
            return NaiveDate::from_ymd_opt(year, 1, 1);
        }

        debug!("DateParser: could not parse date \"{}\"", s);
        None
    }
}

/// chrono's `%Y` also accepts one or two digits, so "1/15/23" would otherwise
/// land in year 23. Labels in exports always carry four-digit years.
fn full_year(date: NaiveDate) -> Option<NaiveDate> {
    (date.year() >= 1000).then_some(date)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
