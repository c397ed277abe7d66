use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Country sentinel used when no region could be extracted from the file.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Full English month names, indexed by `month_number - 1`.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Quarter labels, indexed by `quarter_number - 1`.
pub const QUARTER_NAMES: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

/// One CSV record as ordered string cells. No schema is assumed.
pub type RawRow = Vec<String>;

/// Map a month number (1-12) to its English name.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get((month as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("Unknown")
}

/// Map a quarter number (1-4) to its `Q<n>` label.
pub fn quarter_name(quarter: u32) -> &'static str {
    QUARTER_NAMES
        .get((quarter as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("Q?")
}

// ── TimeSeriesPoint ───────────────────────────────────────────────────────────

/// A single normalized interest measurement.
///
/// The calendar fields are derived from `date` in [`TimeSeriesPoint::new`],
/// which is the only constructor, so they can never disagree with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    date: NaiveDate,
    value: f64,
    month: u32,
    quarter: u32,
    year: i32,
}

impl TimeSeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        let month = date.month();
        Self {
            date,
            value,
            month,
            quarter: (month - 1) / 3 + 1,
            year: date.year(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The date in `YYYY-MM-DD` form.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn quarter(&self) -> u32 {
        self.quarter
    }

    pub fn year(&self) -> i32 {
        self.year
    }
}

// ── SeriesMetadata ────────────────────────────────────────────────────────────

/// Subject term and region extracted from an export's preamble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesMetadata {
    /// The search term, free text.
    pub keyword: String,
    /// The region, or [`UNKNOWN_COUNTRY`].
    pub country: String,
}

impl SeriesMetadata {
    pub fn new(keyword: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            country: country.into(),
        }
    }

    /// `true` when a real region was found.
    pub fn has_country(&self) -> bool {
        self.country != UNKNOWN_COUNTRY
    }

    /// The keyword as shown to users: `"coffee in United States"` when the
    /// region is known, plain `"coffee"` otherwise.
    pub fn display_keyword(&self) -> String {
        if self.has_country() {
            format!("{} in {}", self.keyword, self.country)
        } else {
            self.keyword.clone()
        }
    }
}

/// Output of the ingestion parser: the sorted series plus its metadata.
#[derive(Debug, Clone)]
pub struct ParsedSeries {
    pub points: Vec<TimeSeriesPoint>,
    pub metadata: SeriesMetadata,
}

// ── Buckets ───────────────────────────────────────────────────────────────────

/// Year-over-year direction of a yearly bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        };
        f.write_str(label)
    }
}

/// Statistics for one calendar month across all years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    /// Full month name, e.g. `"January"`.
    pub month: String,
    /// 1-12.
    pub month_number: u32,
    /// Mean interest, rounded to 2 decimals.
    pub average_value: f64,
    /// Unrounded sum of interest values.
    pub total_searches: f64,
    /// Share of the monthly grand total, rounded to 2 decimals.
    pub percentage: f64,
}

/// Statistics for one calendar quarter across all years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterlyBucket {
    /// `"Q1"` .. `"Q4"`.
    pub quarter: String,
    /// 1-4.
    pub quarter_number: u32,
    pub average_value: f64,
    pub total_searches: f64,
    pub percentage: f64,
}

/// Statistics for one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyBucket {
    pub year: i32,
    pub average_value: f64,
    pub total_searches: f64,
    /// Direction relative to the preceding year; the first year is stable.
    pub trend: Trend,
}

/// The three bucket collections, each sorted by period number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    pub monthly: Vec<MonthlyBucket>,
    pub quarterly: Vec<QuarterlyBucket>,
    pub yearly: Vec<YearlyBucket>,
}

/// First and last date of the analysed series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Covered span in whole years, using 365.25-day years.
    pub fn span_years(&self) -> i64 {
        let days = (self.end - self.start).num_days() as f64;
        (days / 365.25).round() as i64
    }
}

// ── AnalysisResult ────────────────────────────────────────────────────────────

/// Everything handed to the rendering layer for one upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Display keyword, e.g. `"coffee in United States"`.
    pub keyword: String,
    pub total_data_points: usize,
    pub date_range: DateRange,
    pub seasonality: Seasonality,
    pub insights: Vec<String>,
}

impl AnalysisResult {
    /// Return a copy of this result carrying `insights` instead.
    pub fn with_insights(&self, insights: Vec<String>) -> Self {
        Self {
            insights,
            ..self.clone()
        }
    }

    /// Covered span in whole years.
    pub fn span_years(&self) -> i64 {
        self.date_range.span_years()
    }
}
