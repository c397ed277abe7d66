//! Seasonality aggregation over monthly, quarterly and yearly buckets.
//!
//! Points are grouped by calendar period in a first pass (mean and total),
//! then a second pass attaches each bucket's share of the grand total.
//! Yearly buckets carry a year-over-year [`Trend`] instead of a share.

use std::collections::BTreeMap;

use tracing::debug;
use trends_core::formatting::{percentage, round_to};
use trends_core::models::{
    month_name, quarter_name, AnalysisResult, DateRange, MonthlyBucket, QuarterlyBucket,
    Seasonality, SeriesMetadata, TimeSeriesPoint, Trend, YearlyBucket,
};
use trends_core::{Result, SeasonalityError};

use crate::insights::generate_insights;

/// Year-over-year change, in percent, beyond which a year is up or down.
pub const TREND_THRESHOLD_PERCENT: f64 = 5.0;

// ── PeriodStats ───────────────────────────────────────────────────────────────

/// Running sum and count of values within one period.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodStats {
    pub total: f64,
    pub count: usize,
}

impl PeriodStats {
    pub fn add(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    /// Arithmetic mean, or 0 for an empty period.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }

    /// Mean rounded to 2 decimals, as stored in buckets.
    pub fn rounded_mean(&self) -> f64 {
        round_to(self.mean(), 2)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Run the full aggregation and insight synthesis for one series.
///
/// Returns [`SeasonalityError::NoValidData`] when `points` is empty.
pub fn analyze_seasonality(
    points: &[TimeSeriesPoint],
    metadata: &SeriesMetadata,
) -> Result<AnalysisResult> {
    let date_range = date_range_of(points).ok_or(SeasonalityError::NoValidData)?;
    let seasonality = build_seasonality(points);
    let insights = generate_insights(&seasonality);

    debug!(
        "Aggregated {} points into {} monthly, {} quarterly, {} yearly buckets",
        points.len(),
        seasonality.monthly.len(),
        seasonality.quarterly.len(),
        seasonality.yearly.len()
    );

    Ok(AnalysisResult {
        keyword: metadata.display_keyword(),
        total_data_points: points.len(),
        date_range,
        seasonality,
        insights,
    })
}

/// Compute all three bucket collections.
pub fn build_seasonality(points: &[TimeSeriesPoint]) -> Seasonality {
    Seasonality {
        monthly: monthly_buckets(points),
        quarterly: quarterly_buckets(points),
        yearly: yearly_buckets(points),
    }
}

/// One bucket per calendar month present, ordered January → December.
pub fn monthly_buckets(points: &[TimeSeriesPoint]) -> Vec<MonthlyBucket> {
    let groups = group_by_period(points, |p| p.month());
    let grand_total: f64 = groups.values().map(|s| s.total).sum();

    groups
        .into_iter()
        .map(|(month, stats)| MonthlyBucket {
            month: month_name(month).to_string(),
            month_number: month,
            average_value: stats.rounded_mean(),
            total_searches: stats.total,
            percentage: percentage(stats.total, grand_total, 2),
        })
        .collect()
}

/// One bucket per calendar quarter present, ordered Q1 → Q4.
pub fn quarterly_buckets(points: &[TimeSeriesPoint]) -> Vec<QuarterlyBucket> {
    let groups = group_by_period(points, |p| p.quarter());
    let grand_total: f64 = groups.values().map(|s| s.total).sum();

    groups
        .into_iter()
        .map(|(quarter, stats)| QuarterlyBucket {
            quarter: quarter_name(quarter).to_string(),
            quarter_number: quarter,
            average_value: stats.rounded_mean(),
            total_searches: stats.total,
            percentage: percentage(stats.total, grand_total, 2),
        })
        .collect()
}

/// One bucket per year present, ascending, each labelled against its
/// predecessor. The first year is always [`Trend::Stable`].
pub fn yearly_buckets(points: &[TimeSeriesPoint]) -> Vec<YearlyBucket> {
    let groups = group_by_period(points, |p| p.year());

    let mut buckets: Vec<YearlyBucket> = Vec::with_capacity(groups.len());
    let mut previous: Option<f64> = None;

    for (year, stats) in groups {
        let average_value = stats.rounded_mean();
        let trend = previous
            .map(|prev| classify_trend(prev, average_value))
            .unwrap_or(Trend::Stable);

        buckets.push(YearlyBucket {
            year,
            average_value,
            total_searches: stats.total,
            trend,
        });
        previous = Some(average_value);
    }

    buckets
}

/// Label the change from `previous` to `current` average.
///
/// More than +5 % is up, less than -5 % is down. A zero previous average
/// has no defined ratio: any positive current average counts as up.
pub fn classify_trend(previous: f64, current: f64) -> Trend {
    if previous == 0.0 {
        return if current > 0.0 { Trend::Up } else { Trend::Stable };
    }

    let change = (current - previous) / previous * 100.0;
    if change > TREND_THRESHOLD_PERCENT {
        Trend::Up
    } else if change < -TREND_THRESHOLD_PERCENT {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Earliest and latest dates, or `None` for an empty series.
pub fn date_range_of(points: &[TimeSeriesPoint]) -> Option<DateRange> {
    let start = points.iter().map(|p| p.date()).min()?;
    let end = points.iter().map(|p| p.date()).max()?;
    Some(DateRange { start, end })
}

// ── Private ───────────────────────────────────────────────────────────────────

/// Group values under the key produced by `key_fn`.
///
/// `BTreeMap` keeps the periods in ascending order and only creates
/// entries for periods that actually occur.
fn group_by_period<K: Ord>(
    points: &[TimeSeriesPoint],
    key_fn: impl Fn(&TimeSeriesPoint) -> K,
) -> BTreeMap<K, PeriodStats> {
    let mut map: BTreeMap<K, PeriodStats> = BTreeMap::new();
    for point in points {
        map.entry(key_fn(point)).or_default().add(point.value());
    }
    map
}

// ── Tests ─────────────────────────────────────────────────────────────────────
