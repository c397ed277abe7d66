//! Template-based insight sentences derived from the aggregated buckets.

use std::fmt;

use trends_core::formatting::format_value;
use trends_core::models::{MonthlyBucket, QuarterlyBucket, Seasonality, Trend, YearlyBucket};

/// Variation, in percent, above which seasonality is called strong.
pub const STRONG_VARIATION_PERCENT: f64 = 50.0;

/// Variation, in percent, above which seasonality is called moderate.
pub const MODERATE_VARIATION_PERCENT: f64 = 25.0;

/// How many trailing years feed the recent-trend summary.
pub const RECENT_YEARS: usize = 3;

// ── TrendDirection ────────────────────────────────────────────────────────────

/// Overall direction of the most recent years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Growing,
    Declining,
    Stable,
    InsufficientData,
}

impl TrendDirection {
    /// Direction as summarised for the enhancement prompt: more `up` than
    /// `down` years is growing, the reverse is declining. Fewer than two
    /// years is [`TrendDirection::InsufficientData`].
    pub fn from_recent_years(yearly: &[YearlyBucket]) -> Self {
        let recent = recent_years(yearly);
        if recent.len() < 2 {
            return TrendDirection::InsufficientData;
        }
        let (up, down, _) = count_trends(recent);
        if up > down {
            TrendDirection::Growing
        } else if down > up {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendDirection::Growing => "growing",
            TrendDirection::Declining => "declining",
            TrendDirection::Stable => "stable",
            TrendDirection::InsufficientData => "insufficient data",
        };
        f.write_str(label)
    }
}

// ── SeasonalVariation ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariationStrength {
    Strong,
    Moderate,
    RelativelyStable,
}

/// Spread between the peak and low monthly averages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalVariation {
    /// `(peak - low) / low * 100`; `None` when the low is zero and the peak
    /// positive, which has no finite ratio.
    pub percent: Option<f64>,
    pub strength: VariationStrength,
}

impl SeasonalVariation {
    pub fn between(peak: f64, low: f64) -> Self {
        if low == 0.0 {
            return if peak > 0.0 {
                Self {
                    percent: None,
                    strength: VariationStrength::Strong,
                }
            } else {
                Self {
                    percent: Some(0.0),
                    strength: VariationStrength::RelativelyStable,
                }
            };
        }

        let percent = (peak - low) / low * 100.0;
        let strength = if percent > STRONG_VARIATION_PERCENT {
            VariationStrength::Strong
        } else if percent > MODERATE_VARIATION_PERCENT {
            VariationStrength::Moderate
        } else {
            VariationStrength::RelativelyStable
        };
        Self {
            percent: Some(percent),
            strength,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Build the ordered insight list: peak month, low month, variation, peak
/// quarter, recent trend. Sections whose buckets are empty are omitted.
pub fn generate_insights(seasonality: &Seasonality) -> Vec<String> {
    let mut insights = Vec::new();

    if let (Some(peak), Some(low)) = (
        peak_month(&seasonality.monthly),
        low_month(&seasonality.monthly),
    ) {
        insights.push(format!(
            "Peak search interest occurs in {} with an average of {}% interest",
            peak.month,
            format_value(peak.average_value)
        ));
        insights.push(format!(
            "Lowest search interest occurs in {} with an average of {}% interest",
            low.month,
            format_value(low.average_value)
        ));
        insights.push(variation_insight(peak, low));
    }

    if let Some(quarter) = peak_quarter(&seasonality.quarterly) {
        insights.push(format!(
            "{} is the strongest quarter, accounting for {}% of total searches",
            quarter.quarter,
            format_value(quarter.percentage)
        ));
    }

    if !seasonality.yearly.is_empty() {
        insights.push(recent_trend_insight(&seasonality.yearly));
    }

    insights
}

/// Action items keyed to the peak month and quarter.
pub fn recommendations(seasonality: &Seasonality) -> Vec<String> {
    let (Some(month), Some(quarter)) = (
        peak_month(&seasonality.monthly),
        peak_quarter(&seasonality.quarterly),
    ) else {
        return Vec::new();
    };

    vec![
        format!(
            "Plan your marketing campaigns around {} for maximum impact",
            month.month
        ),
        format!(
            "Allocate higher budget during {} when search interest peaks",
            quarter.quarter
        ),
        "Use off-peak periods for content creation and preparation".to_string(),
        "Consider seasonal promotions aligned with search patterns".to_string(),
    ]
}

/// Month with the highest average; the earliest month wins ties.
pub fn peak_month(monthly: &[MonthlyBucket]) -> Option<&MonthlyBucket> {
    first_by(monthly, |candidate, best| {
        candidate.average_value > best.average_value
    })
}

/// Month with the lowest average; the earliest month wins ties.
pub fn low_month(monthly: &[MonthlyBucket]) -> Option<&MonthlyBucket> {
    first_by(monthly, |candidate, best| {
        candidate.average_value < best.average_value
    })
}

/// Quarter with the highest average; the earliest quarter wins ties.
pub fn peak_quarter(quarterly: &[QuarterlyBucket]) -> Option<&QuarterlyBucket> {
    first_by(quarterly, |candidate, best| {
        candidate.average_value > best.average_value
    })
}

/// The last up-to-three yearly buckets.
pub fn recent_years(yearly: &[YearlyBucket]) -> &[YearlyBucket] {
    &yearly[yearly.len().saturating_sub(RECENT_YEARS)..]
}

/// Majority vote over the recent years. `up` must outnumber both `down`
/// and `stable` to be growing, likewise for declining; every tie is
/// stable.
pub fn recent_trend(yearly: &[YearlyBucket]) -> TrendDirection {
    let (up, down, stable) = count_trends(recent_years(yearly));
    if up > down && up > stable {
        TrendDirection::Growing
    } else if down > up && down > stable {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// First element for which no later element `beats` it.
fn first_by<T>(items: &[T], beats: impl Fn(&T, &T) -> bool) -> Option<&T> {
    let mut iter = items.iter();
    let first = iter.next()?;
    Some(iter.fold(first, |best, candidate| {
        if beats(candidate, best) {
            candidate
        } else {
            best
        }
    }))
}

fn count_trends(years: &[YearlyBucket]) -> (usize, usize, usize) {
    years.iter().fold((0, 0, 0), |(up, down, stable), y| match y.trend {
        Trend::Up => (up + 1, down, stable),
        Trend::Down => (up, down + 1, stable),
        Trend::Stable => (up, down, stable + 1),
    })
}

fn variation_insight(peak: &MonthlyBucket, low: &MonthlyBucket) -> String {
    let variation = SeasonalVariation::between(peak.average_value, low.average_value);
    match (variation.strength, variation.percent) {
        (VariationStrength::Strong, Some(pct)) => format!(
            "Strong seasonal pattern: {:.1}% difference between peak and low months",
            pct
        ),
        (VariationStrength::Strong, None) => format!(
            "Strong seasonal pattern: search interest drops to zero in {}",
            low.month
        ),
        (VariationStrength::Moderate, pct) => format!(
            "Moderate seasonal pattern: {:.1}% difference between peak and low months",
            pct.unwrap_or_default()
        ),
        (VariationStrength::RelativelyStable, pct) => format!(
            "Relatively stable search interest throughout the year ({:.1}% variation)",
            pct.unwrap_or_default()
        ),
    }
}

fn recent_trend_insight(yearly: &[YearlyBucket]) -> String {
    let years = recent_years(yearly).len();
    let span = if years == 1 {
        "the last year".to_string()
    } else {
        format!("the last {} years", years)
    };
    match recent_trend(yearly) {
        TrendDirection::Growing => format!("Search interest has been trending upward over {}", span),
        TrendDirection::Declining => format!("Search interest has been declining over {}", span),
        TrendDirection::Stable | TrendDirection::InsufficientData => {
            format!("Search interest has remained stable over {}", span)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
