//! Plain-text rendering of an analysis for the terminal.

use std::fmt::Write;

use trends_core::formatting::{format_total, format_value};
use trends_core::models::AnalysisResult;
use trends_data::insights::{peak_month, peak_quarter, recommendations};

/// Render `result` as a multi-section text report.
pub fn render(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let seasonality = &result.seasonality;

    let _ = writeln!(out, "Seasonality analysis: {}", result.keyword);
    let _ = writeln!(
        out,
        "{} data points from {} to {} (~{} years)",
        result.total_data_points,
        result.date_range.start,
        result.date_range.end,
        result.span_years()
    );

    if let (Some(month), Some(quarter)) = (
        peak_month(&seasonality.monthly),
        peak_quarter(&seasonality.quarterly),
    ) {
        let _ = writeln!(
            out,
            "Peak month: {} ({}% interest) | Peak quarter: {} ({}% of searches)",
            month.month,
            format_value(month.average_value),
            quarter.quarter,
            format_value(quarter.percentage)
        );
    }

    section(&mut out, "Monthly");
    for m in &seasonality.monthly {
        let _ = writeln!(
            out,
            "  {:<10} avg {:>7}  total {:>10}  share {:>6}%",
            m.month,
            format_value(m.average_value),
            format_total(m.total_searches),
            format_value(m.percentage)
        );
    }

    section(&mut out, "Quarterly");
    for q in &seasonality.quarterly {
        let _ = writeln!(
            out,
            "  {:<10} avg {:>7}  total {:>10}  share {:>6}%",
            q.quarter,
            format_value(q.average_value),
            format_total(q.total_searches),
            format_value(q.percentage)
        );
    }

    section(&mut out, "Yearly");
    for y in &seasonality.yearly {
        let _ = writeln!(
            out,
            "  {:<10} avg {:>7}  total {:>10}  {}",
            y.year,
            format_value(y.average_value),
            format_total(y.total_searches),
            y.trend
        );
    }

    section(&mut out, "Insights");
    for insight in &result.insights {
        let _ = writeln!(out, "  • {}", insight);
    }

    let recs = recommendations(seasonality);
    if !recs.is_empty() {
        section(&mut out, "Recommendations");
        for rec in &recs {
            let _ = writeln!(out, "  • {}", rec);
        }
    }

    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", title);
}
