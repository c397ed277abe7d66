//! JSON export of an analysis result.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;
use trends_core::models::{AnalysisResult, DateRange, MonthlyBucket, QuarterlyBucket, YearlyBucket};
use trends_core::Result;

/// Export document layout, borrowed from an [`AnalysisResult`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalityExport<'a> {
    pub keyword: &'a str,
    pub date_range: &'a DateRange,
    pub insights: &'a [String],
    pub monthly_data: &'a [MonthlyBucket],
    pub quarterly_data: &'a [QuarterlyBucket],
    pub yearly_data: &'a [YearlyBucket],
}

impl<'a> From<&'a AnalysisResult> for SeasonalityExport<'a> {
    fn from(result: &'a AnalysisResult) -> Self {
        Self {
            keyword: &result.keyword,
            date_range: &result.date_range,
            insights: &result.insights,
            monthly_data: &result.seasonality.monthly,
            quarterly_data: &result.seasonality.quarterly,
            yearly_data: &result.seasonality.yearly,
        }
    }
}

/// Default file name: `"<keyword>-seasonality-analysis.json"`.
///
/// Path separators in the keyword are replaced so the name stays a single
/// path component.
pub fn export_file_name(keyword: &str) -> String {
    let safe = keyword.replace(['/', '\\'], "_");
    format!("{}-seasonality-analysis.json", safe)
}

/// Pretty-printed export JSON.
pub fn export_json(result: &AnalysisResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(&SeasonalityExport::from(result))?)
}

/// Write the export and return the path written.
///
/// An existing directory `target` receives [`export_file_name`]; any other
/// `target` is used as the file path.
pub fn write_export(result: &AnalysisResult, target: &Path) -> Result<PathBuf> {
    let path = if target.is_dir() {
        target.join(export_file_name(&result.keyword))
    } else {
        target.to_path_buf()
    };

    std::fs::write(&path, export_json(result)?)?;
    info!("Exported analysis to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;
    use trends_core::models::{Seasonality, Trend};

    fn sample_result() -> AnalysisResult {
        let date = |m| NaiveDate::from_ymd_opt(2023, m, 1).unwrap();
        AnalysisResult {
            keyword: "coffee in United States".to_string(),
            total_data_points: 2,
            date_range: DateRange {
                start: date(1),
                end: date(2),
            },
            seasonality: Seasonality {
                monthly: vec![MonthlyBucket {
                    month: "January".to_string(),
                    month_number: 1,
                    average_value: 40.0,
                    total_searches: 40.0,
                    percentage: 100.0,
                }],
                quarterly: vec![QuarterlyBucket {
                    quarter: "Q1".to_string(),
                    quarter_number: 1,
                    average_value: 40.0,
                    total_searches: 40.0,
                    percentage: 100.0,
                }],
                yearly: vec![YearlyBucket {
                    year: 2023,
                    average_value: 40.0,
                    total_searches: 40.0,
                    trend: Trend::Stable,
                }],
            },
            insights: vec!["Peak search interest occurs in January".to_string()],
        }
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name("coffee in United States"),
            "coffee in United States-seasonality-analysis.json"
        );
        assert_eq!(export_file_name("a/b"), "a_b-seasonality-analysis.json");
    }

    #[test]
    fn test_export_json_layout() {
        let json: serde_json::Value =
            serde_json::from_str(&export_json(&sample_result()).unwrap()).unwrap();

        assert_eq!(json["keyword"], "coffee in United States");
        assert_eq!(json["dateRange"]["start"], "2023-01-01");
        assert_eq!(json["monthlyData"][0]["monthNumber"], 1);
        assert_eq!(json["quarterlyData"][0]["quarter"], "Q1");
        assert_eq!(json["yearlyData"][0]["trend"], "stable");
        assert_eq!(json["insights"].as_array().unwrap().len(), 1);
        assert!(json.get("totalDataPoints").is_none());
    }

    #[test]
    fn test_write_export_into_directory() {
        let dir = TempDir::new().unwrap();
        let path = write_export(&sample_result(), dir.path()).unwrap();

        assert_eq!(
            path,
            dir.path()
                .join("coffee in United States-seasonality-analysis.json")
        );
        assert!(path.exists());
    }

    #[test]
    fn test_write_export_to_explicit_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.json");
        let path = write_export(&sample_result(), &target).unwrap();

        assert_eq!(path, target);
        let text = std::fs::read_to_string(&target).unwrap();
        assert!(text.contains("\"yearlyData\""));
    }
}
