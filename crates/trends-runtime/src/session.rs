//! Stateful analysis session.
//!
//! Holds the most recent [`AnalysisResult`] and the last error message,
//! and optionally an [`InsightEnhancer`]. Each load replaces the result
//! wholesale; enhancement produces a fresh result rather than mutating the
//! existing one, and its failure leaves the template insights in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use trends_core::models::AnalysisResult;
use trends_core::{Result, SeasonalityError};
use trends_data::analysis::analyze_upload;
use trends_data::export::write_export;
use trends_data::reader::{check_size, file_name_of, Upload, DEFAULT_MAX_FILE_BYTES};

use crate::enhancer::{EnhancementError, InsightEnhancer};

// ── EnhancementOutcome ────────────────────────────────────────────────────────

/// What [`AnalysisSession::enhance`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhancementOutcome {
    /// The result now carries this many enhanced insights.
    Enhanced(usize),
    /// The enhancer failed; the template insights were kept.
    Fallback(String),
    /// No enhancer configured, or nothing loaded.
    Skipped,
}

// ── AnalysisSession ───────────────────────────────────────────────────────────

pub struct AnalysisSession {
    /// Upload ceiling applied to every load.
    max_bytes: u64,
    /// Result of the last successful load.
    result: Option<AnalysisResult>,
    /// Message of the last failed load.
    last_error: Option<String>,
    enhancer: Option<Arc<dyn InsightEnhancer>>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_BYTES)
    }
}

impl AnalysisSession {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            result: None,
            last_error: None,
            enhancer: None,
        }
    }

    /// Attach an enhancer used by [`AnalysisSession::enhance`].
    pub fn with_enhancer(mut self, enhancer: Arc<dyn InsightEnhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn set_enhancer(&mut self, enhancer: Option<Arc<dyn InsightEnhancer>>) {
        self.enhancer = enhancer;
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Human-readable message from the last failed load, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    // ── Loading ───────────────────────────────────────────────────────────

    /// Read `path` asynchronously and analyse it.
    ///
    /// The file size is checked against the ceiling before its contents are
    /// read.
    pub async fn load_path(&mut self, path: &Path) -> Result<&AnalysisResult> {
        let outcome = match read_upload_async(path, self.max_bytes).await {
            Ok(upload) => analyze_upload(&upload, self.max_bytes),
            Err(e) => Err(e),
        };
        self.record(outcome)
    }

    /// Analyse an in-memory upload.
    pub fn load_upload(&mut self, upload: &Upload) -> Result<&AnalysisResult> {
        let outcome = analyze_upload(upload, self.max_bytes);
        self.record(outcome)
    }

    /// Discard the current result and error.
    pub fn reset(&mut self) {
        self.result = None;
        self.last_error = None;
    }

    // ── Enhancement ───────────────────────────────────────────────────────

    /// Replace the template insights with enhanced ones.
    ///
    /// Never fails: enhancer errors are logged and reported as
    /// [`EnhancementOutcome::Fallback`] with the current result untouched.
    pub async fn enhance(&mut self) -> EnhancementOutcome {
        let (Some(enhancer), Some(current)) = (self.enhancer.clone(), self.result.as_ref()) else {
            return EnhancementOutcome::Skipped;
        };

        let outcome = match enhancer.enhance(current).await {
            Ok(insights) if insights.is_empty() => Err(EnhancementError::EmptyResponse),
            other => other,
        };

        match outcome {
            Ok(insights) => {
                let count = insights.len();
                let enhanced = current.with_insights(insights);
                self.result = Some(enhanced);
                info!("Replaced template insights with {} enhanced insights", count);
                EnhancementOutcome::Enhanced(count)
            }
            Err(e) => {
                warn!(error = %e, "enhancement failed; keeping template insights");
                EnhancementOutcome::Fallback(e.to_string())
            }
        }
    }

    // ── Export ────────────────────────────────────────────────────────────

    /// Write the current result as a JSON export. See
    /// [`trends_data::export::write_export`] for how `target` is resolved.
    pub fn export_to(&self, target: &Path) -> Result<PathBuf> {
        let result = self.result.as_ref().ok_or(SeasonalityError::NoAnalysis)?;
        write_export(result, target)
    }

    // ── Private ───────────────────────────────────────────────────────────

    fn record(&mut self, outcome: Result<AnalysisResult>) -> Result<&AnalysisResult> {
        match outcome {
            Ok(result) => {
                self.last_error = None;
                let stored: &AnalysisResult = self.result.insert(result);
                Ok(stored)
            }
            Err(e) => {
                warn!(error = %e, "analysis failed");
                self.result = None;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

/// Async counterpart of [`trends_data::reader::read_upload`].
async fn read_upload_async(path: &Path, max_bytes: u64) -> Result<Upload> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|source| SeasonalityError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    check_size(metadata.len(), max_bytes)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| SeasonalityError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Upload::new(file_name_of(path), bytes))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const EXPORT: &str = "Category: All categories\n\
                          \n\
                          Week,coffee: (United States)\n\
                          2022-01-02,80\n\
                          2022-02-06,20\n\
                          2023-01-01,70\n\
                          2023-02-05,30\n";

    /// Enhancer returning a canned reply and counting calls.
    struct MockEnhancer {
        reply: std::result::Result<Vec<String>, String>,
        calls: AtomicUsize,
    }

    impl MockEnhancer {
        fn ok(insights: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(insights.iter().map(|s| s.to_string()).collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(format!("status {}", status)),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl InsightEnhancer for MockEnhancer {
        async fn enhance(
            &self,
            _result: &AnalysisResult,
        ) -> std::result::Result<Vec<String>, EnhancementError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|message| EnhancementError::Api {
                status: 429,
                message,
            })
        }
    }

    fn upload() -> Upload {
        Upload::new("coffee.csv", EXPORT.as_bytes().to_vec())
    }

    // ── loading ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_upload_stores_result() {
        let mut session = AnalysisSession::default();
        let result = session.load_upload(&upload()).unwrap();
        assert_eq!(result.keyword, "coffee in United States");
        assert_eq!(result.total_data_points, 4);
        assert!(session.last_error().is_none());
        assert!(session.result().is_some());
    }

    #[test]
    fn test_failed_load_clears_previous_result() {
        let mut session = AnalysisSession::default();
        session.load_upload(&upload()).unwrap();

        let bad = Upload::new("notes.txt", b"hello".to_vec());
        assert!(session.load_upload(&bad).is_err());
        assert!(session.result().is_none());
        assert_eq!(
            session.last_error(),
            Some("Please upload a CSV file (got notes.txt)")
        );
    }

    #[test]
    fn test_successful_load_clears_error() {
        let mut session = AnalysisSession::default();
        let _ = session.load_upload(&Upload::new("empty.csv", Vec::new()));
        assert!(session.last_error().is_some());

        session.load_upload(&upload()).unwrap();
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_reset() {
        let mut session = AnalysisSession::default();
        session.load_upload(&upload()).unwrap();
        session.reset();
        assert!(session.result().is_none());
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_load_path_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("coffee.csv");
        std::fs::write(&path, EXPORT).unwrap();

        let mut session = AnalysisSession::default();
        let result = session.load_path(&path).await.unwrap();
        assert_eq!(result.seasonality.yearly.len(), 2);
    }

    #[tokio::test]
    async fn test_load_path_rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("coffee.csv");
        std::fs::write(&path, EXPORT).unwrap();

        let mut session = AnalysisSession::new(16);
        let err = session.load_path(&path).await.unwrap_err();
        assert!(matches!(err, SeasonalityError::FileTooLarge { limit: 16, .. }));
        assert!(session.last_error().is_some());
    }

    #[tokio::test]
    async fn test_load_path_missing_file() {
        let mut session = AnalysisSession::default();
        let err = session
            .load_path(Path::new("/nonexistent/trends-session.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, SeasonalityError::FileRead { .. }));
    }

    // ── enhance ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_enhance_skipped_without_enhancer_or_result() {
        let mut session = AnalysisSession::default();
        assert_eq!(session.enhance().await, EnhancementOutcome::Skipped);

        let mock = MockEnhancer::ok(&["An enhanced insight about January"]);
        let mut session = AnalysisSession::default().with_enhancer(mock.clone());
        assert_eq!(session.enhance().await, EnhancementOutcome::Skipped);
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_set_enhancer_none_disables_enhancement() {
        let mock = MockEnhancer::ok(&["An enhanced insight about January"]);
        let mut session = AnalysisSession::default().with_enhancer(mock.clone());
        session.load_upload(&upload()).unwrap();

        session.set_enhancer(None);
        assert_eq!(session.enhance().await, EnhancementOutcome::Skipped);
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_enhance_replaces_insights() {
        let mock = MockEnhancer::ok(&[
            "Launch campaigns in December ahead of the January peak",
            "Use February for content production",
        ]);
        let mut session = AnalysisSession::default().with_enhancer(mock.clone());
        let template = session.load_upload(&upload()).unwrap().clone();

        assert_eq!(session.enhance().await, EnhancementOutcome::Enhanced(2));
        let enhanced = session.result().unwrap();
        assert_eq!(enhanced.insights.len(), 2);
        assert_eq!(enhanced.seasonality, template.seasonality);
        assert_ne!(enhanced.insights, template.insights);
        assert_eq!(mock.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_enhance_failure_keeps_template_insights() {
        let mut session = AnalysisSession::default().with_enhancer(MockEnhancer::failing(429));
        let template = session.load_upload(&upload()).unwrap().insights.clone();

        let outcome = session.enhance().await;
        assert!(matches!(outcome, EnhancementOutcome::Fallback(ref msg) if msg.contains("429")));
        assert_eq!(session.result().unwrap().insights, template);
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_enhance_empty_reply_is_fallback() {
        let mut session = AnalysisSession::default().with_enhancer(MockEnhancer::ok(&[]));
        session.load_upload(&upload()).unwrap();
        assert!(matches!(
            session.enhance().await,
            EnhancementOutcome::Fallback(_)
        ));
        assert!(!session.result().unwrap().insights.is_empty());
    }

    // ── export ────────────────────────────────────────────────────────────

    #[test]
    fn test_export_requires_result() {
        let dir = TempDir::new().unwrap();
        let session = AnalysisSession::default();
        assert!(matches!(
            session.export_to(dir.path()),
            Err(SeasonalityError::NoAnalysis)
        ));
    }

    #[test]
    fn test_export_writes_default_name() {
        let dir = TempDir::new().unwrap();
        let mut session = AnalysisSession::default();
        session.load_upload(&upload()).unwrap();

        let path = session.export_to(dir.path()).unwrap();
        assert!(path.ends_with("coffee in United States-seasonality-analysis.json"));
        assert!(path.exists());
    }
}
