mod bootstrap;
mod report;

use anyhow::Result;
use trends_core::settings::Settings;
use trends_core::SeasonalityError;
use trends_runtime::session::{AnalysisSession, EnhancementOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Trends Seasonality v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "File: {}, Format: {}, Max size: {} MB",
        settings.file.display(),
        settings.format,
        settings.max_file_size_mb
    );

    let mut session = AnalysisSession::new(settings.max_file_bytes());
    session.set_enhancer(bootstrap::build_enhancer(&settings));

    session.load_path(&settings.file).await?;

    match session.enhance().await {
        EnhancementOutcome::Enhanced(count) => {
            tracing::info!("Using {} enhanced insights", count);
        }
        EnhancementOutcome::Fallback(reason) => {
            eprintln!("Enhanced insights unavailable ({}); showing standard insights", reason);
        }
        EnhancementOutcome::Skipped => {}
    }

    let result = session.result().ok_or(SeasonalityError::NoAnalysis)?;
    if settings.wants_json() {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print!("{}", report::render(result));
    }

    if let Some(target) = &settings.export {
        let path = session.export_to(target)?;
        eprintln!("Exported analysis to {}", path.display());
    }

    Ok(())
}
