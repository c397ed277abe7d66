//! Optional LLM rewrite of the template insights.
//!
//! The session only sees the [`InsightEnhancer`] trait, so the deterministic
//! pipeline never depends on a network service. [`OpenAiEnhancer`] is the
//! production implementation against the chat-completions API.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use trends_core::formatting::format_value;
use trends_core::models::AnalysisResult;
use trends_core::settings::{is_valid_api_key, DEFAULT_ENHANCEMENT_MODEL};
use trends_data::insights::{low_month, peak_month, peak_quarter, TrendDirection};

/// Chat-completions endpoint.
pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Upper bound on insights returned by [`parse_insights`].
pub const MAX_INSIGHTS: usize = 7;

/// Fragments of this many characters or fewer are discarded.
pub const MIN_INSIGHT_CHARS: usize = 20;

const MAX_TOKENS: u32 = 800;
const TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "You are a marketing analytics expert specializing in seasonal trends \
and business strategy. Provide actionable, specific insights based on Google Trends data.";

fn fragment_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.|•|-").expect("regex is valid"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why an enhancement attempt failed. Never fatal to an analysis run.
#[derive(Error, Debug)]
pub enum EnhancementError {
    #[error("Enhancement service is not configured: API key must start with 'sk-' and be longer than 20 characters")]
    NotConfigured,

    #[error("Enhancement request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Enhancement service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("No response from enhancement service")]
    EmptyResponse,

    #[error("Failed to decode enhancement response: {0}")]
    Decode(#[from] serde_json::Error),
}

// ── InsightEnhancer ───────────────────────────────────────────────────────────

/// Given a finished analysis, produce replacement insight strings or fail.
#[async_trait]
pub trait InsightEnhancer: Send + Sync {
    async fn enhance(&self, result: &AnalysisResult) -> Result<Vec<String>, EnhancementError>;
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ── OpenAiEnhancer ────────────────────────────────────────────────────────────

/// Chat-completions client for insight enhancement.
#[derive(Debug, Clone)]
pub struct OpenAiEnhancer {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiEnhancer {
    /// Build a client for `api_key`, rejecting keys of the wrong shape.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, EnhancementError> {
        let api_key = api_key.into();
        if !is_valid_api_key(&api_key) {
            return Err(EnhancementError::NotConfigured);
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            model: model.into(),
        })
    }

    /// Client using [`DEFAULT_ENHANCEMENT_MODEL`].
    pub fn with_default_model(api_key: impl Into<String>) -> Result<Self, EnhancementError> {
        Self::new(api_key, DEFAULT_ENHANCEMENT_MODEL)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        }
    }
}

#[async_trait]
impl InsightEnhancer for OpenAiEnhancer {
    async fn enhance(&self, result: &AnalysisResult) -> Result<Vec<String>, EnhancementError> {
        let prompt = build_prompt(result);
        debug!("Requesting enhanced insights from {} ({})", OPENAI_CHAT_URL, self.model);

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(EnhancementError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        parse_insights(&content)
    }
}

// ── Prompt and response handling ──────────────────────────────────────────────

/// Summarise `result` into the user prompt sent to the model.
pub fn build_prompt(result: &AnalysisResult) -> String {
    let seasonality = &result.seasonality;

    let peak = peak_month(&seasonality.monthly)
        .map(|m| format!("{} ({}% interest)", m.month, format_value(m.average_value)))
        .unwrap_or_else(|| "n/a".to_string());
    let low = low_month(&seasonality.monthly)
        .map(|m| format!("{} ({}% interest)", m.month, format_value(m.average_value)))
        .unwrap_or_else(|| "n/a".to_string());
    let quarter = peak_quarter(&seasonality.quarterly)
        .map(|q| format!("{} ({}% of searches)", q.quarter, format_value(q.percentage)))
        .unwrap_or_else(|| "n/a".to_string());
    let direction = TrendDirection::from_recent_years(&seasonality.yearly);

    let monthly = seasonality
        .monthly
        .iter()
        .map(|m| format!("{}: {}%", m.month, format_value(m.average_value)))
        .collect::<Vec<_>>()
        .join(", ");
    let quarterly = seasonality
        .quarterly
        .iter()
        .map(|q| format!("{}: {}%", q.quarter, format_value(q.average_value)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Analyze this Google Trends data for \"{keyword}\" from {start} to {end}:\n\
         \n\
         SEASONAL PATTERNS:\n\
         - Peak month: {peak}\n\
         - Low month: {low}\n\
         - Peak quarter: {quarter}\n\
         - Recent trend: {direction}\n\
         \n\
         MONTHLY DATA:\n\
         {monthly}\n\
         \n\
         QUARTERLY DATA:\n\
         {quarterly}\n\
         \n\
         Please provide 5-7 specific, actionable marketing insights. Focus on:\n\
         1. Strategic timing for campaigns and budget allocation\n\
         2. Market opportunities and competitive advantages\n\
         3. Consumer behavior patterns and motivations\n\
         4. Seasonal business planning recommendations\n\
         5. Risk mitigation for low-demand periods\n\
         \n\
         Format each insight as a complete sentence that a marketing manager could \
         immediately act upon. Avoid generic advice and focus on data-driven \
         recommendations specific to this search pattern.",
        keyword = result.keyword,
        start = result.date_range.start,
        end = result.date_range.end,
    )
}

/// Split a model reply into insight strings.
///
/// Fragments are cut at numbered markers (`1.`), bullets (`•`) and hyphens,
/// trimmed, and kept when longer than [`MIN_INSIGHT_CHARS`], up to
/// [`MAX_INSIGHTS`]. A reply with no qualifying fragment is returned whole.
pub fn parse_insights(content: &str) -> Result<Vec<String>, EnhancementError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(EnhancementError::EmptyResponse);
    }

    let insights: Vec<String> = fragment_separator_re()
        .split(trimmed)
        .map(str::trim)
        .filter(|fragment| fragment.chars().count() > MIN_INSIGHT_CHARS)
        .take(MAX_INSIGHTS)
        .map(str::to_string)
        .collect();

    if insights.is_empty() {
        Ok(vec![trimmed.to_string()])
    } else {
        Ok(insights)
    }
}

/// Extract `error.message` from an API error body, or fall back to the raw
/// body text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
