/// Natural-language content summaries.
///
/// [`HttpSummarizer`] talks to an OpenAI-compatible chat-completions endpoint.
/// Callers never see a summarizer failure as fatal: the scan swaps in
/// [`SUMMARY_UNAVAILABLE`] and moves on.
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::error::SummarizerError;

/// Maximum number of collected texts sent for summarization.
pub const SUMMARY_TEXT_LIMIT: usize = 10;

/// Report text when the summarizer failed.
pub const SUMMARY_UNAVAILABLE: &str = "Content analysis unavailable.";

/// Report text when posts were seen but none carried text.
pub const NO_TEXT_CONTENT: &str = "Not enough text content to analyze.";

pub trait Summarizer {
    /// Summarize `texts`, given most recent first.
    fn summarize(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<String, SummarizerError>>;
}

/// Always fails with [`SummarizerError::Disabled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSummarizer;

impl Summarizer for DisabledSummarizer {
    async fn summarize(&self, _texts: &[String]) -> Result<String, SummarizerError> {
        Err(SummarizerError::Disabled)
    }
}

/// Connection settings for [`HttpSummarizer`].
#[derive(Debug, Clone)]
pub struct HttpSummarizerSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
    pub language: String,
    pub temperature: f32,
}

/// Summarizer picked at startup from configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredSummarizer {
    Http(HttpSummarizer),
    Disabled(DisabledSummarizer),
}

impl Summarizer for ConfiguredSummarizer {
    async fn summarize(&self, texts: &[String]) -> Result<String, SummarizerError> {
        match self {
            Self::Http(inner) => inner.summarize(texts).await,
            Self::Disabled(inner) => inner.summarize(texts).await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpSummarizer {
    http: reqwest::Client,
    settings: HttpSummarizerSettings,
}

impl HttpSummarizer {
    pub fn new(settings: HttpSummarizerSettings) -> Result<Self, SummarizerError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { http, settings })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Body<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
}

impl Summarizer for HttpSummarizer {
    async fn summarize(&self, texts: &[String]) -> Result<String, SummarizerError> {
        let prompt = build_prompt(texts, &self.settings.language);
        let body = Body {
            model: &self.settings.model,
            messages: vec![Msg {
                role: "user",
                content: &prompt,
            }],
            temperature: self.settings.temperature,
        };

        debug!(
            endpoint = %self.settings.endpoint,
            texts = texts.len(),
            "Requesting content summary"
        );
        let resp = self
            .http
            .post(&self.settings.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let txt = resp.text().await?;
        if !status.is_success() {
            return Err(SummarizerError::Status {
                status: status.as_u16(),
                body: txt,
            });
        }
        extract_content(&txt)
    }
}

/// Prompt asking for the four standard content observations.
pub fn build_prompt(texts: &[String], language: &str) -> String {
    let recent = texts
        .iter()
        .take(SUMMARY_TEXT_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n---\n");

    format!(
        "Analyze the content of this messaging channel and answer in {language}:\n\
         \n\
         1. Main topics and themes\n\
         2. Writing style and tone\n\
         3. Audience engagement patterns\n\
         4. Suggestions for improving the content\n\
         \n\
         Recent posts:\n\
         {recent}\n"
    )
}

/// Pull `choices[0].message.content` out of a chat-completions response.
fn extract_content(raw: &str) -> Result<String, SummarizerError> {
    let val: serde_json::Value =
        serde_json::from_str(raw).map_err(|_| SummarizerError::EmptyResponse)?;
    let content = val["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .unwrap_or_default();
    if content.is_empty() {
        return Err(SummarizerError::EmptyResponse);
    }
    Ok(content.to_string())
}
