//! LLM summarization with exponential backoff retry logic.
//!
//! Cleaned article text is sent to an OpenAI-compatible chat-completions
//! endpoint (Groq by default) and the reply is used as the article summary.
//! The summarizer never fails: every problem is turned into one of the
//! `"Summary not available - ..."` sentinels so a single bad article cannot
//! stop a batch.
//!
//! # Architecture
//!
//! - [`AskAsync`]: core trait for sending a prompt and receiving a reply
//! - [`ChatClient`]: chat-completions implementation of [`AskAsync`]
//! - [`RetryAsk`]: decorator adding retry with backoff to any `AskAsync`
//! - [`Summarizer`]: builds the prompt, truncates input, maps errors to sentinels
//!
//! # Retry Strategy
//!
//! - Up to `max_retries` retries (5 by default) for network errors, 429 and 5xx
//! - Exponential backoff starting at `base_delay`, capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::error::SummarizeError;
use crate::utils::{truncate_chars, truncate_for_log};
use rand::{Rng, rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

pub const SUMMARY_FETCH_FAILED: &str = "Summary not available - could not fetch article content.";
pub const SUMMARY_NO_TEXT: &str = "Summary not available - article text could not be extracted.";
pub const SUMMARY_EMPTY: &str = "Summary not available - no response generated.";
pub const SUMMARY_DISABLED: &str = "Summary not available - summarizer not configured.";

/// True for any of the `"Summary not available"` sentinels.
pub fn is_unavailable(summary: &str) -> bool {
    summary.to_lowercase().contains("not available")
}

/// Settings for the chat-completions summarizer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// OpenAI-compatible chat-completions URL.
    pub endpoint: String,
    pub model: String,
    /// Bearer token; the summarizer is disabled without one.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Articles longer than this many characters are cut and suffixed with `...`.
    pub max_input_chars: usize,
    pub temperature: f32,
    /// Completion length cap.
    pub max_tokens: u32,
    /// Retries after the first attempt, for transient failures only.
    pub max_retries: usize,
    /// First backoff delay; doubles per retry up to 30 seconds.
    pub base_delay_ms: u64,
    /// Budget of a single completion request.
    pub timeout_secs: u64,
    /// Subject area named in the prompt.
    pub topic: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "groq/compound".to_string(),
            api_key: None,
            max_input_chars: 8000,
            temperature: 0.3,
            max_tokens: 1000,
            max_retries: 5,
            base_delay_ms: 1000,
            timeout_secs: 60,
            topic: "digital health and health technology news in Australia".to_string(),
        }
    }
}

/// Trait for async LLM interaction.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send a prompt to the LLM and receive a response.
    async fn ask(&self, prompt: &str) -> Result<Self::Response, SummarizeError>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

fn is_retryable(e: &SummarizeError) -> bool {
    match e {
        SummarizeError::Network(_) => true,
        SummarizeError::Api { status, .. } => *status == 429 || *status >= 500,
        SummarizeError::Malformed(_) => false,
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, prompt: &str) -> Result<Self::Response, SummarizeError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(prompt).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries || !is_retryable(&e) {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "ask() giving up"
                        );
                        return Err(e);
                    }

                    let mut delay = self
                        .base_delay
                        .saturating_mul(1u32 << (attempt - 1).min(16));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: StdDuration,
}

impl ChatClient {
    pub fn new(config: &SummarizerConfig, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: StdDuration::from_secs(config.timeout_secs),
        }
    }
}

impl AskAsync for ChatClient {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, prompt: &str) -> Result<Self::Response, SummarizeError> {
        let t0 = Instant::now();
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(elapsed_ms = t0.elapsed().as_millis() as u64, %status, "API call failed");
            return Err(SummarizeError::Api {
                status: status.as_u16(),
                message: truncate_for_log(&message, 300),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::Malformed(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

/// Turns article text into a summary string, or a sentinel.
#[derive(Debug)]
pub struct Summarizer<T> {
    asker: Option<RetryAsk<T>>,
    max_input_chars: usize,
    topic: String,
}

impl Summarizer<ChatClient> {
    /// Chat-completions summarizer; disabled when no API key is configured.
    pub fn from_config(config: &SummarizerConfig) -> Self {
        let inner = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(|key| ChatClient::new(config, key));
        Self::new(inner, config)
    }
}

impl<T> Summarizer<T>
where
    T: AskAsync<Response = String>,
{
    pub fn new(inner: Option<T>, config: &SummarizerConfig) -> Self {
        Self {
            asker: inner.map(|i| {
                RetryAsk::new(i, config.max_retries, StdDuration::from_millis(config.base_delay_ms))
            }),
            max_input_chars: config.max_input_chars,
            topic: config.topic.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.asker.is_some()
    }

    #[instrument(level = "info", skip_all, fields(chars = text.chars().count()))]
    pub async fn summarize(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return SUMMARY_NO_TEXT.to_string();
        }
        let Some(asker) = &self.asker else {
            return SUMMARY_DISABLED.to_string();
        };

        let text = truncate_chars(text, self.max_input_chars, "...");
        let t0 = Instant::now();
        match asker.ask(&build_prompt(&self.topic, &text)).await {
            Ok(summary) if summary.is_empty() => SUMMARY_EMPTY.to_string(),
            Ok(summary) => {
                info!(elapsed_ms = t0.elapsed().as_millis() as u64, "Summary generated");
                summary
            }
            Err(e) => {
                error!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "Summarization failed");
                format!("Summary not available - API error: {e}")
            }
        }
    }
}

fn build_prompt(topic: &str, text: &str) -> String {
    format!(
        r#"You are an expert analyst of {topic}.

Your task:
1. Read the article carefully
2. Think about what top question this article is answering
3. Write the question in full, followed by a comprehensive 5-6 sentence answer

Format your response EXACTLY like this:

Question: [The full question, tailored to what this article discusses]
Answer: [A detailed 5-6 sentence answer with specific details, names, dates and context from the article. The answer must be self-contained.]

Rules:
- The question must be complete and specific to this article
- The answer must include specific information from the article
- Focus on the most newsworthy aspects
- If the article does not answer a typical question (e.g. "When"), choose one it does answer
- Do not add any text beyond the single question and answer

Article text:
{text}
"#
    )
}
