//! Relevance oracle providers.
//!
//! Implementations of [`RelevanceOracle`] backed by hosted text-generation
//! APIs:
//! - **[`DisabledOracle`]**: always fails; retrieval falls back to the
//!   first chunks.
//! - **[`GeminiOracle`]**: Google Generative Language `generateContent`.
//! - **[`OpenAIOracle`]**: OpenAI-compatible chat completions.
//!
//! Use [`create_oracle`] to build the provider named in the config.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Each provider also owns a [`RateLimiter`] that spaces consecutive calls
//! by `oracle.min_interval_ms`.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use tender_draft_core::context::RelevanceOracle;

use crate::config::OracleConfig;

const GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
const OPENAI_URL: &str = "https://api.openai.com";

/// Build the oracle selected by `config.provider`.
pub fn create_oracle(config: &OracleConfig) -> Result<Box<dyn RelevanceOracle>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledOracle)),
        "gemini" => Ok(Box::new(GeminiOracle::new(config)?)),
        "openai" => Ok(Box::new(OpenAIOracle::new(config)?)),
        other => bail!("Unknown oracle provider: {}", other),
    }
}

// ============ Rate limiting ============

/// Enforces a minimum delay between consecutive calls.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Wait until a call is allowed, then record it.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::debug!(wait_ms = wait.as_millis() as u64, "oracle rate limit");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

// ============ Disabled Provider ============

/// An oracle that always fails.
///
/// Used when `oracle.provider = "disabled"`. Context selection treats the
/// failure like any other and falls back to the first chunks.
pub struct DisabledOracle;

#[async_trait]
impl RelevanceOracle for DisabledOracle {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("Relevance oracle is disabled")
    }
}

// ============ Shared HTTP plumbing ============

struct HttpSettings {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    limiter: RateLimiter,
}

impl HttpSettings {
    fn new(config: &OracleConfig, default_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config
                .url
                .as_deref()
                .unwrap_or(default_url)
                .trim_end_matches('/')
                .to_string(),
            max_retries: config.max_retries,
            limiter: RateLimiter::new(Duration::from_millis(config.min_interval_ms)),
        })
    }

    /// POST `body` to `url` with retry/backoff and return the JSON reply.
    async fn post_json(
        &self,
        provider: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::warn!(provider, attempt, delay_secs = delay.as_secs(), "retrying oracle call");
                tokio::time::sleep(delay).await;
            }
            self.limiter.acquire().await;

            let mut request = self.client.post(url).json(body);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response.json().await?);
                    }

                    // Rate limited or server error, retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "{} API error {}: {}",
                            provider,
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("{} API error {}: {}", provider, status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{} call failed after retries", provider)))
    }
}

fn required_model(config: &OracleConfig, provider: &str) -> Result<String> {
    config
        .model
        .clone()
        .ok_or_else(|| anyhow::anyhow!("oracle.model required for {} provider", provider))
}

fn env_key(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| anyhow::anyhow!("{} environment variable not set", var))
}

// ============ Gemini Provider ============

/// Oracle using the Gemini `generateContent` endpoint.
///
/// Requires the `GEMINI_API_KEY` environment variable.
pub struct GeminiOracle {
    model: String,
    api_key: String,
    http: HttpSettings,
}

impl GeminiOracle {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let api_key = env_key("GEMINI_API_KEY")?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &OracleConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            model: required_model(config, "gemini")?,
            api_key,
            http: HttpSettings::new(config, GEMINI_URL)?,
        })
    }
}

#[async_trait]
impl RelevanceOracle for GeminiOracle {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.http.base_url, self.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });
        let json = self
            .http
            .post_json("Gemini", &url, &[("x-goog-api-key", self.api_key.as_str())], &body)
            .await?;
        parse_gemini_response(&json)
    }
}

/// Extract the reply text, treating blocked or empty replies as errors.
fn parse_gemini_response(json: &serde_json::Value) -> Result<String> {
    if let Some(reason) = json
        .pointer("/promptFeedback/blockReason")
        .and_then(|r| r.as_str())
    {
        bail!("Gemini blocked the prompt: {}", reason);
    }

    let candidate = json
        .pointer("/candidates/0")
        .ok_or_else(|| anyhow::anyhow!("Invalid Gemini response: no candidates"))?;

    if candidate.get("finishReason").and_then(|r| r.as_str()) == Some("SAFETY") {
        bail!("Gemini response blocked for safety");
    }

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        bail!("Gemini returned an empty response");
    }
    Ok(text)
}

// ============ OpenAI Provider ============

/// Oracle using the `POST /v1/chat/completions` endpoint.
///
/// Requires the `OPENAI_API_KEY` environment variable. Any server speaking
/// the same protocol can be used through `oracle.url`.
pub struct OpenAIOracle {
    model: String,
    api_key: String,
    http: HttpSettings,
}

impl OpenAIOracle {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let api_key = env_key("OPENAI_API_KEY")?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &OracleConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            model: required_model(config, "openai")?,
            api_key,
            http: HttpSettings::new(config, OPENAI_URL)?,
        })
    }
}

#[async_trait]
impl RelevanceOracle for OpenAIOracle {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.http.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });
        let auth = format!("Bearer {}", self.api_key);
        let json = self
            .http
            .post_json("OpenAI", &url, &[("Authorization", auth.as_str())], &body)
            .await?;
        parse_openai_response(&json)
    }
}

fn parse_openai_response(json: &serde_json::Value) -> Result<String> {
    let choice = json
        .pointer("/choices/0")
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: no choices"))?;

    if choice.get("finish_reason").and_then(|r| r.as_str()) == Some("content_filter") {
        bail!("OpenAI response blocked by content filter");
    }

    let text = choice
        .pointer("/message/content")
        .and_then(|c| c.as_str())
        .unwrap_or_default();
    if text.trim().is_empty() {
        bail!("OpenAI returned an empty response");
    }
    Ok(text.to_string())
}
