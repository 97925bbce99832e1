//! Translation gateway.
//!
//! Translation is best-effort enrichment: a failed call degrades to an
//! empty string instead of propagating, so a translation outage never
//! blocks a lookup. One outbound request per fragment, no retries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// A text-translation collaborator.
///
/// Implementations translate a single fragment and absorb their own
/// failures: the returned string is empty when translation was skipped or
/// failed, never an error.
#[async_trait]
pub trait Translate: Send + Sync {
    /// Translates one text fragment, returning `""` on any failure.
    async fn translate(&self, text: &str) -> String;
}

/// HTTP client for a LibreTranslate-compatible translation service.
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    /// HTTP client for API requests.
    client: reqwest::Client,

    /// URL of the translation endpoint.
    api_url: String,

    /// Source language code (e.g., "en").
    source_lang: String,

    /// Target language code (e.g., "vi").
    target_lang: String,
}

/// Request body for the translation API.
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

/// Response from the translation API.
#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl HttpTranslator {
    /// Creates a new translator client.
    ///
    /// # Arguments
    ///
    /// * `api_url` - URL of the translation endpoint.
    /// * `source_lang` - Source language code (e.g., "en").
    /// * `target_lang` - Target language code (e.g., "vi").
    /// * `timeout` - Per-request timeout; a timed-out call counts as a failure.
    pub fn new(
        api_url: &str,
        source_lang: &str,
        target_lang: &str,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to create HTTP client")?,
            api_url: api_url.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        })
    }

    /// Performs the translation request, propagating failures to the caller.
    async fn request(&self, text: &str) -> Result<String> {
        let request = TranslateRequest {
            q: text,
            source: &self.source_lang,
            target: &self.target_lang,
            format: "text",
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to translation API")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Translation API returned status: {}", status);
        }

        let result: TranslateResponse = response
            .json()
            .await
            .context("Failed to parse translation API response")?;

        debug!("Translated '{}' -> '{}'", text, result.translated_text);

        Ok(result.translated_text)
    }
}

#[async_trait]
impl Translate for HttpTranslator {
    async fn translate(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        match self.request(text).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Translation failed for fragment, leaving it empty: {:#}", e);
                String::new()
            }
        }
    }
}
