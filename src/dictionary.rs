//! Dictionary source client.
//!
//! Fetches the raw entry payload for a headword from a
//! dictionaryapi.dev-compatible service. Every failure class — transport
//! error, non-2xx status, undecodable body, empty result — collapses to a
//! miss; the caller turns a miss into its not-found outcome.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// An external dictionary collaborator.
#[async_trait]
pub trait DictionarySource: Send + Sync {
    /// Fetches the raw payload for a headword, or `None` when the source
    /// has no entry (or could not be reached).
    async fn fetch(&self, word: &str) -> Option<Value>;
}

/// HTTP client for a dictionaryapi.dev-compatible dictionary.
#[derive(Debug, Clone)]
pub struct HttpDictionary {
    /// HTTP client for API requests.
    client: reqwest::Client,

    /// Base URL of the entries endpoint (the headword is appended).
    base_url: String,
}

impl HttpDictionary {
    /// Creates a new dictionary client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Entries endpoint, e.g.
    ///   `https://api.dictionaryapi.dev/api/v2/entries/en`.
    /// * `timeout` - Per-request timeout; a timed-out fetch counts as a miss.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to create HTTP client")?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Performs the fetch, propagating failures to the caller.
    async fn request(&self, word: &str) -> Result<Option<Value>> {
        let url = format!("{}/{}", self.base_url, urlencoding::encode(word));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request to dictionary API")?;

        // The upstream answers 404 for unknown words; any other non-2xx
        // status is treated the same way.
        if !response.status().is_success() {
            debug!(
                "Dictionary API returned status {} for '{}'",
                response.status(),
                word
            );
            return Ok(None);
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse dictionary API response")?;

        // The payload is an array of entries; the first one is the record.
        Ok(body.get(0).cloned())
    }
}

#[async_trait]
impl DictionarySource for HttpDictionary {
    async fn fetch(&self, word: &str) -> Option<Value> {
        match self.request(word).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Dictionary fetch failed for '{}': {:#}", word, e);
                None
            }
        }
    }
}
