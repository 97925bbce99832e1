//! Configuration module for the vocabulary server.
//!
//! Handles loading configuration from environment variables and .env files.

use anyhow::{Context, Result};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the API server on.
    pub host: Ipv4Addr,

    /// Port to bind the API server on.
    pub port: u16,

    /// Path of the SQLite database file.
    pub database_path: PathBuf,

    /// Entries endpoint of the dictionary source (the headword is appended).
    pub dictionary_api_url: String,

    /// URL of the translation endpoint.
    pub translation_api_url: String,

    /// Source language code for translations.
    pub source_lang: String,

    /// Target language code for translations.
    pub target_lang: String,

    /// Maximum number of word records kept in the store.
    /// When exceeded at insert time, the oldest record is evicted.
    pub cache_capacity: usize,

    /// Timeout applied to every outbound HTTP request.
    pub http_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `HOST`: Bind address (default: 127.0.0.1)
    /// - `PORT`: Bind port (default: 8000)
    /// - `DATABASE_PATH`: SQLite file path (default: data/vocab.db)
    /// - `DICTIONARY_API_URL`: Dictionary entries endpoint
    ///   (default: https://api.dictionaryapi.dev/api/v2/entries/en)
    /// - `TRANSLATION_API_URL`: Translation endpoint
    ///   (default: http://localhost:5000/translate)
    /// - `SOURCE_LANG`: Source language code (default: en)
    /// - `TARGET_LANG`: Target language code (default: vi)
    /// - `CACHE_CAPACITY`: Maximum stored words (default: 1000)
    /// - `HTTP_TIMEOUT_SECS`: Outbound request timeout (default: 10)
    pub fn load() -> Result<Self> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host: Ipv4Addr = std::env::var("HOST")
            .unwrap_or_else(|_| "127.0.0.1".to_string())
            .parse()
            .context("HOST must be a valid IPv4 address")?;

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .context("PORT must be a valid port number")?;

        let database_path = PathBuf::from(
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "data/vocab.db".to_string()),
        );

        let dictionary_api_url = std::env::var("DICTIONARY_API_URL")
            .unwrap_or_else(|_| "https://api.dictionaryapi.dev/api/v2/entries/en".to_string());

        let translation_api_url = std::env::var("TRANSLATION_API_URL")
            .unwrap_or_else(|_| "http://localhost:5000/translate".to_string());

        let source_lang = std::env::var("SOURCE_LANG").unwrap_or_else(|_| "en".to_string());
        let target_lang = std::env::var("TARGET_LANG").unwrap_or_else(|_| "vi".to_string());

        let cache_capacity: usize = std::env::var("CACHE_CAPACITY")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .context("CACHE_CAPACITY must be a valid positive number")?;

        let http_timeout_secs: u64 = std::env::var("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a valid number of seconds")?;

        Ok(Config {
            host,
            port,
            database_path,
            dictionary_api_url,
            translation_api_url,
            source_lang,
            target_lang,
            cache_capacity,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}
