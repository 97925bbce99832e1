//! Vocabulary lookup-and-cache server.
//!
//! Serves English dictionary lookups enriched with Vietnamese
//! translations. Looked-up words are cached in a bounded SQLite store, so
//! repeat lookups cost neither a dictionary fetch nor translation calls.

mod config;
mod dictionary;
mod enrich;
mod error;
mod lookup;
mod normalize;
mod store;
mod translate;
mod web;
mod word;

use anyhow::{Context, Result};
use config::Config;
use dictionary::HttpDictionary;
use std::net::SocketAddr;
use std::sync::Arc;
use store::Store;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use translate::HttpTranslator;
use web::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging - use RUST_LOG env var, defaulting to info level
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vocab_server=info")),
        )
        .init();

    let config = Config::load()?;

    let store = Store::open(&config.database_path, config.cache_capacity)?;
    let dictionary = HttpDictionary::new(&config.dictionary_api_url, config.http_timeout)?;
    let translator = HttpTranslator::new(
        &config.translation_api_url,
        &config.source_lang,
        &config.target_lang,
        config.http_timeout,
    )?;

    let state = Arc::new(AppState {
        store,
        dictionary,
        translator,
    });
    let app = web::router(state);

    let addr = SocketAddr::from((config.host, config.port));
    info!("Vocabulary API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
